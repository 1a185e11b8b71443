//! Health Module
//!
//! The single source of truth for whether a node is usable: populated, stamped, and error-free.

pub mod handlers;
pub mod reporter;
