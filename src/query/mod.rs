//! Query Module
//!
//! Answers list and identifier lookups against the local store.
//!
//! ## Rules
//! - The store's error state is checked before any data access and reported as a server error.
//! - Internal fields are stripped from everything returned.
//! - Identifier arguments may be comma-separated. A comma anywhere switches the response from a
//!   single object to an array, even when only one identifier remains.

pub mod engine;
pub mod handlers;
pub mod types;
