//! Related Resources Module
//!
//! The one operation that crosses node boundaries: following a record's linkage field to the
//! node that serves the related collection.
//!
//! ## Failure Mapping
//! - No matching source records, or no linked identifiers: not found.
//! - Related collection missing from the service directory: server error (misconfiguration).
//! - Sibling unreachable or timed out: server error.
//! - Sibling answered: its status and body are relayed, errors included.
//!
//! Outbound calls share one HTTP client, carry a timeout, and are capped by a semaphore.

pub mod handlers;
pub mod resolver;
