//! Service Discovery Module
//!
//! Routes related-resource requests to sibling nodes.
//!
//! ## Core Mechanisms
//! - **Service Directory**: Static map from collection name to the base URL of the node that
//!   serves it, loaded from configuration.
//! - **Resolution Check**: Each configured host is resolved at startup. Hosts that fail are
//!   replaced in place by a statically known local fallback.
//! - **Outcome Tracking**: Every entry remembers whether it was resolved, is on fallback, or has
//!   not been checked yet.

pub mod directory;
pub mod resolver;
pub mod types;
