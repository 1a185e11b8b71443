//! Record Storage Module
//!
//! Holds the node's single collection in memory.
//!
//! ## Core Concepts
//! - **Records**: JSON objects whose `_`-prefixed fields carry linkage and never leave the node.
//! - **Snapshots**: The store is an atomically swapped immutable snapshot. Population replaces it
//!   wholesale; queries read one snapshot from start to finish.
//! - **Error State**: A failed population leaves an error message in the snapshot, which every
//!   query reports instead of touching data.

pub mod record;
pub mod store;
