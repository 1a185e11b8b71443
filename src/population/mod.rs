//! Population Module
//!
//! Fills the record store from the upstream data source.
//!
//! ## Workflow
//! 1. **Fetch**: Requests the collection from the upstream source.
//! 2. **Pace**: Waits out the retry interval alongside the fetch, whichever takes longer.
//! 3. **Install**: Replaces the store contents on success and stops.
//! 4. **Retry**: On failure records the error in the store and tries again, up to the attempt
//!    ceiling, after which the store stays in its error state for good.

pub mod engine;
pub mod source;
pub mod types;

#[cfg(test)]
mod tests;
