//! Collection Node Library
//!
//! One node of a read-only data service split by collection. Each node loads a single collection
//! (accounts, customers, transactions, ...) from an upstream test-data service, answers list and
//! identifier queries against it, and follows record linkages to the sibling node that owns the
//! related collection.
//!
//! ## Architecture Modules
//!
//! - **`storage`**: The record model and the in-memory store, swapped wholesale under an atomic
//!   snapshot so readers never see a partial update.
//! - **`population`**: The startup state machine that fetches the collection with fixed-interval
//!   (or exponential) retries and gives up after a bounded number of attempts.
//! - **`discovery`**: The directory of sibling services and the resolver that checks their names
//!   and switches unresolvable ones to a fallback address.
//! - **`query`**: List and identifier lookups, including the comma rule that decides between an
//!   object and an array response.
//! - **`relations`**: Fan-out from a record's linkage field to the sibling node, relaying its
//!   answer unchanged.
//! - **`health`**: The node's readiness report.
//! - **`node`**: Wiring, HTTP routes and the access-log middleware.
//! - **`config`** / **`error`**: Command-line configuration and the query-time error taxonomy.

pub mod config;
pub mod discovery;
pub mod error;
pub mod health;
pub mod node;
pub mod population;
pub mod query;
pub mod relations;
pub mod storage;
