//! Node Assembly Module
//!
//! Wires one collection node together: store, population engine, service directory and discovery
//! resolver, query and relation engines, health reporter, and the HTTP router in front of them.
//!
//! ## Routes
//! - `GET /{collection}`: every record.
//! - `GET /{collection}/{ids}`: one or more records by primary key.
//! - `GET /{collection}/{ids}/{related}`: related records fetched from the sibling node.
//! - `GET /healthz`: plain-text health.

pub mod middleware;
pub mod service;
