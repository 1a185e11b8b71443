//! Query-time Error Taxonomy
//!
//! Failures that surface synchronously to an HTTP caller. Population failures never appear here
//! directly; they only become visible through the store's error state, which the query path
//! reports as [`NodeError::StoreUnavailable`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    /// The store holds an error message (population failing or given up), or has no data yet.
    #[error("{0}")]
    StoreUnavailable(String),

    /// A valid query matched nothing.
    #[error("not found")]
    NotFound,

    /// The related collection has no entry in the service directory.
    #[error("no service configured for related collection '{0}'")]
    DownstreamResolution(String),

    /// The sibling node could not be reached or its response could not be read.
    #[error("related service call failed: {0}")]
    DownstreamCall(String),
}

impl NodeError {
    pub fn status(&self) -> StatusCode {
        match self {
            NodeError::NotFound => StatusCode::NOT_FOUND,
            NodeError::StoreUnavailable(_)
            | NodeError::DownstreamResolution(_)
            | NodeError::DownstreamCall(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            NodeError::NotFound => status.into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}
