use super::engine::QueryEngine;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub async fn handle_get_all(Extension(engine): Extension<Arc<QueryEngine>>) -> Response {
    match engine.get_all() {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => {
            tracing::debug!("GET /{} failed: {}", engine.collection().name, e);
            e.into_response()
        }
    }
}

pub async fn handle_get_by_ids(
    Extension(engine): Extension<Arc<QueryEngine>>,
    Path(ids): Path<String>,
) -> Response {
    match engine.get_by_ids(&ids) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            tracing::debug!("GET /{}/{} failed: {}", engine.collection().name, ids, e);
            e.into_response()
        }
    }
}
