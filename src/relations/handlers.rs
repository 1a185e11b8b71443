use super::resolver::{RelationResolver, RelayedResponse};

use axum::{
    extract::{Extension, Path},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub async fn handle_get_related(
    Extension(resolver): Extension<Arc<RelationResolver>>,
    Path((ids, related)): Path<(String, String)>,
) -> Response {
    match resolver.get_related(&ids, &related).await {
        Ok(relayed) => relay(relayed),
        Err(e) => {
            tracing::debug!(
                "GET /{}/{}/{} failed: {}",
                resolver.collection_name(),
                ids,
                related,
                e
            );
            e.into_response()
        }
    }
}

fn relay(relayed: RelayedResponse) -> Response {
    let status =
        StatusCode::from_u16(relayed.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, relayed.body).into_response();

    match relayed
        .content_type
        .and_then(|value| HeaderValue::from_str(&value).ok())
    {
        Some(content_type) => {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }
        None => {
            response.headers_mut().remove(header::CONTENT_TYPE);
        }
    }
    response
}
