use super::reporter::HealthReporter;

use axum::{extract::Extension, http::StatusCode};
use std::sync::Arc;

/// Plain-text health. 200 when healthy, 503 without data, 500 when data exists but the last
/// population attempt left an error.
pub async fn handle_healthz(
    Extension(reporter): Extension<Arc<HealthReporter>>,
) -> (StatusCode, String) {
    let report = reporter.health();
    let status = if report.healthy {
        StatusCode::OK
    } else if !report.has_data {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, report.to_string())
}
