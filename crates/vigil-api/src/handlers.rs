//! REST API handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;
use tracing::debug;

use crate::ApiState;

/// GET /api/health
///
/// Always 200: the target's health is carried in the body.
pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    debug!(site = %state.check.site(), "health check requested");
    let report = state.check.run().await;
    (
        StatusCode::OK,
        [(CACHE_CONTROL, "no-store")],
        Json(report),
    )
}

/// GET /api/ping
pub async fn ping() -> &'static str {
    "ok"
}

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.check.metrics().snapshot();
    let body = vigil_metrics::render_prometheus(state.check.site(), &snapshot);
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
