//! vigil-api — HTTP surface for the health checker.
//!
//! Provides axum route handlers that run checks on demand and expose the
//! checker's own metrics.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/health` | Run one check, always 200 with the report body |
//! | GET | `/api/ping` | Liveness of the checker process |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use vigil_health::HealthCheck;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub check: Arc<HealthCheck>,
}

/// Build the complete API router.
pub fn build_router(check: Arc<HealthCheck>) -> Router {
    let state = ApiState { check };

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/ping", get(handlers::ping))
        .route("/metrics", get(handlers::prometheus_metrics))
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}
