//! vigil-metrics — observability for the health checker itself.
//!
//! # Architecture
//!
//! ```text
//! HealthMetrics
//!   ├── record_check() ← called once per finished health check
//!   └── snapshot() → MetricsSnapshot
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod collector;
pub mod prometheus;

pub use collector::{HealthMetrics, MetricsSnapshot};
pub use prometheus::render_prometheus;
