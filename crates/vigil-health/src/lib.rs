//! vigil-health — probing the site and deciding whether to raise an alert.
//!
//! # Architecture
//!
//! ```text
//! HealthCheck::run()
//!   ├── retry(Prober::probe)       retried only while the target is unreachable
//!   ├── classify                   healthy = 200 && elapsed <= slow threshold
//!   ├── AlertLimiter::should_alert  last-alert timestamp in the shared KvStore
//!   ├── retry(Notifier::send)      errors logged, never propagated
//!   └── HealthMetrics::record_check
//!
//! run_schedule()                   optional in-process replacement for cron
//! ```
//!
//! Every run is independent: nothing survives between checks except the
//! last-alert timestamp in the store and the metrics counters.

pub mod checker;
pub mod limiter;
pub mod monitor;

use thiserror::Error;

pub use checker::Prober;
pub use limiter::AlertLimiter;
pub use monitor::{HealthCheck, run_schedule};

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
