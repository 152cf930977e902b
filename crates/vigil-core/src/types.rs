//! Shared types used across Vigil crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a single probe against the monitored site.
///
/// Serialized with the short wire names `ms` and `err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// `true` iff the target answered with HTTP 200.
    pub ok: bool,
    /// Observed HTTP status, or 0 when no response was received.
    pub status: u16,
    /// Wall-clock duration of the probe in milliseconds.
    #[serde(rename = "ms")]
    pub elapsed_ms: u64,
    /// Stringified error, if one occurred.
    #[serde(rename = "err", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeReport {
    /// Build a report for a request that never produced a response.
    pub fn unreachable(elapsed_ms: u64, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: 0,
            elapsed_ms,
            error: Some(error.into()),
        }
    }

    /// Whether the probe failed at the connection level (no status at all).
    ///
    /// Only these failures are worth retrying; a slow or non-200 answer is
    /// a real observation of the target.
    pub fn is_unreachable(&self) -> bool {
        self.status == 0 && self.error.is_some()
    }
}

/// What happened to the alert for one health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertOutcome {
    /// The target was healthy.
    NotNeeded,
    /// An alert was delivered.
    Sent,
    /// An alert was already sent inside the cooldown window.
    Suppressed,
    /// Delivery was attempted and failed after retries.
    Failed,
    /// No notifier is configured.
    Disabled,
}

impl AlertOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            AlertOutcome::NotNeeded => "not_needed",
            AlertOutcome::Sent => "sent",
            AlertOutcome::Suppressed => "suppressed",
            AlertOutcome::Failed => "failed",
            AlertOutcome::Disabled => "disabled",
        }
    }
}

/// Response payload of the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(flatten)]
    pub probe: ProbeReport,
    /// Human-readable site name.
    pub site: String,
    /// The probed URL.
    pub url: String,
    /// When the check finished.
    pub timestamp: DateTime<Utc>,
    /// `ok` and not slower than the configured threshold.
    pub healthy: bool,
    pub alert: AlertOutcome,
}

/// Current wall-clock time as epoch milliseconds.
pub fn epoch_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
