//! Metrics collector — counters over finished health checks.
//!
//! Lock-free: every field is an atomic, so handlers and the scheduler can
//! record concurrently through a shared `Arc<HealthMetrics>`.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use tracing::trace;
use vigil_core::{AlertOutcome, HealthReport};

/// Cumulative counters since process start.
#[derive(Debug, Default)]
pub struct HealthMetrics {
    checks_total: AtomicU64,
    healthy_total: AtomicU64,
    unhealthy_total: AtomicU64,
    probe_retries_total: AtomicU64,
    alerts_sent_total: AtomicU64,
    alerts_suppressed_total: AtomicU64,
    alerts_failed_total: AtomicU64,
    last_elapsed_ms: AtomicU64,
    last_status: AtomicU32,
    last_healthy: AtomicBool,
    last_check_epoch_ms: AtomicU64,
}

/// Point-in-time copy of [`HealthMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub checks_total: u64,
    pub healthy_total: u64,
    pub unhealthy_total: u64,
    pub probe_retries_total: u64,
    pub alerts_sent_total: u64,
    pub alerts_suppressed_total: u64,
    pub alerts_failed_total: u64,
    pub last_elapsed_ms: u64,
    pub last_status: u32,
    pub last_healthy: bool,
    /// 0 until the first check finishes.
    pub last_check_epoch_ms: u64,
}

impl HealthMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished check. `probe_attempts` counts the initial probe.
    pub fn record_check(&self, report: &HealthReport, probe_attempts: u32) {
        self.checks_total.fetch_add(1, Ordering::Relaxed);
        if report.healthy {
            self.healthy_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.unhealthy_total.fetch_add(1, Ordering::Relaxed);
        }
        self.probe_retries_total.fetch_add(
            u64::from(probe_attempts.saturating_sub(1)),
            Ordering::Relaxed,
        );
        match report.alert {
            AlertOutcome::Sent => {
                self.alerts_sent_total.fetch_add(1, Ordering::Relaxed);
            }
            AlertOutcome::Suppressed => {
                self.alerts_suppressed_total.fetch_add(1, Ordering::Relaxed);
            }
            AlertOutcome::Failed => {
                self.alerts_failed_total.fetch_add(1, Ordering::Relaxed);
            }
            AlertOutcome::NotNeeded | AlertOutcome::Disabled => {}
        }

        self.last_elapsed_ms
            .store(report.probe.elapsed_ms, Ordering::Relaxed);
        self.last_status
            .store(u32::from(report.probe.status), Ordering::Relaxed);
        self.last_healthy.store(report.healthy, Ordering::Relaxed);
        self.last_check_epoch_ms.store(
            report.timestamp.timestamp_millis().max(0) as u64,
            Ordering::Relaxed,
        );
        trace!(healthy = report.healthy, alert = report.alert.label(), "check recorded");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            checks_total: self.checks_total.load(Ordering::Relaxed),
            healthy_total: self.healthy_total.load(Ordering::Relaxed),
            unhealthy_total: self.unhealthy_total.load(Ordering::Relaxed),
            probe_retries_total: self.probe_retries_total.load(Ordering::Relaxed),
            alerts_sent_total: self.alerts_sent_total.load(Ordering::Relaxed),
            alerts_suppressed_total: self.alerts_suppressed_total.load(Ordering::Relaxed),
            alerts_failed_total: self.alerts_failed_total.load(Ordering::Relaxed),
            last_elapsed_ms: self.last_elapsed_ms.load(Ordering::Relaxed),
            last_status: self.last_status.load(Ordering::Relaxed),
            last_healthy: self.last_healthy.load(Ordering::Relaxed),
            last_check_epoch_ms: self.last_check_epoch_ms.load(Ordering::Relaxed),
        }
    }
}
