//! Health check orchestration: probe, classify, alert, record.
//!
//! [`HealthCheck::run`] never fails. Store and notifier errors are retried,
//! logged, and reflected in [`HealthReport::alert`]; the report itself is
//! always produced.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use vigil_core::{AlertOutcome, HealthReport, ProbeReport, VigilConfig};
use vigil_metrics::HealthMetrics;
use vigil_notify::{Notifier, format_alert};
use vigil_retry::{RetryPolicy, retry};
use vigil_state::KvStore;

use crate::HealthError;
use crate::checker::Prober;
use crate::limiter::AlertLimiter;

/// Probe retries: 2 retries, 1000 ms base delay.
pub const PROBE_RETRY: RetryPolicy = RetryPolicy::new(2, Duration::from_secs(1));

/// Notification delivery: 2 attempts, 500 ms apart.
pub const NOTIFY_RETRY: RetryPolicy = RetryPolicy::attempts(2, Duration::from_millis(500));

/// Carries the last unreachable report through the retry executor.
#[derive(Debug)]
struct Unreachable(ProbeReport);

impl fmt::Display for Unreachable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.error.as_deref().unwrap_or("unreachable"))
    }
}

impl Error for Unreachable {}

/// One configured site check and everything it needs to raise an alert.
pub struct HealthCheck {
    site: String,
    url: String,
    timeout: Duration,
    slow_threshold_ms: u64,
    prober: Prober,
    limiter: AlertLimiter,
    notifier: Option<Arc<dyn Notifier>>,
    metrics: Arc<HealthMetrics>,
    probe_retry: RetryPolicy,
    notify_retry: RetryPolicy,
}

impl HealthCheck {
    /// `notifier == None` disables alerting; checks still run and record.
    pub fn new(
        config: &VigilConfig,
        store: Arc<dyn KvStore>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Result<Self, HealthError> {
        Ok(Self {
            site: config.site.name.clone(),
            url: config.site.url.clone(),
            timeout: config.probe_timeout(),
            slow_threshold_ms: config.probe.slow_threshold_ms,
            prober: Prober::new()?,
            limiter: AlertLimiter::new(store, config.alert_key(), config.cooldown()),
            notifier,
            metrics: Arc::new(HealthMetrics::new()),
            probe_retry: PROBE_RETRY,
            notify_retry: NOTIFY_RETRY,
        })
    }

    /// Share an existing metrics collector.
    pub fn with_metrics(mut self, metrics: Arc<HealthMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_probe_retry(mut self, policy: RetryPolicy) -> Self {
        self.probe_retry = policy;
        self
    }

    pub fn with_notify_retry(mut self, policy: RetryPolicy) -> Self {
        self.notify_retry = policy;
        self
    }

    pub fn with_store_retry(mut self, policy: RetryPolicy) -> Self {
        self.limiter = self.limiter.with_retry_policy(policy);
        self
    }

    pub fn metrics(&self) -> &Arc<HealthMetrics> {
        &self.metrics
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Run one check end to end.
    pub async fn run(&self) -> HealthReport {
        let (probe, attempts) = self.probe_with_retry().await;
        let healthy = probe.ok && probe.elapsed_ms <= self.slow_threshold_ms;

        let mut report = HealthReport {
            probe,
            site: self.site.clone(),
            url: self.url.clone(),
            timestamp: Utc::now(),
            healthy,
            alert: AlertOutcome::NotNeeded,
        };
        if !healthy {
            report.alert = self.alert(&report).await;
        }

        self.metrics.record_check(&report, attempts);
        if report.healthy {
            info!(
                site = %self.site,
                status = report.probe.status,
                ms = report.probe.elapsed_ms,
                "site healthy"
            );
        } else {
            warn!(
                site = %self.site,
                status = report.probe.status,
                ms = report.probe.elapsed_ms,
                error = report.probe.error.as_deref().unwrap_or(""),
                attempts,
                alert = report.alert.label(),
                "site degraded"
            );
        }
        report
    }

    /// Probe, retrying only connection-level failures. Returns the final
    /// report and how many probes were made.
    async fn probe_with_retry(&self) -> (ProbeReport, u32) {
        let prober = &self.prober;
        let url = self.url.as_str();
        let timeout = self.timeout;
        let mut attempts = 0u32;

        let outcome = retry("health probe", self.probe_retry, |attempt| {
            attempts = attempt;
            async move {
                let report = prober.probe(url, timeout).await;
                if report.is_unreachable() {
                    Err(Unreachable(report))
                } else {
                    Ok(report)
                }
            }
        })
        .await;

        let report = match outcome {
            Ok(report) => report,
            Err(failure) => match failure.downcast_ref::<Unreachable>() {
                Some(Unreachable(report)) => report.clone(),
                None => ProbeReport::unreachable(0, failure.message()),
            },
        };
        (report, attempts)
    }

    async fn alert(&self, report: &HealthReport) -> AlertOutcome {
        let Some(notifier) = self.notifier.as_deref() else {
            debug!(site = %self.site, "no notifier configured, skipping alert");
            return AlertOutcome::Disabled;
        };
        if !self.limiter.should_alert().await {
            return AlertOutcome::Suppressed;
        }

        let text = format_alert(report);
        match retry("send alert", self.notify_retry, |_| notifier.send(&text)).await {
            Ok(()) => {
                info!(site = %self.site, channel = notifier.name(), "alert sent");
                AlertOutcome::Sent
            }
            Err(e) => {
                error!(site = %self.site, channel = notifier.name(), error = %e, "failed to send alert");
                AlertOutcome::Failed
            }
        }
    }
}

/// Run `check` every `interval` until `shutdown` flips or its sender drops.
///
/// The first check runs immediately. A check in flight finishes before
/// shutdown is observed. A zero `interval` disables the schedule and
/// returns at once.
pub async fn run_schedule(
    check: Arc<HealthCheck>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    if interval.is_zero() {
        warn!(site = %check.site(), "zero schedule interval, scheduled checks disabled");
        return;
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(site = %check.site(), interval_ms = interval.as_millis() as u64, "health schedule starting");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                check.run().await;
            }
            _ = shutdown.changed() => {
                debug!(site = %check.site(), "health schedule shutting down");
                break;
            }
        }
    }
}
