//! Prometheus text exposition format.
//!
//! Renders a metrics snapshot into the Prometheus text exposition format
//! for scraping by a Prometheus server or compatible agent.

use std::fmt::Write;

use crate::collector::MetricsSnapshot;

/// Render `snapshot` with a `site` label on every series.
pub fn render_prometheus(site: &str, snapshot: &MetricsSnapshot) -> String {
    let site = escape_label(site);
    let mut out = String::new();

    let counters: [(&str, &str, u64); 7] = [
        ("vigil_checks_total", "Health checks run.", snapshot.checks_total),
        ("vigil_healthy_total", "Checks classified healthy.", snapshot.healthy_total),
        ("vigil_unhealthy_total", "Checks classified unhealthy.", snapshot.unhealthy_total),
        (
            "vigil_probe_retries_total",
            "Probe retries after connection-level failures.",
            snapshot.probe_retries_total,
        ),
        ("vigil_alerts_sent_total", "Alerts delivered.", snapshot.alerts_sent_total),
        (
            "vigil_alerts_suppressed_total",
            "Alerts suppressed by the cooldown window.",
            snapshot.alerts_suppressed_total,
        ),
        (
            "vigil_alerts_failed_total",
            "Alerts that failed delivery after retries.",
            snapshot.alerts_failed_total,
        ),
    ];
    for (name, help, value) in counters {
        push_metric(&mut out, name, help, "counter", &site, value);
    }

    let gauges: [(&str, &str, u64); 4] = [
        (
            "vigil_last_probe_ms",
            "Duration of the last probe in milliseconds.",
            snapshot.last_elapsed_ms,
        ),
        (
            "vigil_last_status",
            "HTTP status of the last probe (0 if unreachable).",
            u64::from(snapshot.last_status),
        ),
        (
            "vigil_up",
            "1 if the last check was healthy.",
            u64::from(snapshot.last_healthy),
        ),
        (
            "vigil_last_check_timestamp_ms",
            "Epoch milliseconds of the last finished check.",
            snapshot.last_check_epoch_ms,
        ),
    ];
    for (name, help, value) in gauges {
        push_metric(&mut out, name, help, "gauge", &site, value);
    }

    out
}

fn push_metric(out: &mut String, name: &str, help: &str, kind: &str, site: &str, value: u64) {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
    let _ = writeln!(out, "{name}{{site=\"{site}\"}} {value}");
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
