//! Alert message rendering (Telegram legacy Markdown).

use vigil_core::HealthReport;

/// Escape characters that legacy Markdown would interpret.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '[' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Render the degradation alert for `report`.
///
/// Includes site name, URL, status, elapsed time, the error when present
/// and the check timestamp.
pub fn format_alert(report: &HealthReport) -> String {
    let probe = &report.probe;
    let status = if probe.status == 0 {
        "unreachable".to_string()
    } else {
        probe.status.to_string()
    };

    let mut lines = vec![
        format!("*{} is degraded*", escape_markdown(&report.site)),
        String::new(),
        format!("URL: {}", escape_markdown(&report.url)),
        format!("Status: {status}"),
        format!("Response time: {}ms", probe.elapsed_ms),
    ];
    if let Some(err) = &probe.error {
        lines.push(format!("Error: {}", escape_markdown(err)));
    }
    lines.push(format!(
        "Time: {}",
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.join("\n")
}
