//! Server mode: API router plus the optional check schedule.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};
use vigil_health::{HealthCheck, run_schedule};

pub async fn run(check: Arc<HealthCheck>, port: u16, interval_secs: u64) -> anyhow::Result<()> {
    info!("vigil daemon starting");

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Scheduled checks ───────────────────────────────────────

    let schedule_handle = if interval_secs > 0 {
        let interval = Duration::from_secs(interval_secs);
        info!(interval_secs, "scheduled checks enabled");
        Some(tokio::spawn(run_schedule(check.clone(), interval, shutdown_rx)))
    } else {
        info!("scheduled checks disabled, waiting for external triggers");
        None
    };

    // ── API server ─────────────────────────────────────────────

    let router = vigil_api::build_router(check);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Some(handle) = schedule_handle {
        let _ = handle.await;
    }

    info!("vigil daemon stopped");
    Ok(())
}
