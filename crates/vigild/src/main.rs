//! vigild — the Vigil health checker daemon.
//!
//! Single binary that assembles the checker:
//! - Key-value store for the last-alert timestamp (redb, memory or REST)
//! - Telegram notifier
//! - Health check (probe, classify, rate-limited alert)
//! - REST API + Prometheus metrics
//! - Optional built-in schedule
//!
//! # Usage
//!
//! ```text
//! VIGIL_TARGET_URL=https://example.com vigild serve --port 8080 --interval 300
//! VIGIL_TARGET_URL=https://example.com vigild check
//! vigild --config vigil.toml config
//! ```

mod serve;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vigil_core::VigilConfig;
use vigil_health::HealthCheck;
use vigil_notify::{Notifier, TelegramNotifier};

const DEFAULT_LOG_FILTER: &str = "info,vigild=debug,vigil=debug";

#[derive(Parser)]
#[command(name = "vigild", about = "Vigil health checker daemon", version)]
struct Cli {
    /// TOML config file; environment variables override it.
    #[arg(long, short, global = true, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the health endpoint, optionally checking on a schedule.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Seconds between scheduled checks; 0 leaves scheduling to an
        /// external caller of `/api/health`.
        #[arg(long, default_value = "0")]
        interval: u64,
    },

    /// Run one check, print the report, exit 1 if unhealthy.
    Check,

    /// Print the resolved configuration with secrets redacted.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = VigilConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Serve { port, interval } => {
            let check = build_check(&config)?;
            serve::run(check, port, interval).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check => {
            let check = build_check(&config)?;
            let report = check.run().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if report.healthy {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Config => {
            print!("{}", config.redacted().to_toml_string()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // stdout carries command output (`check`, `config`).
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Wire store, notifier and check from `config`.
fn build_check(config: &VigilConfig) -> anyhow::Result<Arc<HealthCheck>> {
    let store = vigil_state::open_store(&config.store)
        .with_context(|| format!("failed to open {:?} store", config.store.backend))?;
    info!(backend = ?config.store.backend, "alert store opened");

    let notifier: Option<Arc<dyn Notifier>> = match TelegramNotifier::from_config(&config.telegram)? {
        Some(telegram) => {
            info!("telegram alerts enabled");
            Some(Arc::new(telegram))
        }
        None => {
            warn!("telegram credentials not set, alerts disabled");
            None
        }
    };

    let check = HealthCheck::new(config, store, notifier)?;
    info!(site = %check.site(), url = %check.url(), "health check configured");
    Ok(Arc::new(check))
}
