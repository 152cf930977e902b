//! Health check probe logic.
//!
//! One GET against the target with a hard deadline covering headers and
//! body. When the deadline passes the request future is dropped, which
//! aborts the connection.

use std::error::Error;
use std::time::{Duration, Instant};

use reqwest::Client;
use reqwest::header::CACHE_CONTROL;
use tracing::debug;
use vigil_core::ProbeReport;

use crate::HealthError;

const USER_AGENT: &str = concat!("vigil-health/", env!("CARGO_PKG_VERSION"));

/// Issues probe requests. Cheap to clone; reuses one connection pool.
#[derive(Debug, Clone)]
pub struct Prober {
    client: Client,
}

impl Prober {
    pub fn new() -> Result<Self, HealthError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// Probe `url`, giving up after `timeout`.
    ///
    /// Never fails: transport errors and timeouts become a report with
    /// `status == 0` and `error` set.
    pub async fn probe(&self, url: &str, timeout: Duration) -> ProbeReport {
        let start = Instant::now();

        let exchange = async {
            let response = self
                .client
                .get(url)
                .header(CACHE_CONTROL, "no-cache")
                .send()
                .await?;
            let status = response.status();
            let body = response.bytes().await.err();
            Ok::<_, reqwest::Error>((status, body))
        };
        let outcome = tokio::time::timeout(timeout, exchange).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Err(_) => {
                debug!(%url, elapsed_ms, "health probe timed out");
                ProbeReport::unreachable(
                    elapsed_ms,
                    format!("request aborted after {}ms", timeout.as_millis()),
                )
            }
            Ok(Err(e)) => {
                let error = describe(&e);
                debug!(%url, elapsed_ms, %error, "health probe request failed");
                ProbeReport::unreachable(elapsed_ms, error)
            }
            Ok(Ok((status, None))) => {
                debug!(%url, elapsed_ms, status = status.as_u16(), "health probe answered");
                ProbeReport {
                    ok: status == reqwest::StatusCode::OK,
                    status: status.as_u16(),
                    elapsed_ms,
                    error: None,
                }
            }
            Ok(Ok((status, Some(e)))) => {
                let error = format!("failed to read body: {}", describe(&e));
                debug!(%url, elapsed_ms, status = status.as_u16(), %error, "health probe body failed");
                ProbeReport {
                    ok: false,
                    status: status.as_u16(),
                    elapsed_ms,
                    error: Some(error),
                }
            }
        }
    }
}

/// Error message followed by its source chain, `: `-separated.
fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
