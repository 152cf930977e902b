//! vigil-retry — run a fallible async operation with bounded retries.
//!
//! The executor does not classify errors: every `Err` is retried until the
//! budget is spent. Callers decide what is retryable by choosing when to
//! return `Err`.
//!
//! # Backoff
//!
//! Linear: the delay before attempt `n + 1` is `base_delay * n`, so a
//! 500 ms base yields 500 ms, 1000 ms, 1500 ms, …
//!
//! # Errors
//!
//! Whatever the operation fails with (a typed error, a `String`, a `&str`)
//! is normalized into [`Failure`], which keeps the original error for
//! downcasting and exposes its message and cause.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Boxed error accepted from wrapped operations.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Normalized error returned once all attempts are exhausted.
///
/// Displays as the last attempt's error.
#[derive(Debug)]
pub struct Failure(BoxError);

impl Failure {
    pub fn new(err: impl Into<BoxError>) -> Self {
        let boxed: BoxError = err.into();
        match boxed.downcast::<Failure>() {
            Ok(inner) => *inner,
            Err(other) => Failure(other),
        }
    }

    pub fn message(&self) -> String {
        self.0.to_string()
    }

    /// The wrapped error's own source, if any.
    pub fn cause(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Policy expressed as a total attempt count (at least one).
    pub const fn attempts(total: u32, base_delay: Duration) -> Self {
        Self::new(total.saturating_sub(1), base_delay)
    }

    /// A single attempt, no retries.
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait after failed attempt `attempt` (1-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Run `op` until it succeeds or `policy` is exhausted.
///
/// `op` receives the 1-indexed attempt number. It may run several times,
/// so it must be safe to repeat. `label` only names the operation in logs.
pub async fn retry<T, E, F, Fut>(label: &str, policy: RetryPolicy, mut op: F) -> Result<T, Failure>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    let mut attempt = 1u32;
    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(label, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => {
                let failure = Failure::new(e);
                if attempt > policy.max_retries {
                    warn!(label, attempts = attempt, error = %failure, "all attempts failed");
                    return Err(failure);
                }
                let delay = policy.delay_for(attempt);
                debug!(
                    label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %failure,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
