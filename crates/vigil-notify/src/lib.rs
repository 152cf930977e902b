//! vigil-notify — where degradation alerts go.
//!
//! A [`Notifier`] accepts one pre-formatted markdown message. Delivery is
//! fire-and-forget from the health check's point of view: the caller retries
//! and then logs any [`NotifyError`], it never surfaces it.
//!
//! [`format_alert`] turns a [`vigil_core::HealthReport`] into the message
//! text; [`TelegramNotifier`] posts it through the Telegram Bot API.

pub mod format;
pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

pub use format::{escape_markdown, format_alert};
pub use telegram::TelegramNotifier;

/// Errors raised while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to build notifier: {0}")]
    Build(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("notification API returned HTTP {status}: {description}")]
    Rejected { status: u16, description: String },
}

/// A delivery channel for alert messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short channel name used in logs.
    fn name(&self) -> &'static str;

    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}
