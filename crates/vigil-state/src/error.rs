//! Error types for the Vigil key-value stores.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open store: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("request error: {0}")]
    Request(String),

    #[error("store responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("store returned an error: {0}")]
    Remote(String),

    #[error("invalid store response: {0}")]
    Decode(String),
}
