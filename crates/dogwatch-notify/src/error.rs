//! Notification error types.

use thiserror::Error;

/// Result type for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to configure notification transport: {0}")]
    ConfigError(String),

    #[error("Delivery rejected with status {0}")]
    Rejected(u16),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl NotifyError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
