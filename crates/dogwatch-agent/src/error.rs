//! Agent error types.

use thiserror::Error;

pub type AgentResult<T> = Result<T, AgentError>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Inference source failed: {0}")]
    Source(String),

    #[error("Inference source timed out after {0:?}")]
    SourceTimeout(std::time::Duration),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Frame persistence failed {0} consecutive times")]
    FrameWritesExhausted(u32),

    #[error("Storage error: {0}")]
    Storage(#[from] dogwatch_storage::StorageError),

    #[error("Notification error: {0}")]
    Notify(#[from] dogwatch_notify::NotifyError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
