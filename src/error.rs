//! RoverTalk Error Types
//!
//! Centralized error handling for pipeline stage boundaries.

use thiserror::Error;

/// Central error type for RoverTalk
#[derive(Error, Debug)]
pub enum RoverError {
    /// Network/API failure on a speech or chat backend. Retried with
    /// backoff before it reaches the pipeline.
    #[error("transient backend error: {0}")]
    Transient(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("handler error: {0}")]
    Handler(String),

    /// Serial link unavailable. Treated as simulation mode, never fatal.
    #[error("device link error: {0}")]
    Device(String),

    #[error("audio error: {0}")]
    Audio(String),

    #[error("lock poisoned: {0}")]
    Lock(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for RoverTalk operations
pub type RoverResult<T> = Result<T, RoverError>;

/// Helper to convert Mutex poison errors
impl<T> From<std::sync::PoisonError<T>> for RoverError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        RoverError::Lock(err.to_string())
    }
}
