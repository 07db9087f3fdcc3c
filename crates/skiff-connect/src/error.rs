//! Error types for skiff-connect
//!
//! Every fatal condition a task can hit maps to one of the variants below.
//! Nothing is retried internally and nothing is downgraded: a failing
//! operation aborts the owning task and the error propagates to the host
//! coordinator, which decides job-level success across tasks.

use thiserror::Error;

/// Result type alias for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors raised by the file-output sink
#[derive(Debug, Error)]
pub enum SinkError {
    /// Invalid or missing configuration. Raised before any task starts;
    /// the job never runs with a config that produces this.
    #[error("configuration error: {0}")]
    Config(String),

    /// An operation was invoked in the wrong session state. Indicates a
    /// bug in the host's lifecycle protocol, not a runtime condition.
    #[error("invalid session state: {0}")]
    State(String),

    /// Local staging-file creation, write, read or delete failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote put or access-control failure. The object key is carried so
    /// the failing partition is identifiable from the message alone.
    #[error("upload failed for object '{key}': {message}")]
    Upload { key: String, message: String },
}

impl SinkError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a session-state error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Create an upload error for a specific object key
    pub fn upload(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Check if this error was raised during configuration validation
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this error indicates a host-protocol bug
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State(_))
    }
}
