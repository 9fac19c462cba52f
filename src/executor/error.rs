//! Remote fetch error types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Error payload returned by the remote store alongside an empty result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Errors that can occur while executing a query against the remote store.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The store returned an error response.
    #[error("remote error: {message} (code: {code})")]
    Remote {
        /// Error code from the store.
        code: String,
        /// Error message from the store.
        message: String,
    },

    /// No response arrived in time.
    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    /// The store could not be reached.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// The response body was not the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ExecutorError {
    /// Create a remote error from an error response.
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<ErrorInfo> for ExecutorError {
    fn from(info: ErrorInfo) -> Self {
        Self::remote(info.code, info.message)
    }
}

impl From<serde_json::Error> for ExecutorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err)
    }
}
