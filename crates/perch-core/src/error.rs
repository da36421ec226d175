//! Error types shared by every Perch collaborator.
//!
//! Collaborators (chat drivers, identity resolvers) report failures through
//! [`ApiError`]. The runtime records them for observability and keeps going.

use thiserror::Error;

/// Errors reported by the chat platform collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The session is not connected to the platform.
    #[error("not connected to the chat platform")]
    NotConnected,

    /// The platform rejected the call.
    #[error("platform error ({code}): {message}")]
    Platform {
        /// Platform specific error code.
        code: i32,
        /// Human readable reason.
        message: String,
    },

    /// The requested user does not exist.
    #[error("user '{0}' not found")]
    UserNotFound(String),

    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Creates a platform error.
    pub fn platform(code: i32, message: impl Into<String>) -> Self {
        Self::Platform {
            code,
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// Result type for collaborator calls.
pub type ApiResult<T> = Result<T, ApiError>;
