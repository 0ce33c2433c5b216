//! Error types for adapters and action creators.

use crate::record::RecordId;
use thiserror::Error;

/// Transport errors raised by a [`RequestAdapter`](crate::adapter::RequestAdapter).
///
/// `Clone` so the same error can reach both the injected error handler and
/// the caller of the action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The backend answered with a non-success status
    #[error("HTTP error (status {status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The request could not be sent (connection, timeout, ...)
    #[error("Request failed: {0}")]
    Request(String),

    /// The response could not be decoded
    #[error("Response decoding failed: {0}")]
    Decode(String),

    /// No record with this id exists
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// The local storage layer failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// A body middleware rejected the request before it was sent
    #[error("Middleware failed: {0}")]
    Middleware(String),
}

/// Errors returned by action creators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The adapter (or a middleware) failed; a FAIL event was dispatched
    #[error(transparent)]
    Transport(#[from] AdapterError),

    /// The user declined the confirmation question; nothing was dispatched
    #[error("Operation cancelled by the user")]
    Cancelled,
}

impl ActionError {
    /// The underlying transport error, if any
    #[must_use]
    pub const fn transport(&self) -> Option<&AdapterError> {
        match self {
            Self::Transport(error) => Some(error),
            Self::Cancelled => None,
        }
    }

    /// Whether the user cancelled the operation
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
