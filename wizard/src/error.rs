//! Error types for remote actions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for remote actions.
pub type Result<T> = std::result::Result<T, RemoteError>;

/// Failure of a call to the session provider, object storage, or record store.
///
/// The `Display` text is the logged cause. What the user sees comes from
/// [`RemoteError::user_message`].
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteError {
    /// No signed-in user to stamp as organizer.
    #[error("No signed-in user")]
    Unauthenticated,

    /// Object storage rejected an upload or removal.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Record store rejected a query.
    #[error("Database error: {0}")]
    Database(String),

    /// Referenced row does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The call did not finish within the configured bound.
    #[error("Remote call `{operation}` timed out after {timeout_ms} ms")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Bound that was exceeded
        timeout_ms: u64,
    },

    /// Anything else (poisoned lock, broken invariant in a backend).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RemoteError {
    /// Message safe to show in a notification.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Please sign in to create an event.",
            Self::Storage(_) => "Could not upload image. Please try again.",
            Self::Database(_) | Self::NotFound(_) => "Could not save your changes. Please try again.",
            Self::Timeout { .. } => "The server took too long to respond. Please try again.",
            Self::Internal(_) => "Something went wrong. Please try again.",
        }
    }

    /// Short label for metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Storage(_) => "storage",
            Self::Database(_) => "database",
            Self::NotFound(_) => "not_found",
            Self::Timeout { .. } => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_hides_cause() {
        let error = RemoteError::Database("duplicate key value violates unique constraint".into());
        assert!(!error.user_message().contains("duplicate"));
        assert!(error.to_string().contains("duplicate"));
    }

    #[test]
    fn timeout_names_operation() {
        let error = RemoteError::Timeout {
            operation: "insert_event".into(),
            timeout_ms: 15_000,
        };
        assert_eq!(
            error.to_string(),
            "Remote call `insert_event` timed out after 15000 ms"
        );
        assert_eq!(error.kind(), "timeout");
    }
}
