//! Notification error types.

use thiserror::Error;

/// Errors raised by a [`Notifier`](super::Notifier).
///
/// These never leave the dispatcher; they are logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// Destination is not a usable phone number.
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// Channel provider refused the message.
    #[error("Channel rejected message with status {status}: {body}")]
    Rejected {
        /// HTTP status returned by the channel provider.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Channel provider could not be reached.
    #[error("Channel unreachable: {0}")]
    Transport(String),
}

impl NotificationError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidDestination(_) => 400,
            Self::Rejected { .. } | Self::Transport(_) => 502,
        }
    }

    /// Returns the error code for logs and API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDestination(_) => "INVALID_DESTINATION",
            Self::Rejected { .. } => "NOTIFICATION_REJECTED",
            Self::Transport(_) => "NOTIFICATION_FAILURE",
        }
    }
}
