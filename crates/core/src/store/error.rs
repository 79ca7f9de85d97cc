//! Store error types.

use thiserror::Error;

/// Errors returned by a [`LoanStore`](super::LoanStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A record with the same key already exists.
    #[error("Record already exists: {0}")]
    Conflict(String),

    /// The record to update does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Conflict(_) => 409,
            Self::NotFound(_) => 404,
            Self::Unavailable(_) => 503,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unavailable(_) => "STORAGE_ERROR",
        }
    }
}
