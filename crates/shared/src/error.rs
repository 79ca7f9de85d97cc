//! Application-wide error types.

use thiserror::Error;

/// Caller errors raised at the HTTP boundary before any lending operation
/// runs.
///
/// Lending failures keep their own module errors so responses carry the
/// specific code (`LOAN_NOT_FOUND`, `INVALID_AMOUNT`, ...).
#[derive(Debug, Error)]
pub enum AppError {
    /// Caller identity missing or unreadable.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Caller role not allowed to perform the operation.
    #[error("Access denied: {0}")]
    Forbidden(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unauthorized(AppError::Unauthorized(String::new()), 401, "UNAUTHORIZED")]
    #[case::forbidden(AppError::Forbidden(String::new()), 403, "FORBIDDEN")]
    fn test_error_mapping(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Forbidden("bank_admin required".into()).to_string(),
            "Access denied: bank_admin required"
        );
    }
}
