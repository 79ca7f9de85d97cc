//! Payment gateway error types.

use thiserror::Error;

/// Errors raised while submitting a request to the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Provider answered with a non-success status.
    #[error("Provider rejected request with status {status}: {body}")]
    Rejected {
        /// HTTP status returned by the provider.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Access token could not be obtained.
    #[error("Provider authentication failed: {0}")]
    Auth(String),

    /// Request did not complete within the configured timeout.
    #[error("Provider request timed out after {0}s")]
    Timeout(u64),

    /// Connection-level failure.
    #[error("Provider unreachable: {0}")]
    Network(String),

    /// Request could not be built from the submitted values.
    #[error("Invalid provider request: {0}")]
    InvalidRequest(String),

    /// Provider answered 2xx with a body that could not be understood.
    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::Timeout(_) => 504,
            _ => 502,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "GATEWAY_REJECTED",
            Self::Auth(_) => "GATEWAY_AUTH_FAILED",
            Self::Timeout(_) => "GATEWAY_TIMEOUT",
            Self::Network(_) => "GATEWAY_UNREACHABLE",
            Self::InvalidRequest(_) => "GATEWAY_INVALID_REQUEST",
            Self::InvalidResponse(_) => "GATEWAY_INVALID_RESPONSE",
        }
    }
}

/// Errors raised while interpreting a provider callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    /// Payload does not match any known callback shape.
    #[error("Malformed callback: {0}")]
    Malformed(String),
}

impl CallbackError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        400
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        "MALFORMED_CALLBACK"
    }
}
