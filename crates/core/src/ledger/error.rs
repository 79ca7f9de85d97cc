//! Loan ledger error types.

use forwardsflow_shared::types::{BorrowerId, LoanId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::types::LoanStatus;
use crate::payment::GatewayError;
use crate::store::StoreError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Loan does not exist.
    #[error("Loan {0} not found")]
    LoanNotFound(LoanId),

    /// Borrower does not exist.
    #[error("Borrower {0} not found")]
    BorrowerNotFound(BorrowerId),

    /// Operation not allowed from the loan's current status.
    #[error("Cannot {operation} a loan in status {from}")]
    InvalidState {
        /// Operation attempted.
        operation: &'static str,
        /// Status the loan was in.
        from: LoanStatus,
    },

    /// Amount is zero or negative.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Loan term is zero days.
    #[error("Loan duration must be at least one day")]
    InvalidDuration,

    /// Credit score outside the 300-850 scale.
    #[error("Credit score {0} is outside 300-850")]
    InvalidCreditScore(u16),

    /// Payment provider refused or could not be reached.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Record store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::LoanNotFound(_) | Self::BorrowerNotFound(_) => 404,
            Self::InvalidState { .. } => 422,
            Self::InvalidAmount(_) | Self::InvalidDuration | Self::InvalidCreditScore(_) => 400,
            Self::Gateway(e) => e.status_code(),
            Self::Store(e) => e.status_code(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::LoanNotFound(_) => "LOAN_NOT_FOUND",
            Self::BorrowerNotFound(_) => "BORROWER_NOT_FOUND",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidDuration => "INVALID_DURATION",
            Self::InvalidCreditScore(_) => "INVALID_CREDIT_SCORE",
            Self::Gateway(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }
}
