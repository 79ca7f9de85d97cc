//! Reconciliation error types.

use forwardsflow_shared::types::LoanId;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::payment::CallbackError;

/// Errors raised while reconciling a callback.
///
/// None of these reach the provider; the callback is acknowledged regardless.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Payload could not be parsed.
    #[error(transparent)]
    Malformed(#[from] CallbackError),

    /// Account reference names a different loan than the intent.
    #[error("Callback {provider_reference} names loan {callback_loan} but was issued for {intent_loan}")]
    AccountMismatch {
        /// Provider reference of the callback.
        provider_reference: String,
        /// Loan named by the account reference.
        callback_loan: LoanId,
        /// Loan the intent was created for.
        intent_loan: LoanId,
    },

    /// Ledger refused or failed the settlement.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ReconcileError {
    /// Returns the error code for logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(e) => e.error_code(),
            Self::AccountMismatch { .. } => "ACCOUNT_MISMATCH",
            Self::Ledger(e) => e.error_code(),
        }
    }
}
