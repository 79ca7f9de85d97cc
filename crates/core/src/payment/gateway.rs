//! Gateway trait and request types.

use async_trait::async_trait;
use forwardsflow_shared::types::LoanId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::callback::{self, CallbackResult};
use super::error::{CallbackError, GatewayError};

/// Funds to send to a borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisbursementRequest {
    /// Loan being paid out.
    pub loan_id: LoanId,
    /// Borrower's mobile money number, as stored.
    pub phone_number: String,
    /// Principal to send.
    pub amount: Decimal,
}

/// Funds to pull from a borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRequest {
    /// Loan being repaid.
    pub loan_id: LoanId,
    /// Borrower's mobile money number, as stored.
    pub phone_number: String,
    /// Amount to request.
    pub amount: Decimal,
}

/// Provider acknowledgment of a submitted request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAck {
    /// Reference the eventual callback will carry.
    pub provider_reference: String,
    /// Provider's human-readable response.
    pub description: String,
}

/// Mobile-money provider capability.
///
/// A returned [`PaymentAck`] means the request was accepted for processing;
/// the outcome arrives later as a callback.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Sends money to a borrower.
    async fn disburse(&self, request: DisbursementRequest) -> Result<PaymentAck, GatewayError>;

    /// Requests money from a borrower.
    async fn collect(&self, request: CollectionRequest) -> Result<PaymentAck, GatewayError>;

    /// Normalizes a callback payload.
    fn parse_callback(&self, payload: &serde_json::Value) -> Result<CallbackResult, CallbackError> {
        callback::parse_callback(payload)
    }
}
