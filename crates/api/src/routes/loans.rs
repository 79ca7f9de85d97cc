//! Loan application, decision and payment routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use forwardsflow_core::ledger::{
    AutoDecision, Loan, LoanEvaluation, NewLoanApplication, Payment, PaymentInitiation,
    Transaction,
};
use forwardsflow_shared::types::LoanId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ApiError, AppState, middleware::Caller};

/// Creates the loan routes (requires caller middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/loans", post(submit_application))
        .route("/loans/{loan_id}", get(get_loan))
        .route("/loans/{loan_id}/transactions", get(list_transactions))
        .route("/loans/{loan_id}/payments", get(list_payments))
        .route("/loans/{loan_id}/evaluation", get(evaluate_loan))
        .route("/loans/{loan_id}/decision", post(record_decision))
        .route("/loans/{loan_id}/auto-decision", post(auto_decide))
        .route("/loans/{loan_id}/disbursement", post(begin_disbursement))
        .route("/loans/{loan_id}/repayments", post(begin_repayment))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a manual decision.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    /// Approve or reject.
    pub approved: bool,
    /// Reviewer notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for a repayment collection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepaymentRequest {
    /// Amount to collect. Defaults to the outstanding balance.
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Outcome of an auto-decision.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoDecisionKind {
    /// Approval recorded.
    Approved,
    /// Left pending for a reviewer.
    ManualReview,
}

/// Response for an auto-decision.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoDecisionResponse {
    /// What happened.
    pub decision: AutoDecisionKind,
    /// Loan after the call.
    pub loan: Loan,
    /// Evaluation the decision was based on.
    pub evaluation: LoanEvaluation,
}

impl From<AutoDecision> for AutoDecisionResponse {
    fn from(decision: AutoDecision) -> Self {
        match decision {
            AutoDecision::Approved { loan, evaluation } => Self {
                decision: AutoDecisionKind::Approved,
                loan,
                evaluation,
            },
            AutoDecision::ManualReview { loan, evaluation } => Self {
                decision: AutoDecisionKind::ManualReview,
                loan,
                evaluation,
            },
        }
    }
}

/// Response for a submitted disbursement or collection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitiationResponse {
    /// Loan in its processing state.
    pub loan: Loan,
    /// Transaction awaiting the provider callback.
    pub transaction: Transaction,
    /// Provider reference the callback will carry.
    pub provider_reference: String,
    /// Provider's message.
    pub description: String,
}

impl From<PaymentInitiation> for PaymentInitiationResponse {
    fn from(initiation: PaymentInitiation) -> Self {
        Self {
            loan: initiation.loan,
            transaction: initiation.transaction,
            provider_reference: initiation.provider_reference,
            description: initiation.description,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /loans
async fn submit_application(
    State(state): State<AppState>,
    _caller: Caller,
    Json(input): Json<NewLoanApplication>,
) -> Result<(StatusCode, Json<Loan>), ApiError> {
    let loan = state.ledger.submit_application(input).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// GET /loans/{loan_id}
async fn get_loan(
    State(state): State<AppState>,
    _caller: Caller,
    Path(loan_id): Path<String>,
) -> Result<Json<Loan>, ApiError> {
    Ok(Json(state.ledger.loan(&LoanId::from(loan_id)).await?))
}

/// GET /loans/{loan_id}/transactions
async fn list_transactions(
    State(state): State<AppState>,
    _caller: Caller,
    Path(loan_id): Path<String>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let loan_id = LoanId::from(loan_id);
    Ok(Json(state.ledger.transactions_for_loan(&loan_id).await?))
}

/// GET /loans/{loan_id}/payments
async fn list_payments(
    State(state): State<AppState>,
    _caller: Caller,
    Path(loan_id): Path<String>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let loan_id = LoanId::from(loan_id);
    Ok(Json(state.ledger.payments_for_loan(&loan_id).await?))
}

/// GET /loans/{loan_id}/evaluation
async fn evaluate_loan(
    State(state): State<AppState>,
    caller: Caller,
    Path(loan_id): Path<String>,
) -> Result<Json<LoanEvaluation>, ApiError> {
    caller.require_operator()?;
    Ok(Json(state.ledger.evaluate(&LoanId::from(loan_id)).await?))
}

/// POST /loans/{loan_id}/decision
async fn record_decision(
    State(state): State<AppState>,
    caller: Caller,
    Path(loan_id): Path<String>,
    Json(body): Json<DecisionRequest>,
) -> Result<Json<Loan>, ApiError> {
    caller.require_operator()?;
    let loan = state
        .ledger
        .record_decision(&LoanId::from(loan_id), body.approved, body.notes)
        .await?;
    info!(loan_id = %loan.id, caller = %caller.id, status = %loan.status, "Decision recorded");
    Ok(Json(loan))
}

/// POST /loans/{loan_id}/auto-decision
async fn auto_decide(
    State(state): State<AppState>,
    caller: Caller,
    Path(loan_id): Path<String>,
) -> Result<Json<AutoDecisionResponse>, ApiError> {
    caller.require_operator()?;
    let decision = state.ledger.auto_decide(&LoanId::from(loan_id)).await?;
    Ok(Json(decision.into()))
}

/// POST /loans/{loan_id}/disbursement
async fn begin_disbursement(
    State(state): State<AppState>,
    caller: Caller,
    Path(loan_id): Path<String>,
) -> Result<(StatusCode, Json<PaymentInitiationResponse>), ApiError> {
    caller.require_operator()?;
    let initiation = state
        .ledger
        .begin_disbursement(&LoanId::from(loan_id))
        .await?;
    Ok((StatusCode::ACCEPTED, Json(initiation.into())))
}

/// POST /loans/{loan_id}/repayments
async fn begin_repayment(
    State(state): State<AppState>,
    caller: Caller,
    Path(loan_id): Path<String>,
    body: Option<Json<RepaymentRequest>>,
) -> Result<(StatusCode, Json<PaymentInitiationResponse>), ApiError> {
    caller.require_operator()?;
    let loan_id = LoanId::from(loan_id);
    let Json(body) = body.unwrap_or_default();
    let amount = match body.amount {
        Some(amount) => amount,
        None => state.ledger.loan(&loan_id).await?.outstanding,
    };

    let initiation = state
        .ledger
        .begin_repayment_collection(&loan_id, amount)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(initiation.into())))
}
