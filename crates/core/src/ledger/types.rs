//! Loan ledger domain types.
//!
//! Borrowers, loans, the append-only transaction log, and the payment
//! intents that tie an in-flight provider call back to its loan.

use chrono::{DateTime, Utc};
use forwardsflow_shared::types::{
    BorrowerId, LoanId, PaymentId, TransactionId, round_to_shillings,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scoring::BorrowerSnapshot;

/// Loan lifecycle status.
///
/// The valid transitions are:
/// - Pending → Approved | Rejected (decision)
/// - Approved | DisbursementFailed → DisbursementProcessing (disburse)
/// - DisbursementProcessing → Disbursed | DisbursementFailed (settle)
/// - Disbursed | Repaid | RepaymentFailed → RepaymentProcessing (collect)
/// - RepaymentProcessing → Repaid | Closed | RepaymentFailed (settle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// Awaiting a decision.
    Pending,
    /// Approved, not yet disbursed.
    Approved,
    /// Declined. Terminal.
    Rejected,
    /// Disbursement submitted to the provider.
    DisbursementProcessing,
    /// Funds delivered to the borrower.
    Disbursed,
    /// Disbursement failed. Terminal unless an operator retries.
    DisbursementFailed,
    /// Repayment collection submitted to the provider.
    RepaymentProcessing,
    /// A repayment landed and a balance remains.
    Repaid,
    /// A repayment collection failed.
    RepaymentFailed,
    /// Fully repaid. Terminal.
    Closed,
}

impl LoanStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 10] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::DisbursementProcessing,
        Self::Disbursed,
        Self::DisbursementFailed,
        Self::RepaymentProcessing,
        Self::Repaid,
        Self::RepaymentFailed,
        Self::Closed,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::DisbursementProcessing => "DISBURSEMENT_PROCESSING",
            Self::Disbursed => "DISBURSED",
            Self::DisbursementFailed => "DISBURSEMENT_FAILED",
            Self::RepaymentProcessing => "REPAYMENT_PROCESSING",
            Self::Repaid => "REPAID",
            Self::RepaymentFailed => "REPAYMENT_FAILED",
            Self::Closed => "CLOSED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        Self::ALL.into_iter().find(|status| status.as_str() == upper)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Closed)
    }

    /// Returns true while a provider call is awaiting its callback.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        matches!(
            self,
            Self::DisbursementProcessing | Self::RepaymentProcessing
        )
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A borrower record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrower {
    /// Borrower key.
    pub id: BorrowerId,
    /// Display name.
    pub name: String,
    /// Mobile money number as supplied.
    pub phone_number: String,
    /// Bureau credit score (300-850).
    pub credit_score: Option<u16>,
    /// Principal across closed loans.
    pub total_borrowed: Decimal,
    /// Repayments across closed loans.
    pub total_repaid: Decimal,
    /// Loans that ended in default.
    pub defaulted_loans: u32,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl Borrower {
    /// Creates a borrower with an empty history.
    #[must_use]
    pub fn new(input: NewBorrower) -> Self {
        Self {
            id: input.id.unwrap_or_else(BorrowerId::generate),
            name: input.name,
            phone_number: input.phone_number,
            credit_score: input.credit_score,
            total_borrowed: Decimal::ZERO,
            total_repaid: Decimal::ZERO,
            defaulted_loans: input.defaulted_loans,
            created_at: Utc::now(),
        }
    }

    /// Credit history fields read by the risk scorer.
    #[must_use]
    pub fn snapshot(&self) -> BorrowerSnapshot {
        BorrowerSnapshot {
            credit_score: self.credit_score,
            total_borrowed: self.total_borrowed,
            total_repaid: self.total_repaid,
            defaulted_loans: self.defaulted_loans,
        }
    }
}

/// Input for registering a borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBorrower {
    /// Key assigned by the upstream record store. Generated when absent.
    #[serde(default)]
    pub id: Option<BorrowerId>,
    /// Display name.
    pub name: String,
    /// Mobile money number.
    pub phone_number: String,
    /// Bureau credit score.
    #[serde(default)]
    pub credit_score: Option<u16>,
    /// Defaults carried over from an earlier system.
    #[serde(default)]
    pub defaulted_loans: u32,
}

/// A loan record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    /// Loan key.
    pub id: LoanId,
    /// Owning borrower.
    pub borrower_id: BorrowerId,
    /// Principal in KES.
    pub amount: Decimal,
    /// Term in days.
    pub duration_days: u32,
    /// Annual interest rate in percent.
    pub interest_rate: Decimal,
    /// Lifecycle status.
    pub status: LoanStatus,
    /// Score computed at decision time.
    pub risk_score: Option<i32>,
    /// Balance still owed. Zero until disbursement settles.
    pub outstanding: Decimal,
    /// Sum of settled repayments.
    pub amount_repaid: Decimal,
    /// Time of the approve or reject decision.
    pub approval_date: Option<DateTime<Utc>>,
    /// Decision notes.
    pub notes: Option<String>,
    /// Bumped on every committed update.
    pub version: u64,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Time of the last committed update.
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Creates a pending loan from an application.
    #[must_use]
    pub fn new(input: NewLoanApplication) -> Self {
        let now = Utc::now();
        Self {
            id: input.id.unwrap_or_else(LoanId::generate),
            borrower_id: input.borrower_id,
            amount: input.amount,
            duration_days: input.duration_days,
            interest_rate: input.interest_rate,
            status: LoanStatus::Pending,
            risk_score: None,
            outstanding: Decimal::ZERO,
            amount_repaid: Decimal::ZERO,
            approval_date: None,
            notes: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Simple interest over the term: `amount × APR / 100 / 365 × days`.
    #[must_use]
    pub fn interest(&self) -> Decimal {
        self.amount * self.interest_rate / Decimal::ONE_HUNDRED / Decimal::from(365)
            * Decimal::from(self.duration_days)
    }

    /// Principal plus interest, rounded to whole shillings.
    #[must_use]
    pub fn total_repayable(&self) -> Decimal {
        round_to_shillings(self.amount + self.interest())
    }
}

/// Input for submitting a loan application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLoanApplication {
    /// Key assigned by the upstream record store. Generated when absent.
    #[serde(default)]
    pub id: Option<LoanId>,
    /// Applicant.
    pub borrower_id: BorrowerId,
    /// Requested principal.
    pub amount: Decimal,
    /// Requested term in days.
    pub duration_days: u32,
    /// Annual interest rate in percent.
    #[serde(default)]
    pub interest_rate: Decimal,
}

/// Transaction log entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Approve or reject decision.
    LoanApproval,
    /// Funds sent to the borrower.
    LoanDisbursement,
    /// Funds collected from the borrower.
    LoanRepayment,
}

impl TransactionType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoanApproval => "LOAN_APPROVAL",
            Self::LoanDisbursement => "LOAN_DISBURSEMENT",
            Self::LoanRepayment => "LOAN_REPAYMENT",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction log entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Decision approved the loan.
    Approved,
    /// Decision rejected the loan.
    Rejected,
    /// Provider call awaiting its callback.
    Processing,
    /// Provider confirmed the movement.
    Completed,
    /// Provider reported failure.
    Failed,
}

impl TransactionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable transaction log entry.
///
/// Only `status`, `receipt_number` and `updated_at` ever change, and only
/// from `Processing` to `Completed` or `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Entry ID.
    pub id: TransactionId,
    /// Entry type.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Loan the entry belongs to.
    pub loan_id: LoanId,
    /// Borrower the entry belongs to.
    pub borrower_id: BorrowerId,
    /// Amount moved or decided on.
    pub amount: Decimal,
    /// Entry status.
    pub status: TransactionStatus,
    /// Provider reference for payment entries.
    pub provider_reference: Option<String>,
    /// Provider receipt once settled.
    pub receipt_number: Option<String>,
    /// Free-form details.
    pub metadata: serde_json::Value,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a new log entry for a loan.
    #[must_use]
    pub fn new(
        transaction_type: TransactionType,
        loan: &Loan,
        amount: Decimal,
        status: TransactionStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            transaction_type,
            loan_id: loan.id.clone(),
            borrower_id: loan.borrower_id.clone(),
            amount,
            status,
            provider_reference: None,
            receipt_number: None,
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attaches a provider reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.provider_reference = Some(reference.into());
        self
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Direction of a provider money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    /// Lender to borrower (B2C).
    Disbursement,
    /// Borrower to lender (STK push).
    Collection,
}

impl PaymentKind {
    /// Transaction type logged for this kind of movement.
    #[must_use]
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Disbursement => TransactionType::LoanDisbursement,
            Self::Collection => TransactionType::LoanRepayment,
        }
    }

    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disbursement => "disbursement",
            Self::Collection => "collection",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An acknowledged provider call awaiting its callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    /// Provider reference the callback will carry.
    pub provider_reference: String,
    /// The `Processing` transaction this intent resolves.
    pub transaction_id: TransactionId,
    /// Loan being paid out or collected.
    pub loan_id: LoanId,
    /// Direction.
    pub kind: PaymentKind,
    /// Amount submitted.
    pub amount: Decimal,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

/// A confirmed repayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Payment ID.
    pub id: PaymentId,
    /// Loan repaid.
    pub loan_id: LoanId,
    /// Amount received.
    pub amount: Decimal,
    /// Provider receipt.
    pub receipt_number: Option<String>,
    /// Provider reference of the collection.
    pub provider_reference: String,
    /// Time the callback was applied.
    pub paid_at: DateTime<Utc>,
}
