//! Loan ledger service.
//!
//! Every state change follows the same order: validate the transition with
//! [`LoanStateMachine`], commit it with a compare-and-set on the loan's
//! previous status, append to the transaction log, then notify the borrower.

use std::sync::Arc;

use chrono::Utc;
use forwardsflow_shared::types::{BorrowerId, LoanId, PaymentId, format_kes};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::approval::{ApprovalPolicy, PolicyDecision};
use crate::ledger::error::LedgerError;
use crate::ledger::machine::LoanStateMachine;
use crate::ledger::types::{
    Borrower, Loan, LoanStatus, NewBorrower, NewLoanApplication, Payment, PaymentIntent,
    PaymentKind, Transaction, TransactionStatus, TransactionType,
};
use crate::notify::{NotificationDispatcher, NotificationParams, NotificationTemplate};
use crate::payment::{
    CollectionRequest, DisbursementRequest, GatewayError, PaymentAck, PaymentGateway,
};
use crate::scoring::{RiskAssessment, RiskScorer};
use crate::store::{LoanStore, StoreError};

/// Attempts at committing a settled loan before giving up.
const SETTLE_COMMIT_ATTEMPTS: usize = 3;

/// Attempts at recording a payment the provider has already accepted.
const SUBMISSION_RECORD_ATTEMPTS: usize = 3;

/// Largest principal accepted on an application, in shillings.
pub const MAX_LOAN_AMOUNT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Largest annual interest rate accepted on an application, in percent.
pub const MAX_INTEREST_RATE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Longest term accepted on an application, in days.
pub const MAX_DURATION_DAYS: u32 = 3650;

/// Risk and policy view of a loan, computed without mutating anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanEvaluation {
    /// Loan evaluated.
    pub loan_id: LoanId,
    /// Credit score fed to the policy (500 when the borrower has none).
    pub credit_score: u16,
    /// Risk score with its adjustments.
    pub risk: RiskAssessment,
    /// Auto-approval decision.
    pub policy: PolicyDecision,
}

/// Result of [`LoanLedger::auto_decide`].
#[derive(Debug, Clone)]
pub enum AutoDecision {
    /// Policy allowed it; the approval was recorded.
    Approved {
        /// Committed loan.
        loan: Loan,
        /// Evaluation that allowed it.
        evaluation: LoanEvaluation,
    },
    /// Policy did not allow it; the loan stays pending.
    ManualReview {
        /// Unchanged loan.
        loan: Loan,
        /// Evaluation that sent it to review.
        evaluation: LoanEvaluation,
    },
}

/// A provider call acknowledged and awaiting its callback.
#[derive(Debug, Clone)]
pub struct PaymentInitiation {
    /// Loan in its `*_PROCESSING` state.
    pub loan: Loan,
    /// The `PROCESSING` transaction the callback will resolve.
    pub transaction: Transaction,
    /// Provider reference.
    pub provider_reference: String,
    /// Provider's response description.
    pub description: String,
}

/// Why a settlement was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// No intent exists for the provider reference.
    UnknownReference,
    /// The transaction was already resolved by an earlier delivery.
    AlreadyResolved,
}

/// Details of an applied settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementApplied {
    /// Loan settled.
    pub loan_id: LoanId,
    /// Provider reference settled.
    pub provider_reference: String,
    /// Direction of the movement.
    pub kind: PaymentKind,
    /// Whether the provider reported success.
    pub success: bool,
    /// Amount applied (zero on failure).
    pub amount: Decimal,
    /// Status after the settlement.
    pub status: LoanStatus,
    /// Outstanding balance after the settlement.
    pub outstanding: Decimal,
}

/// Result of [`LoanLedger::apply_settlement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// The loan and transaction were updated.
    Applied(SettlementApplied),
    /// Nothing changed.
    Ignored {
        /// Why.
        reason: IgnoreReason,
    },
}

/// Loan lifecycle orchestration over a store, a gateway and a notifier.
#[derive(Clone)]
pub struct LoanLedger {
    store: Arc<dyn LoanStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: NotificationDispatcher,
}

impl LoanLedger {
    /// Creates a ledger over its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn LoanStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
        }
    }

    /// Payment gateway the ledger submits to.
    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn PaymentGateway> {
        &self.gateway
    }

    // ------------------------------------------------------------------
    // Intake and queries
    // ------------------------------------------------------------------

    /// Registers a borrower with an empty history.
    pub async fn register_borrower(&self, input: NewBorrower) -> Result<Borrower, LedgerError> {
        if let Some(score) = input.credit_score
            && !(300..=850).contains(&score)
        {
            return Err(LedgerError::InvalidCreditScore(score));
        }

        let borrower = Borrower::new(input);
        self.store.insert_borrower(borrower.clone()).await?;
        info!(borrower_id = %borrower.id, "Borrower registered");
        Ok(borrower)
    }

    /// Stores a new `PENDING` loan for an existing borrower.
    pub async fn submit_application(
        &self,
        input: NewLoanApplication,
    ) -> Result<Loan, LedgerError> {
        if input.amount <= Decimal::ZERO || input.amount > MAX_LOAN_AMOUNT {
            return Err(LedgerError::InvalidAmount(input.amount));
        }
        if input.duration_days == 0 || input.duration_days > MAX_DURATION_DAYS {
            return Err(LedgerError::InvalidDuration);
        }
        if input.interest_rate < Decimal::ZERO || input.interest_rate > MAX_INTEREST_RATE {
            return Err(LedgerError::InvalidAmount(input.interest_rate));
        }
        self.borrower(&input.borrower_id).await?;

        let loan = Loan::new(input);
        self.store.insert_loan(loan.clone()).await?;
        info!(
            loan_id = %loan.id,
            borrower_id = %loan.borrower_id,
            amount = %loan.amount,
            "Loan application submitted"
        );
        Ok(loan)
    }

    /// Fetches a loan.
    pub async fn loan(&self, loan_id: &LoanId) -> Result<Loan, LedgerError> {
        self.store
            .loan(loan_id)
            .await?
            .ok_or_else(|| LedgerError::LoanNotFound(loan_id.clone()))
    }

    /// Fetches a borrower.
    pub async fn borrower(&self, borrower_id: &BorrowerId) -> Result<Borrower, LedgerError> {
        self.store
            .borrower(borrower_id)
            .await?
            .ok_or_else(|| LedgerError::BorrowerNotFound(borrower_id.clone()))
    }

    /// Transaction log entries for a loan, oldest first.
    pub async fn transactions_for_loan(
        &self,
        loan_id: &LoanId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.loan(loan_id).await?;
        Ok(self.store.transactions_for_loan(loan_id).await?)
    }

    /// Confirmed repayments for a loan.
    pub async fn payments_for_loan(&self, loan_id: &LoanId) -> Result<Vec<Payment>, LedgerError> {
        self.loan(loan_id).await?;
        Ok(self.store.payments_for_loan(loan_id).await?)
    }

    /// Looks up the intent awaiting a provider reference.
    pub async fn intent(
        &self,
        provider_reference: &str,
    ) -> Result<Option<PaymentIntent>, LedgerError> {
        Ok(self.store.intent(provider_reference).await?)
    }

    /// The payment still awaiting a callback for a loan, if any.
    pub async fn open_intent(
        &self,
        loan_id: &LoanId,
    ) -> Result<Option<PaymentIntent>, LedgerError> {
        Ok(self.store.intent_for_loan(loan_id).await?)
    }

    /// Scores a loan and runs it through the approval policy.
    pub async fn evaluate(&self, loan_id: &LoanId) -> Result<LoanEvaluation, LedgerError> {
        let loan = self.loan(loan_id).await?;
        let borrower = self.borrower(&loan.borrower_id).await?;
        Ok(Self::assess(&loan, &borrower))
    }

    // ------------------------------------------------------------------
    // Decisions
    // ------------------------------------------------------------------

    /// Approves or rejects a pending loan.
    ///
    /// Exactly one concurrent decision on a loan wins; the others see
    /// `InvalidState`. Once the status is committed the decision stands,
    /// even if its log entry cannot be written.
    pub async fn record_decision(
        &self,
        loan_id: &LoanId,
        approved: bool,
        notes: Option<String>,
    ) -> Result<Loan, LedgerError> {
        let loan = self.loan(loan_id).await?;
        let next = LoanStateMachine::decide(loan.status, approved)?;
        let borrower = self.borrower(&loan.borrower_id).await?;
        let evaluation = Self::assess(&loan, &borrower);

        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Auto-approved".to_string());

        let mut updated = loan.clone();
        updated.status = next;
        updated.approval_date = Some(Utc::now());
        updated.risk_score = Some(evaluation.risk.score);
        updated.notes = Some(notes.clone());

        let committed = self.commit(updated, loan.status, "decide").await?;

        let status = if approved {
            TransactionStatus::Approved
        } else {
            TransactionStatus::Rejected
        };
        let entry = Transaction::new(
            TransactionType::LoanApproval,
            &committed,
            committed.amount,
            status,
        )
        .with_metadata(json!({
            "riskScore": evaluation.risk.score,
            "autoApproved": evaluation.policy.eligible,
            "tier": evaluation.policy.tier,
            "notes": notes,
        }));
        if let Err(e) = self.store.append_transaction(entry).await {
            error!(loan_id = %committed.id, error = %e, "Failed to log loan decision");
        }

        info!(
            loan_id = %committed.id,
            status = %committed.status,
            risk_score = evaluation.risk.score,
            auto_approvable = evaluation.policy.eligible,
            "Loan decision recorded"
        );

        let template = if approved {
            NotificationTemplate::LoanApproved
        } else {
            NotificationTemplate::LoanRejected
        };
        self.notify(
            &borrower,
            template,
            &NotificationParams::from([("amount", format_kes(committed.amount))]),
        );

        Ok(committed)
    }

    /// Approves the loan when the policy allows it, otherwise leaves it
    /// pending for manual review.
    pub async fn auto_decide(&self, loan_id: &LoanId) -> Result<AutoDecision, LedgerError> {
        let loan = self.loan(loan_id).await?;
        LoanStateMachine::decide(loan.status, true)?;
        let borrower = self.borrower(&loan.borrower_id).await?;
        let evaluation = Self::assess(&loan, &borrower);

        if !evaluation.policy.eligible {
            info!(
                loan_id = %loan.id,
                reason = ?evaluation.policy.reason,
                "Loan referred for manual review"
            );
            return Ok(AutoDecision::ManualReview { loan, evaluation });
        }

        let loan = self.record_decision(loan_id, true, None).await?;
        Ok(AutoDecision::Approved { loan, evaluation })
    }

    // ------------------------------------------------------------------
    // Payment submission
    // ------------------------------------------------------------------

    /// Sends the principal to the borrower.
    pub async fn begin_disbursement(
        &self,
        loan_id: &LoanId,
    ) -> Result<PaymentInitiation, LedgerError> {
        let loan = self.loan(loan_id).await?;
        let next = LoanStateMachine::begin_disbursement(loan.status)?;
        let borrower = self.borrower(&loan.borrower_id).await?;

        let mut claim = loan.clone();
        claim.status = next;
        let claimed = self.commit(claim, loan.status, "disburse").await?;

        let request = DisbursementRequest {
            loan_id: claimed.id.clone(),
            phone_number: borrower.phone_number.clone(),
            amount: claimed.amount,
        };
        let amount = claimed.amount;
        let submitted = self.gateway.disburse(request).await;
        self.record_submission(claimed, PaymentKind::Disbursement, amount, submitted)
            .await
    }

    /// Requests a repayment from the borrower.
    pub async fn begin_repayment_collection(
        &self,
        loan_id: &LoanId,
        amount: Decimal,
    ) -> Result<PaymentInitiation, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let loan = self.loan(loan_id).await?;
        let next = LoanStateMachine::begin_collection(loan.status)?;
        let borrower = self.borrower(&loan.borrower_id).await?;

        let mut claim = loan.clone();
        claim.status = next;
        let claimed = self
            .commit(claim, loan.status, "collect repayment on")
            .await?;

        let request = CollectionRequest {
            loan_id: claimed.id.clone(),
            phone_number: borrower.phone_number.clone(),
            amount,
        };
        let submitted = self.gateway.collect(request).await;
        self.record_submission(claimed, PaymentKind::Collection, amount, submitted)
            .await
    }

    async fn record_submission(
        &self,
        claimed: Loan,
        kind: PaymentKind,
        amount: Decimal,
        submitted: Result<PaymentAck, GatewayError>,
    ) -> Result<PaymentInitiation, LedgerError> {
        let ack = match submitted {
            Ok(ack) => ack,
            Err(e) => {
                self.fail_submission(claimed, kind, amount, &e).await;
                return Err(e.into());
            }
        };

        let transaction = Transaction::new(
            kind.transaction_type(),
            &claimed,
            amount,
            TransactionStatus::Processing,
        )
        .with_reference(ack.provider_reference.clone())
        .with_metadata(json!({ "description": ack.description }));
        let intent = PaymentIntent {
            provider_reference: ack.provider_reference.clone(),
            transaction_id: transaction.id,
            loan_id: claimed.id.clone(),
            kind,
            amount,
            created_at: Utc::now(),
        };
        self.open_payment(&transaction, &intent).await?;

        info!(
            loan_id = %claimed.id,
            provider_reference = %ack.provider_reference,
            kind = %kind,
            amount = %amount,
            "Payment submitted"
        );

        Ok(PaymentInitiation {
            loan: claimed,
            transaction,
            provider_reference: ack.provider_reference,
            description: ack.description,
        })
    }

    /// Money is already moving once the provider accepts, so transient store
    /// failures are retried before the payment is reported unrecorded.
    async fn open_payment(
        &self,
        transaction: &Transaction,
        intent: &PaymentIntent,
    ) -> Result<(), LedgerError> {
        let mut attempt = 1;
        loop {
            match self
                .store
                .open_payment(transaction.clone(), intent.clone())
                .await
            {
                Ok(()) => return Ok(()),
                Err(StoreError::Unavailable(e)) if attempt < SUBMISSION_RECORD_ATTEMPTS => {
                    warn!(
                        provider_reference = %intent.provider_reference,
                        attempt,
                        error = %e,
                        "Retrying payment record"
                    );
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        loan_id = %intent.loan_id,
                        provider_reference = %intent.provider_reference,
                        amount = %intent.amount,
                        error = %e,
                        "Payment accepted by provider but not recorded"
                    );
                    return Err(e.into());
                }
            }
        }
    }

    /// Resolves a claim whose provider submission failed outright.
    ///
    /// Store failures here are logged only; the gateway error is what the
    /// caller needs to see.
    async fn fail_submission(
        &self,
        claimed: Loan,
        kind: PaymentKind,
        amount: Decimal,
        cause: &GatewayError,
    ) {
        warn!(
            loan_id = %claimed.id,
            kind = %kind,
            error_code = cause.error_code(),
            error = %cause,
            "Payment submission rejected"
        );

        let entry = Transaction::new(
            kind.transaction_type(),
            &claimed,
            amount,
            TransactionStatus::Failed,
        )
        .with_metadata(json!({
            "errorCode": cause.error_code(),
            "error": cause.to_string(),
        }));

        let claimed_status = claimed.status;
        let mut failed = claimed;
        match LoanStateMachine::settle(claimed_status, kind, false, Decimal::ZERO) {
            Ok(status) => failed.status = status,
            Err(e) => {
                error!(loan_id = %failed.id, error = %e, "Cannot resolve failed submission");
                return;
            }
        }

        match self.store.update_loan_if(failed, claimed_status).await {
            Ok(Some(loan)) => info!(loan_id = %loan.id, status = %loan.status, "Loan marked failed"),
            Ok(None) => warn!(loan_id = %entry.loan_id, "Loan changed while marking failure"),
            Err(e) => error!(loan_id = %entry.loan_id, error = %e, "Failed to mark loan failed"),
        }

        if let Err(e) = self.store.append_transaction(entry).await {
            error!(error = %e, "Failed to log failed submission");
        }
    }

    // ------------------------------------------------------------------
    // Settlement
    // ------------------------------------------------------------------

    /// Applies a provider outcome to the loan awaiting `provider_reference`.
    ///
    /// `amount` is the confirmed amount; the submitted amount is used when
    /// the provider did not report one. Unknown references and repeated
    /// deliveries are ignored without error.
    pub async fn apply_settlement(
        &self,
        provider_reference: &str,
        success: bool,
        amount: Option<Decimal>,
        receipt_number: Option<String>,
    ) -> Result<SettlementOutcome, LedgerError> {
        let Some(intent) = self.store.intent(provider_reference).await? else {
            warn!(provider_reference, "Settlement for unknown provider reference");
            return Ok(SettlementOutcome::Ignored {
                reason: IgnoreReason::UnknownReference,
            });
        };

        let pending = self
            .store
            .transaction(&intent.transaction_id)
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!("transaction {}", intent.transaction_id))
            })?;
        if pending.status != TransactionStatus::Processing {
            info!(provider_reference, "Settlement already applied");
            return Ok(SettlementOutcome::Ignored {
                reason: IgnoreReason::AlreadyResolved,
            });
        }

        let settled_amount = if success {
            let confirmed = amount.unwrap_or(intent.amount);
            if confirmed <= Decimal::ZERO {
                return Err(LedgerError::InvalidAmount(confirmed));
            }
            confirmed
        } else {
            Decimal::ZERO
        };

        let loan = self.loan(&intent.loan_id).await?;
        if let Err(e) = Self::settled(&loan, intent.kind, success, settled_amount) {
            // A concurrent delivery may have settled both since the check above
            if self.is_resolved(&intent).await? {
                info!(provider_reference, "Settlement already applied");
                return Ok(SettlementOutcome::Ignored {
                    reason: IgnoreReason::AlreadyResolved,
                });
            }
            return Err(e);
        }

        let new_status = if success {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Failed
        };
        let claimed = self
            .store
            .resolve_transaction(
                &intent.transaction_id,
                TransactionStatus::Processing,
                new_status,
                receipt_number,
            )
            .await?;
        if !claimed {
            info!(provider_reference, "Settlement already applied");
            return Ok(SettlementOutcome::Ignored {
                reason: IgnoreReason::AlreadyResolved,
            });
        }

        let committed = match self
            .commit_settlement(loan, intent.kind, success, settled_amount)
            .await
        {
            Ok(committed) => committed,
            Err(e) => {
                self.reopen_transaction(&intent, new_status).await;
                return Err(e);
            }
        };

        // The loan and its transaction are settled; what follows is cleanup
        if let Err(e) = self.store.remove_intent(provider_reference).await {
            error!(provider_reference, error = %e, "Failed to remove settled intent");
        }
        if committed.status == LoanStatus::Closed
            && let Err(e) = self
                .store
                .adjust_borrower_totals(
                    &committed.borrower_id,
                    committed.amount,
                    committed.amount_repaid,
                )
                .await
        {
            error!(
                borrower_id = %committed.borrower_id,
                loan_id = %committed.id,
                error = %e,
                "Failed to update borrower totals"
            );
        }

        info!(
            loan_id = %committed.id,
            provider_reference,
            status = %committed.status,
            outstanding = %committed.outstanding,
            "Settlement applied"
        );

        let notified_amount = if success { settled_amount } else { intent.amount };
        self.notify_settlement(&committed, intent.kind, success, notified_amount)
            .await;

        Ok(SettlementOutcome::Applied(SettlementApplied {
            loan_id: committed.id,
            provider_reference: provider_reference.to_string(),
            kind: intent.kind,
            success,
            amount: settled_amount,
            status: committed.status,
            outstanding: committed.outstanding,
        }))
    }

    /// Records a confirmed repayment.
    pub async fn record_payment(
        &self,
        loan_id: &LoanId,
        provider_reference: &str,
        amount: Decimal,
        receipt_number: Option<String>,
    ) -> Result<Payment, LedgerError> {
        let payment = Payment {
            id: PaymentId::new(),
            loan_id: loan_id.clone(),
            amount,
            receipt_number,
            provider_reference: provider_reference.to_string(),
            paid_at: Utc::now(),
        };
        self.store.record_payment(payment.clone()).await?;
        Ok(payment)
    }

    /// Loan after applying a provider outcome, not yet committed.
    fn settled(
        loan: &Loan,
        kind: PaymentKind,
        success: bool,
        amount: Decimal,
    ) -> Result<Loan, LedgerError> {
        let mut next = loan.clone();
        match (kind, success) {
            (PaymentKind::Disbursement, true) => {
                next.status = LoanStateMachine::settle(loan.status, kind, true, Decimal::ZERO)?;
                next.outstanding = loan.total_repayable();
            }
            (PaymentKind::Collection, true) => {
                let remaining = loan
                    .outstanding
                    .checked_sub(amount)
                    .ok_or(LedgerError::InvalidAmount(amount))?;
                next.status = LoanStateMachine::settle(loan.status, kind, true, remaining)?;
                next.outstanding = remaining.max(Decimal::ZERO);
                next.amount_repaid += amount;
            }
            (_, false) => {
                next.status = LoanStateMachine::settle(loan.status, kind, false, Decimal::ZERO)?;
            }
        }
        Ok(next)
    }

    async fn is_resolved(&self, intent: &PaymentIntent) -> Result<bool, LedgerError> {
        Ok(self
            .store
            .transaction(&intent.transaction_id)
            .await?
            .is_some_and(|t| t.status != TransactionStatus::Processing))
    }

    /// Puts a claimed transaction back to `PROCESSING` after its loan failed
    /// to commit, so a redelivered callback can settle both.
    async fn reopen_transaction(&self, intent: &PaymentIntent, claimed: TransactionStatus) {
        match self
            .store
            .resolve_transaction(
                &intent.transaction_id,
                claimed,
                TransactionStatus::Processing,
                None,
            )
            .await
        {
            Ok(true) => warn!(
                provider_reference = %intent.provider_reference,
                "Settlement rolled back; awaiting redelivery"
            ),
            Ok(false) => warn!(
                provider_reference = %intent.provider_reference,
                "Transaction changed before rollback"
            ),
            Err(e) => error!(
                provider_reference = %intent.provider_reference,
                transaction_id = %intent.transaction_id,
                error = %e,
                "Failed to roll back settlement"
            ),
        }
    }

    async fn commit_settlement(
        &self,
        mut loan: Loan,
        kind: PaymentKind,
        success: bool,
        amount: Decimal,
    ) -> Result<Loan, LedgerError> {
        for _ in 0..SETTLE_COMMIT_ATTEMPTS {
            let next = Self::settled(&loan, kind, success, amount)?;
            if let Some(committed) = self.store.update_loan_if(next, loan.status).await? {
                return Ok(committed);
            }
            loan = self.loan(&loan.id).await?;
        }
        Err(StoreError::Conflict(format!("loan {} kept changing during settlement", loan.id)).into())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn assess(loan: &Loan, borrower: &Borrower) -> LoanEvaluation {
        let credit_score = borrower
            .credit_score
            .unwrap_or(RiskScorer::DEFAULT_CREDIT_SCORE);
        LoanEvaluation {
            loan_id: loan.id.clone(),
            credit_score,
            risk: RiskScorer::assess(&borrower.snapshot(), loan.amount),
            policy: ApprovalPolicy::evaluate(credit_score, loan.amount, borrower.defaulted_loans),
        }
    }

    /// Commits `updated` if the stored loan is still in `expected`.
    ///
    /// A lost race is reported as `InvalidState` from whatever status the
    /// winner left behind.
    async fn commit(
        &self,
        updated: Loan,
        expected: LoanStatus,
        operation: &'static str,
    ) -> Result<Loan, LedgerError> {
        let loan_id = updated.id.clone();
        if let Some(committed) = self.store.update_loan_if(updated, expected).await? {
            return Ok(committed);
        }
        let current = self.loan(&loan_id).await?;
        warn!(loan_id = %loan_id, status = %current.status, operation, "Lost loan update race");
        Err(LedgerError::InvalidState {
            operation,
            from: current.status,
        })
    }

    /// `amount` is the settled amount on success, the submitted one on failure.
    async fn notify_settlement(
        &self,
        loan: &Loan,
        kind: PaymentKind,
        success: bool,
        amount: Decimal,
    ) {
        let borrower = match self.borrower(&loan.borrower_id).await {
            Ok(borrower) => borrower,
            Err(e) => {
                warn!(loan_id = %loan.id, error = %e, "Skipping settlement notification");
                return;
            }
        };

        let mut params = NotificationParams::from([
            ("loan_id", loan.id.to_string()),
            ("outstanding", format_kes(loan.outstanding)),
        ]);
        let template = match (kind, success, loan.status) {
            (PaymentKind::Disbursement, true, _) => {
                params.insert("amount", format_kes(loan.amount));
                NotificationTemplate::DisbursementSent
            }
            (PaymentKind::Collection, true, LoanStatus::Closed) => NotificationTemplate::LoanClosed,
            (PaymentKind::Collection, true, _) => {
                params.insert("amount", format_kes(amount));
                NotificationTemplate::RepaymentReceived
            }
            (_, false, _) => {
                params.insert("kind", kind.as_str().to_string());
                params.insert("amount", format_kes(amount));
                NotificationTemplate::PaymentFailed
            }
        };
        self.notify(&borrower, template, &params);
    }

    fn notify(&self, borrower: &Borrower, template: NotificationTemplate, params: &NotificationParams) {
        self.notifier.notify(
            self.notifier.default_channel(),
            &borrower.phone_number,
            template,
            params,
        );
    }
}
