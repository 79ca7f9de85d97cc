//! Callback reconciler.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use super::error::ReconcileError;
use crate::ledger::{IgnoreReason, LoanLedger, PaymentKind, SettlementOutcome};
use crate::payment::CallbackResult;

/// Body returned to the provider for every callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackAck {
    /// Always zero.
    #[serde(rename = "ResultCode")]
    pub result_code: i32,
    /// Always "Accepted".
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

impl CallbackAck {
    /// The acknowledgment Daraja expects.
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            result_code: 0,
            result_desc: "Accepted".to_string(),
        }
    }
}

/// Applies provider callbacks to the ledger.
#[derive(Clone)]
pub struct SettlementReconciler {
    ledger: LoanLedger,
}

impl SettlementReconciler {
    /// Creates a reconciler over a ledger.
    #[must_use]
    pub fn new(ledger: LoanLedger) -> Self {
        Self { ledger }
    }

    /// Handles a callback payload and returns the acknowledgment.
    ///
    /// Never fails: malformed payloads and ledger errors are logged and the
    /// callback is still accepted, so the provider does not redeliver.
    pub async fn handle_callback(&self, payload: &Value) -> CallbackAck {
        match self.process(payload).await {
            Ok(SettlementOutcome::Applied(applied)) => info!(
                loan_id = %applied.loan_id,
                provider_reference = %applied.provider_reference,
                status = %applied.status,
                "Callback reconciled"
            ),
            Ok(SettlementOutcome::Ignored { reason }) => {
                info!(reason = ?reason, "Callback ignored");
            }
            Err(ReconcileError::Malformed(e)) => warn!(
                error_code = "MALFORMED_CALLBACK",
                error = %e,
                payload = %payload,
                "MalformedCallback"
            ),
            Err(e) => error!(
                error_code = e.error_code(),
                error = %e,
                "Callback reconciliation failed"
            ),
        }
        CallbackAck::accepted()
    }

    /// Parses and applies a callback, reporting what happened.
    pub async fn process(&self, payload: &Value) -> Result<SettlementOutcome, ReconcileError> {
        let result = self.ledger.gateway().parse_callback(payload)?;
        let Some(provider_reference) = self.settled_reference(&result).await? else {
            warn!(
                account_reference = result.account_reference.as_deref().unwrap_or_default(),
                "No payment in flight for callback account"
            );
            return Ok(SettlementOutcome::Ignored {
                reason: IgnoreReason::UnknownReference,
            });
        };
        self.check_account(&result, &provider_reference).await?;

        let success = result.is_success();
        if !success {
            info!(
                provider_reference = %provider_reference,
                result_code = result.result_code,
                result_desc = result.result_desc.as_deref().unwrap_or_default(),
                "Provider reported failure"
            );
        }

        let outcome = self
            .ledger
            .apply_settlement(
                &provider_reference,
                success,
                result.amount.filter(|_| success),
                result.receipt_number.clone(),
            )
            .await?;

        if let SettlementOutcome::Applied(applied) = &outcome
            && applied.success
            && applied.kind == PaymentKind::Collection
        {
            self.ledger
                .record_payment(
                    &applied.loan_id,
                    &applied.provider_reference,
                    applied.amount,
                    result.receipt_number,
                )
                .await?;
        }

        Ok(outcome)
    }

    /// Provider reference the callback settles.
    ///
    /// Callbacks that carry only a `LOAN-{id}` account reference settle the
    /// payment of the same kind that loan has in flight.
    async fn settled_reference(
        &self,
        result: &CallbackResult,
    ) -> Result<Option<String>, ReconcileError> {
        if let Some(reference) = &result.provider_reference {
            return Ok(Some(reference.clone()));
        }
        let Some(loan_id) = result.account_loan_id() else {
            return Ok(None);
        };
        let intent = self.ledger.open_intent(&loan_id).await?;
        Ok(intent
            .filter(|intent| intent.kind == result.kind)
            .map(|intent| intent.provider_reference))
    }

    /// A collection's account reference must name the loan its intent was
    /// created for.
    async fn check_account(
        &self,
        result: &CallbackResult,
        provider_reference: &str,
    ) -> Result<(), ReconcileError> {
        let Some(callback_loan) = result.account_loan_id() else {
            return Ok(());
        };
        let Some(intent) = self.ledger.intent(provider_reference).await? else {
            return Ok(());
        };
        if intent.loan_id != callback_loan {
            return Err(ReconcileError::AccountMismatch {
                provider_reference: provider_reference.to_string(),
                callback_loan,
                intent_loan: intent.loan_id,
            });
        }
        Ok(())
    }
}
