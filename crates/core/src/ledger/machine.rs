//! Loan lifecycle state machine.
//!
//! Pure transition rules. The ledger service asks the machine for the next
//! status and then commits it with a compare-and-set on the previous one.

use rust_decimal::Decimal;

use crate::ledger::error::LedgerError;
use crate::ledger::types::{LoanStatus, PaymentKind};

/// Stateless service for loan status transitions.
pub struct LoanStateMachine;

impl LoanStateMachine {
    /// Resolve a pending loan.
    ///
    /// # Returns
    /// * `Ok(Approved | Rejected)` if the loan is pending
    /// * `Err(LedgerError::InvalidState)` otherwise
    pub fn decide(current: LoanStatus, approved: bool) -> Result<LoanStatus, LedgerError> {
        match current {
            LoanStatus::Pending if approved => Ok(LoanStatus::Approved),
            LoanStatus::Pending => Ok(LoanStatus::Rejected),
            _ => Err(LedgerError::InvalidState {
                operation: "decide",
                from: current,
            }),
        }
    }

    /// Claim a loan for disbursement.
    ///
    /// Allowed from `Approved`, and from `DisbursementFailed` when an
    /// operator retries.
    pub fn begin_disbursement(current: LoanStatus) -> Result<LoanStatus, LedgerError> {
        match current {
            LoanStatus::Approved | LoanStatus::DisbursementFailed => {
                Ok(LoanStatus::DisbursementProcessing)
            }
            _ => Err(LedgerError::InvalidState {
                operation: "disburse",
                from: current,
            }),
        }
    }

    /// Claim a loan for a repayment collection.
    pub fn begin_collection(current: LoanStatus) -> Result<LoanStatus, LedgerError> {
        match current {
            LoanStatus::Disbursed | LoanStatus::Repaid | LoanStatus::RepaymentFailed => {
                Ok(LoanStatus::RepaymentProcessing)
            }
            _ => Err(LedgerError::InvalidState {
                operation: "collect repayment on",
                from: current,
            }),
        }
    }

    /// Resolve an in-flight provider call.
    ///
    /// `remaining` is the outstanding balance after a successful collection
    /// has been applied; it is ignored for disbursements and failures.
    pub fn settle(
        current: LoanStatus,
        kind: PaymentKind,
        success: bool,
        remaining: Decimal,
    ) -> Result<LoanStatus, LedgerError> {
        match (current, kind, success) {
            (LoanStatus::DisbursementProcessing, PaymentKind::Disbursement, true) => {
                Ok(LoanStatus::Disbursed)
            }
            (LoanStatus::DisbursementProcessing, PaymentKind::Disbursement, false) => {
                Ok(LoanStatus::DisbursementFailed)
            }
            (LoanStatus::RepaymentProcessing, PaymentKind::Collection, true) => {
                if remaining <= Decimal::ZERO {
                    Ok(LoanStatus::Closed)
                } else {
                    Ok(LoanStatus::Repaid)
                }
            }
            (LoanStatus::RepaymentProcessing, PaymentKind::Collection, false) => {
                Ok(LoanStatus::RepaymentFailed)
            }
            _ => Err(LedgerError::InvalidState {
                operation: "settle",
                from: current,
            }),
        }
    }

    /// Returns true if `from → to` is an edge of the lifecycle graph.
    #[must_use]
    pub fn is_valid_transition(from: LoanStatus, to: LoanStatus) -> bool {
        use LoanStatus::{
            Approved, Closed, DisbursementFailed, DisbursementProcessing, Disbursed, Pending,
            Rejected, Repaid, RepaymentFailed, RepaymentProcessing,
        };
        matches!(
            (from, to),
            (Pending, Approved | Rejected)
                | (Approved | DisbursementFailed, DisbursementProcessing)
                | (DisbursementProcessing, Disbursed | DisbursementFailed)
                | (Disbursed | Repaid | RepaymentFailed, RepaymentProcessing)
                | (RepaymentProcessing, Repaid | RepaymentFailed | Closed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decide_from_pending() {
        assert_eq!(
            LoanStateMachine::decide(LoanStatus::Pending, true).unwrap(),
            LoanStatus::Approved
        );
        assert_eq!(
            LoanStateMachine::decide(LoanStatus::Pending, false).unwrap(),
            LoanStatus::Rejected
        );
    }

    #[rstest]
    #[case(LoanStatus::Approved)]
    #[case(LoanStatus::Rejected)]
    #[case(LoanStatus::Disbursed)]
    #[case(LoanStatus::Closed)]
    fn test_decide_requires_pending(#[case] current: LoanStatus) {
        let result = LoanStateMachine::decide(current, true);
        assert!(matches!(
            result,
            Err(LedgerError::InvalidState { from, .. }) if from == current
        ));
    }

    #[rstest]
    #[case(LoanStatus::Approved, true)]
    #[case(LoanStatus::DisbursementFailed, true)]
    #[case(LoanStatus::Pending, false)]
    #[case(LoanStatus::DisbursementProcessing, false)]
    #[case(LoanStatus::Disbursed, false)]
    fn test_begin_disbursement(#[case] current: LoanStatus, #[case] allowed: bool) {
        assert_eq!(LoanStateMachine::begin_disbursement(current).is_ok(), allowed);
    }

    #[rstest]
    #[case(LoanStatus::Disbursed, true)]
    #[case(LoanStatus::Repaid, true)]
    #[case(LoanStatus::RepaymentFailed, true)]
    #[case(LoanStatus::RepaymentProcessing, false)]
    #[case(LoanStatus::Approved, false)]
    #[case(LoanStatus::Closed, false)]
    fn test_begin_collection(#[case] current: LoanStatus, #[case] allowed: bool) {
        assert_eq!(LoanStateMachine::begin_collection(current).is_ok(), allowed);
    }

    #[rstest]
    #[case(PaymentKind::Collection, true, dec!(100), LoanStatus::Repaid)]
    #[case(PaymentKind::Collection, true, dec!(0), LoanStatus::Closed)]
    #[case(PaymentKind::Collection, true, dec!(-5), LoanStatus::Closed)]
    #[case(PaymentKind::Collection, false, dec!(0), LoanStatus::RepaymentFailed)]
    fn test_settle_collection(
        #[case] kind: PaymentKind,
        #[case] success: bool,
        #[case] remaining: Decimal,
        #[case] expected: LoanStatus,
    ) {
        let next =
            LoanStateMachine::settle(LoanStatus::RepaymentProcessing, kind, success, remaining)
                .unwrap();
        assert_eq!(next, expected);
    }

    #[test]
    fn test_settle_kind_must_match_state() {
        let result = LoanStateMachine::settle(
            LoanStatus::RepaymentProcessing,
            PaymentKind::Disbursement,
            true,
            Decimal::ZERO,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_settle_disbursement() {
        let ok = LoanStateMachine::settle(
            LoanStatus::DisbursementProcessing,
            PaymentKind::Disbursement,
            true,
            Decimal::ZERO,
        );
        assert_eq!(ok.unwrap(), LoanStatus::Disbursed);
    }
}
