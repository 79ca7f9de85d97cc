//! Property-based tests for LoanStateMachine.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::ledger::machine::LoanStateMachine;
use crate::ledger::types::{LoanStatus, PaymentKind};

fn arb_status() -> impl Strategy<Value = LoanStatus> {
    prop::sample::select(LoanStatus::ALL.to_vec())
}

fn arb_kind() -> impl Strategy<Value = PaymentKind> {
    prop_oneof![Just(PaymentKind::Disbursement), Just(PaymentKind::Collection)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every transition the machine produces is an edge of the graph
    #[test]
    fn prop_transitions_are_edges(
        current in arb_status(),
        approved in any::<bool>(),
        kind in arb_kind(),
        success in any::<bool>(),
        remaining in -1000i64..1000,
    ) {
        let candidates = [
            LoanStateMachine::decide(current, approved),
            LoanStateMachine::begin_disbursement(current),
            LoanStateMachine::begin_collection(current),
            LoanStateMachine::settle(current, kind, success, Decimal::from(remaining)),
        ];
        for next in candidates.into_iter().flatten() {
            prop_assert!(LoanStateMachine::is_valid_transition(current, next));
        }
    }

    /// Terminal states admit no transition
    #[test]
    fn prop_terminal_states_are_final(
        current in prop::sample::select(vec![LoanStatus::Rejected, LoanStatus::Closed]),
        approved in any::<bool>(),
        kind in arb_kind(),
        success in any::<bool>(),
    ) {
        prop_assert!(LoanStateMachine::decide(current, approved).is_err());
        prop_assert!(LoanStateMachine::begin_disbursement(current).is_err());
        prop_assert!(LoanStateMachine::begin_collection(current).is_err());
        prop_assert!(LoanStateMachine::settle(current, kind, success, Decimal::ZERO).is_err());
    }

    /// Only a processing loan can be settled
    #[test]
    fn prop_settle_requires_processing(
        current in arb_status(),
        kind in arb_kind(),
        success in any::<bool>(),
    ) {
        let result = LoanStateMachine::settle(current, kind, success, Decimal::ZERO);
        if result.is_ok() {
            prop_assert!(current.is_processing());
        }
    }
}
