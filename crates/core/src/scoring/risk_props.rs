//! Property-based tests for RiskScorer.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::scoring::risk::{BorrowerSnapshot, RiskScorer};

/// Strategy for generating borrower snapshots, including missing scores.
fn arb_borrower() -> impl Strategy<Value = BorrowerSnapshot> {
    (
        prop::option::of(0u16..1000),
        0i64..10_000_000,
        0i64..10_000_000,
        0u32..50,
    )
        .prop_map(|(credit_score, borrowed, repaid, defaults)| BorrowerSnapshot {
            credit_score,
            total_borrowed: Decimal::new(borrowed, 2),
            total_repaid: Decimal::new(repaid, 2),
            defaulted_loans: defaults,
        })
}

/// Strategy for generating loan amounts in shillings and cents.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000).prop_map(|n| Decimal::new(n, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Score is always on the credit scale
    #[test]
    fn prop_score_within_bounds(borrower in arb_borrower(), amount in arb_amount()) {
        let score = RiskScorer::score(&borrower, amount);
        prop_assert!((RiskScorer::MIN_SCORE..=RiskScorer::MAX_SCORE).contains(&score));
    }

    /// Identical inputs produce identical scores
    #[test]
    fn prop_score_deterministic(borrower in arb_borrower(), amount in arb_amount()) {
        let first = RiskScorer::assess(&borrower, amount);
        let second = RiskScorer::assess(&borrower, amount);
        prop_assert_eq!(first, second);
    }

    /// An extra default never raises the score
    #[test]
    fn prop_defaults_never_help(borrower in arb_borrower(), amount in arb_amount()) {
        let worse = BorrowerSnapshot {
            defaulted_loans: borrower.defaulted_loans + 1,
            ..borrower
        };
        prop_assert!(RiskScorer::score(&worse, amount) <= RiskScorer::score(&borrower, amount));
    }

    /// Unclamped score equals base plus the sum of recorded adjustments
    #[test]
    fn prop_adjustments_explain_score(borrower in arb_borrower(), amount in arb_amount()) {
        let assessment = RiskScorer::assess(&borrower, amount);
        let raw: i32 = assessment.base_score
            + assessment.adjustments.iter().map(|a| a.points()).sum::<i32>();
        prop_assert_eq!(
            assessment.score,
            raw.clamp(RiskScorer::MIN_SCORE, RiskScorer::MAX_SCORE)
        );
    }
}
