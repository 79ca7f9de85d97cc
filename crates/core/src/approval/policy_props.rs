//! Property-based tests for ApprovalPolicy.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::approval::policy::{ApprovalPolicy, CreditTier};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..20_000_000).prop_map(|n| Decimal::new(n, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any prior default makes a request ineligible
    #[test]
    fn prop_default_never_approvable(
        score in 0u16..=1000,
        amount in arb_amount(),
        defaults in 1u32..100,
    ) {
        prop_assert!(!ApprovalPolicy::is_auto_approvable(score, amount, defaults));
    }

    /// Raising the score never turns an eligible request ineligible
    #[test]
    fn prop_monotonic_in_score(
        score in 300u16..=850,
        bump in 0u16..=550,
        amount in arb_amount(),
    ) {
        let higher = score.saturating_add(bump);
        if ApprovalPolicy::is_auto_approvable(score, amount, 0) {
            prop_assert!(ApprovalPolicy::is_auto_approvable(higher, amount, 0));
        }
    }

    /// Tier ordering follows score ordering
    #[test]
    fn prop_tier_monotonic(a in 0u16..=1000, b in 0u16..=1000) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(ApprovalPolicy::tier(low) <= ApprovalPolicy::tier(high));
    }

    /// Poor tier is never eligible
    #[test]
    fn prop_poor_never_approvable(score in 0u16..600, amount in arb_amount()) {
        prop_assert_eq!(ApprovalPolicy::tier(score), CreditTier::Poor);
        prop_assert!(!ApprovalPolicy::is_auto_approvable(score, amount, 0));
    }
}
