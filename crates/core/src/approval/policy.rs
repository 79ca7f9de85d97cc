//! Tiered approval policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credit tier derived from a credit score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditTier {
    /// Score below 600. Never auto-approved.
    Poor,
    /// Score 600 to 649.
    Fair,
    /// Score 650 to 699.
    Good,
    /// Score 700 and above.
    Excellent,
}

impl CreditTier {
    /// Tiers ordered best to worst, the order in which floors are matched.
    pub const RANKED: [Self; 4] = [Self::Excellent, Self::Good, Self::Fair, Self::Poor];

    /// Classifies a credit score. The first tier whose floor the score meets wins.
    #[must_use]
    pub fn classify(credit_score: u16) -> Self {
        Self::RANKED
            .into_iter()
            .find(|tier| tier.min_score().is_some_and(|floor| credit_score >= floor))
            .unwrap_or(Self::Poor)
    }

    /// Minimum score for the tier, `None` for `Poor`.
    #[must_use]
    pub const fn min_score(&self) -> Option<u16> {
        match self {
            Self::Excellent => Some(700),
            Self::Good => Some(650),
            Self::Fair => Some(600),
            Self::Poor => None,
        }
    }

    /// Largest amount the tier may auto-approve, `None` for `Poor`.
    #[must_use]
    pub fn limit(&self) -> Option<Decimal> {
        match self {
            Self::Excellent => Some(Decimal::from(100_000)),
            Self::Good => Some(Decimal::from(50_000)),
            Self::Fair => Some(Decimal::from(25_000)),
            Self::Poor => None,
        }
    }

    /// Returns the string representation of the tier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for CreditTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a policy decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyReason {
    /// Amount is within the tier limit.
    WithinTierLimit,
    /// Borrower has at least one defaulted loan.
    PriorDefault,
    /// Score is below every tier floor.
    ScoreBelowFloor,
    /// Amount exceeds the tier limit.
    ExceedsTierLimit,
}

/// Outcome of evaluating a loan request against the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Tier the credit score falls into.
    pub tier: CreditTier,
    /// Limit of that tier, if any.
    pub limit: Option<Decimal>,
    /// True when the loan may be approved without review.
    pub eligible: bool,
    /// Reason for the outcome.
    pub reason: PolicyReason,
}

/// Stateless approval policy.
pub struct ApprovalPolicy;

impl ApprovalPolicy {
    /// Classifies a credit score into a tier.
    #[must_use]
    pub fn tier(credit_score: u16) -> CreditTier {
        CreditTier::classify(credit_score)
    }

    /// Evaluates a request and explains the result.
    ///
    /// Any prior default disqualifies regardless of score. Otherwise the
    /// score selects exactly one tier and the amount must not exceed its
    /// limit; a lower tier is never consulted.
    #[must_use]
    pub fn evaluate(credit_score: u16, amount: Decimal, defaulted_loans: u32) -> PolicyDecision {
        let tier = Self::tier(credit_score);
        let limit = tier.limit();

        let (eligible, reason) = if defaulted_loans > 0 {
            (false, PolicyReason::PriorDefault)
        } else {
            match limit {
                None => (false, PolicyReason::ScoreBelowFloor),
                Some(limit) if amount <= limit => (true, PolicyReason::WithinTierLimit),
                Some(_) => (false, PolicyReason::ExceedsTierLimit),
            }
        };

        PolicyDecision {
            tier,
            limit,
            eligible,
            reason,
        }
    }

    /// Returns true when the request qualifies for auto-approval.
    #[must_use]
    pub fn is_auto_approvable(credit_score: u16, amount: Decimal, defaulted_loans: u32) -> bool {
        Self::evaluate(credit_score, amount, defaulted_loans).eligible
    }
}
