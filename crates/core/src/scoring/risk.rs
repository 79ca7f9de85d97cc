//! Risk score calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Credit history fields the scorer reads from a borrower record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowerSnapshot {
    /// Bureau credit score (300-850), if one is on file.
    pub credit_score: Option<u16>,
    /// Principal borrowed across all closed loans.
    pub total_borrowed: Decimal,
    /// Amount repaid across all closed loans.
    pub total_repaid: Decimal,
    /// Number of loans that ended in default.
    pub defaulted_loans: u32,
}

/// A single adjustment applied on top of the base credit score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskAdjustment {
    /// Requested amount is large relative to the borrowing history.
    LargeExposure {
        /// Points applied (negative).
        points: i32,
    },
    /// Prior defaults.
    DefaultHistory {
        /// Number of defaulted loans.
        defaults: u32,
        /// Points applied (negative).
        points: i32,
    },
    /// Repayment rate above the reward threshold.
    StrongRepayment {
        /// Points applied (positive).
        points: i32,
    },
    /// Repayment rate below the penalty threshold.
    WeakRepayment {
        /// Points applied (negative).
        points: i32,
    },
}

impl RiskAdjustment {
    /// Returns the signed number of points this adjustment contributes.
    #[must_use]
    pub const fn points(&self) -> i32 {
        match self {
            Self::LargeExposure { points }
            | Self::DefaultHistory { points, .. }
            | Self::StrongRepayment { points }
            | Self::WeakRepayment { points } => *points,
        }
    }
}

/// Score together with the adjustments that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Base score before adjustments.
    pub base_score: i32,
    /// Adjustments in the order they were applied.
    pub adjustments: Vec<RiskAdjustment>,
    /// Final score, clamped to the credit scale.
    pub score: i32,
}

/// Stateless risk scorer.
pub struct RiskScorer;

impl RiskScorer {
    /// Score assumed when the borrower has no credit score on file.
    pub const DEFAULT_CREDIT_SCORE: u16 = 500;
    /// Lowest possible score.
    pub const MIN_SCORE: i32 = 300;
    /// Highest possible score.
    pub const MAX_SCORE: i32 = 850;

    const LARGE_EXPOSURE_RATIO: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
    const LARGE_EXPOSURE_PENALTY: i32 = -20;
    const PENALTY_PER_DEFAULT: i32 = -50;
    const STRONG_REPAYMENT_RATE: Decimal = Decimal::from_parts(95, 0, 0, false, 2);
    const STRONG_REPAYMENT_BONUS: i32 = 30;
    const WEAK_REPAYMENT_RATE: Decimal = Decimal::from_parts(7, 0, 0, false, 1);
    const WEAK_REPAYMENT_PENALTY: i32 = -40;

    /// Computes the risk score for a borrower requesting `amount`.
    ///
    /// Deterministic: identical inputs always produce the identical score.
    #[must_use]
    pub fn score(borrower: &BorrowerSnapshot, amount: Decimal) -> i32 {
        Self::assess(borrower, amount).score
    }

    /// Computes the risk score and records every adjustment applied.
    ///
    /// # Algorithm
    ///
    /// 1. Start from the credit score (500 when absent)
    /// 2. `amount / max(total_borrowed, 1) > 0.5` costs 20 points
    /// 3. Each prior default costs 50 points
    /// 4. Repayment rate `total_repaid / max(total_borrowed, 1)` above 0.95
    ///    earns 30 points; below 0.7 costs 40 points
    /// 5. Clamp to [300, 850]
    #[must_use]
    pub fn assess(borrower: &BorrowerSnapshot, amount: Decimal) -> RiskAssessment {
        let base_score = i32::from(borrower.credit_score.unwrap_or(Self::DEFAULT_CREDIT_SCORE));
        let history = borrower.total_borrowed.max(Decimal::ONE);
        let mut adjustments = Vec::new();

        if amount / history > Self::LARGE_EXPOSURE_RATIO {
            adjustments.push(RiskAdjustment::LargeExposure {
                points: Self::LARGE_EXPOSURE_PENALTY,
            });
        }

        if borrower.defaulted_loans > 0 {
            let defaults = i32::try_from(borrower.defaulted_loans).unwrap_or(i32::MAX);
            adjustments.push(RiskAdjustment::DefaultHistory {
                defaults: borrower.defaulted_loans,
                points: defaults.saturating_mul(Self::PENALTY_PER_DEFAULT),
            });
        }

        let repayment_rate = borrower.total_repaid / history;
        if repayment_rate > Self::STRONG_REPAYMENT_RATE {
            adjustments.push(RiskAdjustment::StrongRepayment {
                points: Self::STRONG_REPAYMENT_BONUS,
            });
        } else if repayment_rate < Self::WEAK_REPAYMENT_RATE {
            adjustments.push(RiskAdjustment::WeakRepayment {
                points: Self::WEAK_REPAYMENT_PENALTY,
            });
        }

        let raw = adjustments
            .iter()
            .fold(base_score, |score, adj| score.saturating_add(adj.points()));

        RiskAssessment {
            base_score,
            adjustments,
            score: raw.clamp(Self::MIN_SCORE, Self::MAX_SCORE),
        }
    }
}
