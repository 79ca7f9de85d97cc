//! Borrower risk scoring.
//!
//! A pure, deterministic heuristic that turns a borrower's credit history and
//! the requested principal into a score on the 300-850 credit scale.

pub mod risk;

#[cfg(test)]
mod risk_props;

pub use risk::{BorrowerSnapshot, RiskAdjustment, RiskAssessment, RiskScorer};
