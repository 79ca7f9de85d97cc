//! Auto-approval eligibility.
//!
//! Classifies a credit score into a tier and checks the requested amount
//! against that tier's limit.

pub mod policy;

#[cfg(test)]
mod policy_props;

pub use policy::{ApprovalPolicy, CreditTier, PolicyDecision, PolicyReason};
