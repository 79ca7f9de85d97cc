//! Core lending logic for ForwardsFlow.
//!
//! This crate contains the loan-approval and payment-settlement logic with
//! ZERO web or database dependencies. Storage, the payment provider and the
//! notification channel are reached through capability traits.
//!
//! # Modules
//!
//! - `scoring` - Borrower risk scoring
//! - `approval` - Tiered auto-approval policy
//! - `ledger` - Loan lifecycle state machine and orchestration
//! - `store` - Record store capability and in-memory implementation
//! - `payment` - Payment gateway capability and callback parsing
//! - `settlement` - Provider callback reconciliation
//! - `notify` - Best-effort borrower notifications

pub mod approval;
pub mod ledger;
pub mod notify;
pub mod payment;
pub mod scoring;
pub mod settlement;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
