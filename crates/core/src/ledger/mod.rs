//! Loan ledger.
//!
//! Owns the loan lifecycle: decisions, payment submissions and settlement
//! of provider callbacks. Transition rules live in [`LoanStateMachine`];
//! [`LoanLedger`] applies them against a [`LoanStore`](crate::store::LoanStore)
//! and calls out to the payment gateway and the notifier.

pub mod error;
pub mod machine;
pub mod service;
pub mod types;

#[cfg(test)]
mod machine_props;

pub use error::LedgerError;
pub use machine::LoanStateMachine;
pub use service::{
    AutoDecision, IgnoreReason, LoanEvaluation, LoanLedger, MAX_DURATION_DAYS, MAX_INTEREST_RATE,
    MAX_LOAN_AMOUNT, PaymentInitiation, SettlementApplied, SettlementOutcome,
};
pub use types::{
    Borrower, Loan, LoanStatus, NewBorrower, NewLoanApplication, Payment, PaymentIntent,
    PaymentKind, Transaction, TransactionStatus, TransactionType,
};
