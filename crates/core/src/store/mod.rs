//! Record store capability.
//!
//! The ledger owns no storage of its own. Everything it persists goes through
//! [`LoanStore`], which must provide compare-and-set on loan status and on
//! transaction status so that decisions and settlements stay exclusive
//! without in-process locks.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use async_trait::async_trait;
use forwardsflow_shared::types::{BorrowerId, LoanId, TransactionId};
use rust_decimal::Decimal;

use crate::ledger::types::{
    Borrower, Loan, LoanStatus, Payment, PaymentIntent, Transaction, TransactionStatus,
};

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage abstraction for borrowers, loans, the transaction log, payment
/// intents and payments.
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Inserts a new borrower. Fails with `Conflict` if the key exists.
    async fn insert_borrower(&self, borrower: Borrower) -> StoreResult<()>;

    /// Fetches a borrower.
    async fn borrower(&self, id: &BorrowerId) -> StoreResult<Option<Borrower>>;

    /// Atomically adds to a borrower's lifetime totals.
    async fn adjust_borrower_totals(
        &self,
        id: &BorrowerId,
        borrowed: Decimal,
        repaid: Decimal,
    ) -> StoreResult<Borrower>;

    /// Inserts a new loan. Fails with `Conflict` if the key exists.
    async fn insert_loan(&self, loan: Loan) -> StoreResult<()>;

    /// Fetches a loan.
    async fn loan(&self, id: &LoanId) -> StoreResult<Option<Loan>>;

    /// Replaces a loan if the stored copy still has `expected_status` and
    /// the same version as `loan`.
    ///
    /// Returns the committed loan (version bumped) or `None` when another
    /// writer got there first.
    async fn update_loan_if(
        &self,
        loan: Loan,
        expected_status: LoanStatus,
    ) -> StoreResult<Option<Loan>>;

    /// Appends a transaction log entry.
    async fn append_transaction(&self, transaction: Transaction) -> StoreResult<()>;

    /// Fetches a transaction log entry.
    async fn transaction(&self, id: &TransactionId) -> StoreResult<Option<Transaction>>;

    /// All entries for a loan, oldest first.
    async fn transactions_for_loan(&self, loan_id: &LoanId) -> StoreResult<Vec<Transaction>>;

    /// Moves a transaction from `expected` to `new` and stamps the receipt.
    ///
    /// Returns false if the stored status was not `expected`.
    async fn resolve_transaction(
        &self,
        id: &TransactionId,
        expected: TransactionStatus,
        new: TransactionStatus,
        receipt_number: Option<String>,
    ) -> StoreResult<bool>;

    /// Appends a `PROCESSING` transaction and stores its intent in one
    /// write. Neither is kept if either key already exists.
    async fn open_payment(
        &self,
        transaction: Transaction,
        intent: PaymentIntent,
    ) -> StoreResult<()>;

    /// Looks up an intent by provider reference.
    async fn intent(&self, provider_reference: &str) -> StoreResult<Option<PaymentIntent>>;

    /// The intent still awaiting a callback for a loan, if any. A loan has
    /// at most one payment in flight.
    async fn intent_for_loan(&self, loan_id: &LoanId) -> StoreResult<Option<PaymentIntent>>;

    /// Removes an intent, returning it if it was present.
    async fn remove_intent(&self, provider_reference: &str)
    -> StoreResult<Option<PaymentIntent>>;

    /// Records a confirmed repayment.
    async fn record_payment(&self, payment: Payment) -> StoreResult<()>;

    /// All payments for a loan, oldest first.
    async fn payments_for_loan(&self, loan_id: &LoanId) -> StoreResult<Vec<Payment>>;
}
