//! In-memory store backed by concurrent hash maps.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use forwardsflow_shared::types::{BorrowerId, LoanId, TransactionId};
use rust_decimal::Decimal;

use super::{LoanStore, StoreError, StoreResult};
use crate::ledger::types::{
    Borrower, Loan, LoanStatus, Payment, PaymentIntent, Transaction, TransactionStatus,
};

/// [`LoanStore`] kept in process memory.
///
/// Each compare-and-set holds the map shard lock for the duration of the
/// check and the write, so concurrent callers observe a single winner.
#[derive(Debug, Default)]
pub struct MemoryStore {
    borrowers: DashMap<BorrowerId, Borrower>,
    loans: DashMap<LoanId, Loan>,
    transactions: DashMap<TransactionId, Transaction>,
    intents: DashMap<String, PaymentIntent>,
    payments: DashMap<LoanId, Vec<Payment>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoanStore for MemoryStore {
    async fn insert_borrower(&self, borrower: Borrower) -> StoreResult<()> {
        match self.borrowers.entry(borrower.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("borrower {}", borrower.id))),
            Entry::Vacant(slot) => {
                slot.insert(borrower);
                Ok(())
            }
        }
    }

    async fn borrower(&self, id: &BorrowerId) -> StoreResult<Option<Borrower>> {
        Ok(self.borrowers.get(id).map(|b| b.value().clone()))
    }

    async fn adjust_borrower_totals(
        &self,
        id: &BorrowerId,
        borrowed: Decimal,
        repaid: Decimal,
    ) -> StoreResult<Borrower> {
        let mut borrower = self
            .borrowers
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("borrower {id}")))?;
        borrower.total_borrowed += borrowed;
        borrower.total_repaid += repaid;
        Ok(borrower.value().clone())
    }

    async fn insert_loan(&self, loan: Loan) -> StoreResult<()> {
        match self.loans.entry(loan.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("loan {}", loan.id))),
            Entry::Vacant(slot) => {
                slot.insert(loan);
                Ok(())
            }
        }
    }

    async fn loan(&self, id: &LoanId) -> StoreResult<Option<Loan>> {
        Ok(self.loans.get(id).map(|l| l.value().clone()))
    }

    async fn update_loan_if(
        &self,
        mut loan: Loan,
        expected_status: LoanStatus,
    ) -> StoreResult<Option<Loan>> {
        let mut stored = self
            .loans
            .get_mut(&loan.id)
            .ok_or_else(|| StoreError::NotFound(format!("loan {}", loan.id)))?;

        if stored.status != expected_status || stored.version != loan.version {
            return Ok(None);
        }

        loan.version += 1;
        loan.updated_at = Utc::now();
        *stored = loan.clone();
        Ok(Some(loan))
    }

    async fn append_transaction(&self, transaction: Transaction) -> StoreResult<()> {
        match self.transactions.entry(transaction.id) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "transaction {}",
                transaction.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(transaction);
                Ok(())
            }
        }
    }

    async fn transaction(&self, id: &TransactionId) -> StoreResult<Option<Transaction>> {
        Ok(self.transactions.get(id).map(|t| t.value().clone()))
    }

    async fn transactions_for_loan(&self, loan_id: &LoanId) -> StoreResult<Vec<Transaction>> {
        let mut entries: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| &t.loan_id == loan_id)
            .map(|t| t.value().clone())
            .collect();
        // v7 ids are time-ordered, so they break created_at ties
        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        Ok(entries)
    }

    async fn resolve_transaction(
        &self,
        id: &TransactionId,
        expected: TransactionStatus,
        new: TransactionStatus,
        receipt_number: Option<String>,
    ) -> StoreResult<bool> {
        let mut stored = self
            .transactions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("transaction {id}")))?;

        if stored.status != expected {
            return Ok(false);
        }

        stored.status = new;
        if receipt_number.is_some() {
            stored.receipt_number = receipt_number;
        }
        stored.updated_at = Utc::now();
        Ok(true)
    }

    async fn open_payment(
        &self,
        transaction: Transaction,
        intent: PaymentIntent,
    ) -> StoreResult<()> {
        let Entry::Vacant(intent_slot) = self.intents.entry(intent.provider_reference.clone())
        else {
            return Err(StoreError::Conflict(format!(
                "payment intent {}",
                intent.provider_reference
            )));
        };
        let Entry::Vacant(transaction_slot) = self.transactions.entry(transaction.id) else {
            return Err(StoreError::Conflict(format!(
                "transaction {}",
                transaction.id
            )));
        };
        transaction_slot.insert(transaction);
        intent_slot.insert(intent);
        Ok(())
    }

    async fn intent(&self, provider_reference: &str) -> StoreResult<Option<PaymentIntent>> {
        Ok(self
            .intents
            .get(provider_reference)
            .map(|i| i.value().clone()))
    }

    async fn intent_for_loan(&self, loan_id: &LoanId) -> StoreResult<Option<PaymentIntent>> {
        Ok(self
            .intents
            .iter()
            .find(|i| &i.loan_id == loan_id)
            .map(|i| i.value().clone()))
    }

    async fn remove_intent(
        &self,
        provider_reference: &str,
    ) -> StoreResult<Option<PaymentIntent>> {
        Ok(self
            .intents
            .remove(provider_reference)
            .map(|(_, intent)| intent))
    }

    async fn record_payment(&self, payment: Payment) -> StoreResult<()> {
        self.payments
            .entry(payment.loan_id.clone())
            .or_default()
            .push(payment);
        Ok(())
    }

    async fn payments_for_loan(&self, loan_id: &LoanId) -> StoreResult<Vec<Payment>> {
        Ok(self
            .payments
            .get(loan_id)
            .map(|p| p.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{NewBorrower, NewLoanApplication, PaymentKind, TransactionType};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn loan(id: &str) -> Loan {
        Loan::new(NewLoanApplication {
            id: Some(LoanId::new(id)),
            borrower_id: BorrowerId::new("b-1"),
            amount: dec!(5000),
            duration_days: 30,
            interest_rate: dec!(12),
        })
    }

    fn borrower() -> Borrower {
        Borrower::new(NewBorrower {
            id: Some(BorrowerId::new("b-1")),
            name: "Achieng".into(),
            phone_number: "0712345678".into(),
            credit_score: Some(700),
            defaulted_loans: 0,
        })
    }

    #[tokio::test]
    async fn test_insert_conflicts_on_duplicate_key() {
        let store = MemoryStore::new();
        store.insert_loan(loan("L1")).await.unwrap();
        let err = store.insert_loan(loan("L1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        store.insert_borrower(borrower()).await.unwrap();
        assert!(store.insert_borrower(borrower()).await.is_err());
    }

    #[tokio::test]
    async fn test_update_loan_if_bumps_version() {
        let store = MemoryStore::new();
        store.insert_loan(loan("L1")).await.unwrap();

        let mut current = store.loan(&LoanId::new("L1")).await.unwrap().unwrap();
        current.status = LoanStatus::Approved;
        let committed = store
            .update_loan_if(current.clone(), LoanStatus::Pending)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(committed.version, 1);

        // Same stale copy loses the second time around
        let stale = store
            .update_loan_if(current, LoanStatus::Pending)
            .await
            .unwrap();
        assert!(stale.is_none());
    }

    #[tokio::test]
    async fn test_update_loan_if_missing_loan() {
        let store = MemoryStore::new();
        let err = store
            .update_loan_if(loan("nope"), LoanStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_update_has_single_winner() {
        let store = Arc::new(MemoryStore::new());
        store.insert_loan(loan("L1")).await.unwrap();
        let snapshot = store.loan(&LoanId::new("L1")).await.unwrap().unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            let mut candidate = snapshot.clone();
            candidate.status = if i % 2 == 0 {
                LoanStatus::Approved
            } else {
                LoanStatus::Rejected
            };
            handles.push(tokio::spawn(async move {
                store
                    .update_loan_if(candidate, LoanStatus::Pending)
                    .await
                    .unwrap()
                    .is_some()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_resolve_transaction_only_once() {
        let store = MemoryStore::new();
        let l = loan("L1");
        let tx = Transaction::new(
            TransactionType::LoanRepayment,
            &l,
            dec!(1000),
            TransactionStatus::Processing,
        );
        let id = tx.id;
        store.append_transaction(tx).await.unwrap();

        let first = store
            .resolve_transaction(
                &id,
                TransactionStatus::Processing,
                TransactionStatus::Completed,
                Some("QK123".into()),
            )
            .await
            .unwrap();
        let second = store
            .resolve_transaction(
                &id,
                TransactionStatus::Processing,
                TransactionStatus::Failed,
                None,
            )
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        let stored = store.transaction(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Completed);
        assert_eq!(stored.receipt_number.as_deref(), Some("QK123"));
    }

    fn collection(l: &Loan, reference: &str) -> (Transaction, PaymentIntent) {
        let tx = Transaction::new(
            TransactionType::LoanRepayment,
            l,
            dec!(500),
            TransactionStatus::Processing,
        )
        .with_reference(reference.to_string());
        let intent = PaymentIntent {
            provider_reference: reference.into(),
            transaction_id: tx.id,
            loan_id: l.id.clone(),
            kind: PaymentKind::Collection,
            amount: dec!(500),
            created_at: Utc::now(),
        };
        (tx, intent)
    }

    #[tokio::test]
    async fn test_intent_lifecycle() {
        let store = MemoryStore::new();
        let l = loan("L1");
        let (tx, intent) = collection(&l, "ws_CO_1");
        store.open_payment(tx.clone(), intent.clone()).await.unwrap();

        assert_eq!(store.intent("ws_CO_1").await.unwrap(), Some(intent.clone()));
        assert_eq!(store.intent_for_loan(&l.id).await.unwrap(), Some(intent));
        assert_eq!(store.transaction(&tx.id).await.unwrap(), Some(tx));
        assert_eq!(store.intent_for_loan(&LoanId::new("L2")).await.unwrap(), None);

        assert!(store.remove_intent("ws_CO_1").await.unwrap().is_some());
        assert!(store.remove_intent("ws_CO_1").await.unwrap().is_none());
        assert_eq!(store.intent_for_loan(&l.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_payment_conflict_writes_nothing() {
        let store = MemoryStore::new();
        let l = loan("L1");
        let (first_tx, first_intent) = collection(&l, "ws_CO_1");
        store.open_payment(first_tx, first_intent).await.unwrap();

        // Reused provider reference
        let (tx, intent) = collection(&l, "ws_CO_1");
        let err = store.open_payment(tx.clone(), intent).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.transaction(&tx.id).await.unwrap().is_none());

        // Reused transaction id
        let (tx, mut intent) = collection(&l, "ws_CO_2");
        store.append_transaction(tx.clone()).await.unwrap();
        intent.transaction_id = tx.id;
        assert!(store.open_payment(tx, intent).await.is_err());
        assert!(store.intent("ws_CO_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_adjust_borrower_totals() {
        let store = MemoryStore::new();
        store.insert_borrower(borrower()).await.unwrap();
        let updated = store
            .adjust_borrower_totals(&BorrowerId::new("b-1"), dec!(5000), dec!(5049))
            .await
            .unwrap();
        assert_eq!(updated.total_borrowed, dec!(5000));
        assert_eq!(updated.total_repaid, dec!(5049));

        let missing = store
            .adjust_borrower_totals(&BorrowerId::new("ghost"), dec!(1), dec!(1))
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_transactions_for_loan_filters_and_orders() {
        let store = MemoryStore::new();
        let a = loan("A");
        let b = loan("B");
        for l in [&a, &b, &a] {
            store
                .append_transaction(Transaction::new(
                    TransactionType::LoanApproval,
                    l,
                    l.amount,
                    TransactionStatus::Approved,
                ))
                .await
                .unwrap();
        }
        let entries = store.transactions_for_loan(&a.id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].created_at <= entries[1].created_at);
    }
}
