//! In-process collaborators for ledger and reconciler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use forwardsflow_shared::types::{BorrowerId, LoanId, TransactionId};
use rust_decimal::Decimal;

use crate::ledger::types::{NewBorrower, NewLoanApplication};
use crate::ledger::{
    Borrower, Loan, LoanLedger, LoanStatus, Payment, PaymentIntent, Transaction,
    TransactionStatus,
};
use crate::notify::{
    Channel, Notification, NotificationDispatcher, NotificationError, NotificationTemplate,
    Notifier,
};
use crate::payment::{
    CollectionRequest, DisbursementRequest, GatewayError, PaymentAck, PaymentGateway,
};
use crate::store::{LoanStore, MemoryStore, StoreError, StoreResult};

/// Gateway that acknowledges every request with a sequential reference,
/// unless a failure has been queued.
#[derive(Default)]
pub struct FakeGateway {
    counter: AtomicUsize,
    fail_next: Mutex<Option<GatewayError>>,
    pub disbursements: Mutex<Vec<DisbursementRequest>>,
    pub collections: Mutex<Vec<CollectionRequest>>,
}

impl FakeGateway {
    pub fn fail_next(&self, error: GatewayError) {
        *self.fail_next.lock().unwrap() = Some(error);
    }

    fn ack(&self, prefix: &str) -> Result<PaymentAck, GatewayError> {
        if let Some(error) = self.fail_next.lock().unwrap().take() {
            return Err(error);
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PaymentAck {
            provider_reference: format!("{prefix}{n}"),
            description: "Accept the service request successfully.".to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn disburse(&self, request: DisbursementRequest) -> Result<PaymentAck, GatewayError> {
        self.disbursements.lock().unwrap().push(request);
        self.ack("AG_")
    }

    async fn collect(&self, request: CollectionRequest) -> Result<PaymentAck, GatewayError> {
        self.collections.lock().unwrap().push(request);
        self.ack("ws_CO_")
    }
}

/// Notifier that keeps every message it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn templates(&self) -> Vec<NotificationTemplate> {
        self.sent.lock().unwrap().iter().map(|n| n.template).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// [`MemoryStore`] that fails a queued number of writes with `Unavailable`.
#[derive(Default)]
pub struct FaultyStore {
    inner: Arc<MemoryStore>,
    settlement_commits: AtomicUsize,
    appends: AtomicUsize,
    payment_records: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fails the next `n` updates of a loan in a `*_PROCESSING` status.
    pub fn fail_settlement_commits(&self, n: usize) {
        self.settlement_commits.store(n, Ordering::SeqCst);
    }

    /// Fails the next `n` transaction log appends.
    pub fn fail_appends(&self, n: usize) {
        self.appends.store(n, Ordering::SeqCst);
    }

    /// Fails the next `n` payment records (transaction plus intent).
    pub fn fail_payment_records(&self, n: usize) {
        self.payment_records.store(n, Ordering::SeqCst);
    }

    fn trip(counter: &AtomicUsize) -> StoreResult<()> {
        let tripped = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            Err(StoreError::Unavailable("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LoanStore for FaultyStore {
    async fn insert_borrower(&self, borrower: Borrower) -> StoreResult<()> {
        self.inner.insert_borrower(borrower).await
    }

    async fn borrower(&self, id: &BorrowerId) -> StoreResult<Option<Borrower>> {
        self.inner.borrower(id).await
    }

    async fn adjust_borrower_totals(
        &self,
        id: &BorrowerId,
        borrowed: Decimal,
        repaid: Decimal,
    ) -> StoreResult<Borrower> {
        self.inner.adjust_borrower_totals(id, borrowed, repaid).await
    }

    async fn insert_loan(&self, loan: Loan) -> StoreResult<()> {
        self.inner.insert_loan(loan).await
    }

    async fn loan(&self, id: &LoanId) -> StoreResult<Option<Loan>> {
        self.inner.loan(id).await
    }

    async fn update_loan_if(
        &self,
        loan: Loan,
        expected_status: LoanStatus,
    ) -> StoreResult<Option<Loan>> {
        if expected_status.is_processing() {
            Self::trip(&self.settlement_commits)?;
        }
        self.inner.update_loan_if(loan, expected_status).await
    }

    async fn append_transaction(&self, transaction: Transaction) -> StoreResult<()> {
        Self::trip(&self.appends)?;
        self.inner.append_transaction(transaction).await
    }

    async fn transaction(&self, id: &TransactionId) -> StoreResult<Option<Transaction>> {
        self.inner.transaction(id).await
    }

    async fn transactions_for_loan(&self, loan_id: &LoanId) -> StoreResult<Vec<Transaction>> {
        self.inner.transactions_for_loan(loan_id).await
    }

    async fn resolve_transaction(
        &self,
        id: &TransactionId,
        expected: TransactionStatus,
        new: TransactionStatus,
        receipt_number: Option<String>,
    ) -> StoreResult<bool> {
        self.inner
            .resolve_transaction(id, expected, new, receipt_number)
            .await
    }

    async fn open_payment(
        &self,
        transaction: Transaction,
        intent: PaymentIntent,
    ) -> StoreResult<()> {
        Self::trip(&self.payment_records)?;
        self.inner.open_payment(transaction, intent).await
    }

    async fn intent(&self, provider_reference: &str) -> StoreResult<Option<PaymentIntent>> {
        self.inner.intent(provider_reference).await
    }

    async fn intent_for_loan(&self, loan_id: &LoanId) -> StoreResult<Option<PaymentIntent>> {
        self.inner.intent_for_loan(loan_id).await
    }

    async fn remove_intent(
        &self,
        provider_reference: &str,
    ) -> StoreResult<Option<PaymentIntent>> {
        self.inner.remove_intent(provider_reference).await
    }

    async fn record_payment(&self, payment: Payment) -> StoreResult<()> {
        self.inner.record_payment(payment).await
    }

    async fn payments_for_loan(&self, loan_id: &LoanId) -> StoreResult<Vec<Payment>> {
        self.inner.payments_for_loan(loan_id).await
    }
}

/// A ledger wired to in-memory collaborators.
pub struct Harness {
    pub ledger: LoanLedger,
    pub store: Arc<MemoryStore>,
    pub faults: Arc<FaultyStore>,
    pub gateway: Arc<FakeGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let faults = Arc::new(FaultyStore::new(store.clone()));
        let gateway = Arc::new(FakeGateway::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let ledger = LoanLedger::new(
            faults.clone(),
            gateway.clone(),
            NotificationDispatcher::new(notifier.clone(), Channel::WhatsApp),
        );
        Self {
            ledger,
            store,
            faults,
            gateway,
            notifier,
        }
    }

    /// Registers borrower `b-1` with the given history.
    pub async fn borrower(&self, credit_score: Option<u16>, defaulted_loans: u32) -> BorrowerId {
        self.ledger
            .register_borrower(NewBorrower {
                id: Some(BorrowerId::new("b-1")),
                name: "Njeri Kamau".to_string(),
                phone_number: "0712345678".to_string(),
                credit_score,
                defaulted_loans,
            })
            .await
            .unwrap()
            .id
    }

    /// Submits loan `id` for borrower `b-1` at 12% APR over 30 days.
    pub async fn loan(&self, id: &str, amount: Decimal) -> Loan {
        self.ledger
            .submit_application(NewLoanApplication {
                id: Some(LoanId::new(id)),
                borrower_id: BorrowerId::new("b-1"),
                amount,
                duration_days: 30,
                interest_rate: Decimal::from(12),
            })
            .await
            .unwrap()
    }

    /// Lets spawned notification tasks run.
    pub async fn drain(&self) {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }
}
