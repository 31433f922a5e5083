//! Transaction processing: posting, batch posting, voiding, reversal.

use std::sync::Arc;

use chrono::Utc;
use ledgerkit_shared::{AccountId, Cancellation, Money, TransactionId};
use serde_json::Value;

use super::entry::{Entry, EntryType};
use super::error::LedgerError;
use super::transaction::{Transaction, TransactionStatus, TransactionType};
use super::types::TransactionSummary;
use super::validator::{TransactionValidator, CODE_INSUFFICIENT_ENTRIES};
use crate::event::{
    BalanceUpdateEvent, Event, EventBus, TransactionStatusEvent, ValidationEvent,
    ACCOUNT_BALANCE_UPDATED, TRANSACTION_CREATED, TRANSACTION_FAILED, TRANSACTION_PENDING,
    TRANSACTION_POSTED, TRANSACTION_VALIDATED, TRANSACTION_VOIDED,
};
use crate::store::{Repository, StoreError};
use crate::validation::{ValidationEngine, ValidationFailed, ValidationResult};

/// Source recorded on events published by the processor.
const SOURCE: &str = "transaction-processor";

/// Handles the lifecycle of financial transactions.
///
/// Validation runs through the engine (the structural validator is always
/// registered; callers may add their own), writes go through the store, and
/// lifecycle events are published on the bus.
pub struct TransactionProcessor<R: Repository> {
    store: Arc<R>,
    bus: Arc<EventBus>,
    validators: ValidationEngine<Transaction>,
}

impl<R: Repository> TransactionProcessor<R> {
    /// Creates a processor with the structural validator registered.
    #[must_use]
    pub fn new(store: Arc<R>, bus: Arc<EventBus>) -> Self {
        let validators = ValidationEngine::new();
        validators.register(Arc::new(TransactionValidator::new()));
        Self {
            store,
            bus,
            validators,
        }
    }

    /// The validation engine, for registering additional validators.
    #[must_use]
    pub fn validators(&self) -> &ValidationEngine<Transaction> {
        &self.validators
    }

    /// Validates a transaction and publishes `transaction.validated`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Validation` carrying every finding when any
    /// has error severity. Never mutates persistent state.
    pub fn validate_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<Vec<ValidationResult>, LedgerError> {
        match self.validators.validate(tx) {
            Ok(results) => {
                self.publish_payload(
                    TRANSACTION_VALIDATED,
                    &ValidationEvent {
                        transaction_id: tx.id.clone(),
                        valid: true,
                        errors: Vec::new(),
                        warnings: results.iter().map(|r| r.message.clone()).collect(),
                    },
                );
                Ok(results)
            }
            Err(failed) => {
                self.publish_payload(
                    TRANSACTION_VALIDATED,
                    &ValidationEvent {
                        transaction_id: tx.id.clone(),
                        valid: false,
                        errors: failed.errors().iter().map(|r| r.message.clone()).collect(),
                        warnings: failed.warnings().iter().map(|r| r.message.clone()).collect(),
                    },
                );
                Err(LedgerError::Validation {
                    id: tx.id.clone(),
                    source: failed,
                })
            }
        }
    }

    /// Persists a new draft transaction and publishes `transaction.created`.
    ///
    /// # Errors
    ///
    /// Surfaces store failures (`DUPLICATE_ID`, `INVALID_ID`).
    pub fn create_transaction(
        &self,
        tx: &mut Transaction,
        cancel: &Cancellation,
    ) -> Result<(), LedgerError> {
        self.check_cancelled("create_transaction", cancel)?;
        let actor = tx.created_by.clone();
        self.store.create(tx, &actor)?;
        let snapshot = serde_json::to_value(&*tx).unwrap_or(Value::Null);
        self.bus.publish(&Event::new(TRANSACTION_CREATED, SOURCE, snapshot));
        Ok(())
    }

    /// Moves a draft to Pending and publishes `transaction.pending`.
    ///
    /// # Errors
    ///
    /// `INVALID_STATUS` unless the transaction is a Draft.
    pub fn submit_transaction(
        &self,
        tx: &mut Transaction,
        cancel: &Cancellation,
    ) -> Result<(), LedgerError> {
        self.check_cancelled("submit_transaction", cancel)?;
        if tx.status != TransactionStatus::Draft {
            return Err(LedgerError::InvalidStatus {
                id: tx.id.clone(),
                status: tx.status,
            });
        }

        let prior_modified = tx.last_modified;
        tx.status = TransactionStatus::Pending;
        tx.last_modified = Utc::now();
        if let Err(error) = self.persist(tx) {
            tx.status = TransactionStatus::Draft;
            tx.last_modified = prior_modified;
            return Err(error.into());
        }

        self.publish_payload(
            TRANSACTION_PENDING,
            &TransactionStatusEvent {
                transaction_id: tx.id.clone(),
                old_status: TransactionStatus::Draft,
                new_status: TransactionStatus::Pending,
                reason: None,
            },
        );
        Ok(())
    }

    /// Validates and posts a single transaction.
    ///
    /// On success the transaction is Posted with `posted_at` set and the
    /// write is committed; `transaction.posted` and per-account
    /// `account.balance.updated` events follow. On any failure the caller's
    /// object is left in its prior state, so a retry is safe.
    ///
    /// # Errors
    ///
    /// `VALIDATION_FAILED` (non-retryable), `INVALID_STATUS`, or a store
    /// failure; only `OPTIMISTIC_LOCK` warrants a retry of the cycle.
    pub fn process_transaction(
        &self,
        tx: &mut Transaction,
        cancel: &Cancellation,
    ) -> Result<(), LedgerError> {
        self.check_cancelled("process_transaction", cancel)?;

        if let Err(error) = self.validate_transaction(tx) {
            self.publish_failure(tx, &error);
            return Err(error);
        }

        if !tx.status.can_post() {
            let error = LedgerError::InvalidStatus {
                id: tx.id.clone(),
                status: tx.status,
            };
            self.publish_failure(tx, &error);
            return Err(error);
        }

        let prior_status = tx.status;
        let prior_posted_at = tx.posted_at;
        let prior_modified = tx.last_modified;

        let now = Utc::now();
        tx.status = TransactionStatus::Posted;
        tx.posted_at = Some(now);
        tx.last_modified = now;

        if let Err(store_error) = self.persist(tx) {
            tx.status = prior_status;
            tx.posted_at = prior_posted_at;
            tx.last_modified = prior_modified;
            let error = LedgerError::from(store_error);
            self.publish_failure(tx, &error);
            return Err(error);
        }

        self.publish_posted(tx, prior_status);
        Ok(())
    }

    /// Posts a batch of transactions with best-effort compensation.
    ///
    /// Phase 1 validates every transaction and checks its status; any
    /// failure aborts before a single write. Phase 2 posts in caller order;
    /// if a write fails, every already-posted element is compensated back
    /// to Draft with a cleared `posted_at` (compensation failures are
    /// logged and swallowed) and the original error is surfaced. Lifecycle
    /// events are only published once the whole batch has committed.
    ///
    /// # Errors
    ///
    /// The first validation, status, store, or cancellation failure.
    pub fn process_batch(
        &self,
        txs: &mut [Transaction],
        cancel: &Cancellation,
    ) -> Result<(), LedgerError> {
        if txs.is_empty() {
            return Ok(());
        }

        // Phase 1: nothing is written until every element passes.
        for tx in txs.iter() {
            self.check_cancelled("process_batch", cancel)?;
            self.validators
                .validate(tx)
                .map_err(|failed: ValidationFailed| LedgerError::Validation {
                    id: tx.id.clone(),
                    source: failed,
                })?;
            if !tx.status.can_post() {
                return Err(LedgerError::InvalidStatus {
                    id: tx.id.clone(),
                    status: tx.status,
                });
            }
        }

        // Phase 2: post in caller-supplied order.
        let now = Utc::now();
        let mut prior_statuses = Vec::with_capacity(txs.len());
        for index in 0..txs.len() {
            if cancel.is_cancelled() {
                self.rollback_batch(txs, index);
                return Err(LedgerError::Cancelled {
                    operation: "process_batch",
                });
            }

            let tx = &mut txs[index];
            let prior = (tx.status, tx.posted_at, tx.last_modified);
            prior_statuses.push(tx.status);
            tx.status = TransactionStatus::Posted;
            tx.posted_at = Some(now);
            tx.last_modified = now;

            if let Err(store_error) = self.persist(tx) {
                tx.status = prior.0;
                tx.posted_at = prior.1;
                tx.last_modified = prior.2;
                self.rollback_batch(txs, index);
                let error = LedgerError::from(store_error);
                self.publish_failure(&txs[index], &error);
                return Err(error);
            }
        }

        // The batch committed: only now do posted events go out, so a
        // rolled-back batch never leaks a transaction.posted.
        for (tx, prior_status) in txs.iter().zip(prior_statuses) {
            self.publish_posted(tx, prior_status);
        }
        Ok(())
    }

    /// Voids a posted transaction.
    ///
    /// # Errors
    ///
    /// `ALREADY_VOIDED` on a second void, `CANNOT_VOID_NON_POSTED` for any
    /// non-posted status.
    pub fn void_transaction(
        &self,
        id: &TransactionId,
        reason: &str,
        cancel: &Cancellation,
    ) -> Result<Transaction, LedgerError> {
        self.check_cancelled("void_transaction", cancel)?;
        let mut tx: Transaction = self.store.read(id.as_str())?;

        if tx.status == TransactionStatus::Voided || tx.voided_at.is_some() {
            return Err(LedgerError::AlreadyVoided(tx.id));
        }
        if tx.status != TransactionStatus::Posted {
            return Err(LedgerError::CannotVoidNonPosted {
                id: tx.id,
                status: tx.status,
            });
        }

        let old_status = tx.status;
        let now = Utc::now();
        tx.status = TransactionStatus::Voided;
        tx.voided_at = Some(now);
        tx.void_reason = Some(reason.to_string());
        tx.last_modified = now;
        self.persist(&mut tx)?;

        self.publish_payload(
            TRANSACTION_VOIDED,
            &TransactionStatusEvent {
                transaction_id: tx.id.clone(),
                old_status,
                new_status: TransactionStatus::Voided,
                reason: Some(reason.to_string()),
            },
        );
        Ok(tx)
    }

    /// Reverses a posted transaction by posting a new Reversal transaction
    /// with swapped debit/credit sides, then annotating the original.
    ///
    /// The original is only stamped with `reversed_at`/`reversal_id` after
    /// the reversal has successfully posted; a reversal that fails leaves
    /// the original untouched.
    ///
    /// # Errors
    ///
    /// `ALREADY_REVERSED` on a second reversal, `CANNOT_REVERSE_NON_POSTED`
    /// for any non-posted status, plus anything posting can raise.
    pub fn reverse_transaction(
        &self,
        id: &TransactionId,
        reason: &str,
        cancel: &Cancellation,
    ) -> Result<Transaction, LedgerError> {
        self.check_cancelled("reverse_transaction", cancel)?;
        let mut original: Transaction = self.store.read(id.as_str())?;

        if original.reversed_at.is_some() {
            return Err(LedgerError::AlreadyReversed(original.id));
        }
        if original.status != TransactionStatus::Posted {
            return Err(LedgerError::CannotReverseNonPosted {
                id: original.id,
                status: original.status,
            });
        }

        let now = Utc::now();
        let mut reversal = Transaction::new(
            original.id.reversal(),
            TransactionType::Reversal,
            now,
            format!("Reversal of {}: {}", original.id, reason),
            original.created_by.clone(),
            original.entries.iter().map(Entry::reversed).collect(),
        );
        reversal.reversed_from = Some(original.id.clone());

        self.create_transaction(&mut reversal, cancel)?;
        // A correctly swapped reversal is balanced iff the original was;
        // this re-validates regardless and posts.
        self.process_transaction(&mut reversal, cancel)?;

        original.reversed_at = Some(now);
        original.reversal_id = Some(reversal.id.clone());
        original.last_modified = now;
        self.persist(&mut original)?;

        Ok(reversal)
    }

    /// Retrieves a transaction snapshot by id.
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` if the id is unknown.
    pub fn get_transaction(&self, id: &TransactionId) -> Result<Transaction, LedgerError> {
        Ok(self.store.read(id.as_str())?)
    }

    /// Computes transaction totals. Pure computation, no I/O.
    ///
    /// # Errors
    ///
    /// `VALIDATION_FAILED` for an entry-less transaction and
    /// `MISMATCHED_CURRENCIES` when entries span currencies.
    pub fn summary(&self, tx: &Transaction) -> Result<TransactionSummary, LedgerError> {
        let Some(currency) = tx.currency().cloned() else {
            return Err(LedgerError::Validation {
                id: tx.id.clone(),
                source: ValidationFailed::new(vec![ValidationResult::error(
                    CODE_INSUFFICIENT_ENTRIES,
                    "Transaction has no entries to summarize",
                )]),
            });
        };

        let mut total_debits = Money::zero(currency.clone());
        let mut total_credits = Money::zero(currency);
        for entry in &tx.entries {
            match entry.entry_type {
                EntryType::Debit => total_debits = total_debits.add(&entry.amount)?,
                EntryType::Credit => total_credits = total_credits.add(&entry.amount)?,
            }
        }
        let net_amount = total_debits.subtract(&total_credits)?;

        let mut affected_accounts: Vec<AccountId> = tx
            .entries
            .iter()
            .map(|entry| entry.account_id.clone())
            .collect();
        affected_accounts.sort();
        affected_accounts.dedup();

        Ok(TransactionSummary {
            total_debits,
            total_credits,
            net_amount,
            entry_count: tx.entries.len(),
            affected_accounts,
        })
    }

    /// Creates or updates depending on whether the transaction has ever
    /// been persisted (version 0 = never stored).
    fn persist(&self, tx: &mut Transaction) -> Result<(), StoreError> {
        let actor = tx.created_by.clone();
        if tx.version == 0 {
            self.store.create(tx, &actor)
        } else {
            self.store.update(tx, &actor).map(|_| ())
        }
    }

    fn rollback_batch(&self, txs: &mut [Transaction], committed: usize) {
        for tx in txs[..committed].iter_mut() {
            tx.status = TransactionStatus::Draft;
            tx.posted_at = None;
            tx.last_modified = Utc::now();
            if let Err(error) = self.persist(tx) {
                tracing::warn!(
                    transaction_id = %tx.id,
                    %error,
                    "batch compensation write failed; continuing"
                );
            }
        }
    }

    fn publish_posted(&self, tx: &Transaction, old_status: TransactionStatus) {
        self.publish_payload(
            TRANSACTION_POSTED,
            &TransactionStatusEvent {
                transaction_id: tx.id.clone(),
                old_status,
                new_status: TransactionStatus::Posted,
                reason: None,
            },
        );

        let mut seen = std::collections::HashSet::new();
        for entry in &tx.entries {
            if seen.insert(&entry.account_id) {
                self.publish_payload(
                    ACCOUNT_BALANCE_UPDATED,
                    &BalanceUpdateEvent {
                        account_id: entry.account_id.clone(),
                        transaction_id: tx.id.clone(),
                    },
                );
            }
        }
    }

    fn publish_failure(&self, tx: &Transaction, error: &LedgerError) {
        self.publish_payload(
            TRANSACTION_FAILED,
            &TransactionStatusEvent {
                transaction_id: tx.id.clone(),
                old_status: tx.status,
                new_status: tx.status,
                reason: Some(error.to_string()),
            },
        );
    }

    fn publish_payload<P: serde::Serialize>(&self, event_type: &str, payload: &P) {
        let data = serde_json::to_value(payload).unwrap_or(Value::Null);
        self.bus.publish(&Event::new(event_type, SOURCE, data));
    }

    fn check_cancelled(
        &self,
        operation: &'static str,
        cancel: &Cancellation,
    ) -> Result<(), LedgerError> {
        if cancel.is_cancelled() {
            return Err(LedgerError::Cancelled { operation });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use chrono::Utc;
    use ledgerkit_shared::{Currency, Money};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::store::{AuditEntry, Entity, MemoryStore, Query, VersionInfo};

    /// Store double that fails a chosen write (by sequence number), or all
    /// writes from a point onward.
    struct FlakyStore {
        inner: MemoryStore,
        writes: AtomicU64,
        fail_from: AtomicU64,
        fail_exactly: AtomicU64,
    }

    const NEVER: u64 = u64::MAX;

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                writes: AtomicU64::new(0),
                fail_from: AtomicU64::new(NEVER),
                fail_exactly: AtomicU64::new(NEVER),
            }
        }

        fn fail_from_now_on(&self) {
            self.fail_from.store(0, Ordering::SeqCst);
        }

        /// Fails only the nth write from now (0 = the next one).
        fn fail_nth_write_from_now(&self, n: u64) {
            let current = self.writes.load(Ordering::SeqCst);
            self.fail_exactly.store(current + n, Ordering::SeqCst);
        }

        fn should_fail(&self) -> bool {
            let write = self.writes.fetch_add(1, Ordering::SeqCst);
            write >= self.fail_from.load(Ordering::SeqCst)
                || write == self.fail_exactly.load(Ordering::SeqCst)
        }

        fn write_error<T: Entity>(id: &str) -> StoreError {
            StoreError::Codec {
                kind: T::KIND,
                id: id.to_string(),
                message: "injected write failure".to_string(),
            }
        }
    }

    impl Repository for FlakyStore {
        fn create<T: Entity>(&self, entity: &mut T, actor: &str) -> Result<(), StoreError> {
            if self.should_fail() {
                return Err(Self::write_error::<T>(entity.entity_id()));
            }
            self.inner.create(entity, actor)
        }

        fn read<T: Entity>(&self, id: &str) -> Result<T, StoreError> {
            self.inner.read(id)
        }

        fn update<T: Entity>(&self, entity: &mut T, actor: &str) -> Result<u64, StoreError> {
            if self.should_fail() {
                return Err(Self::write_error::<T>(entity.entity_id()));
            }
            self.inner.update(entity, actor)
        }

        fn delete<T: Entity>(&self, id: &str, actor: &str) -> Result<(), StoreError> {
            self.inner.delete::<T>(id, actor)
        }

        fn query<T: Entity>(&self, query: &Query) -> Result<Vec<T>, StoreError> {
            self.inner.query(query)
        }

        fn count<T: Entity>(&self, query: &Query) -> Result<u64, StoreError> {
            self.inner.count::<T>(query)
        }

        fn audit_trail<T: Entity>(&self, id: &str) -> Result<Vec<AuditEntry>, StoreError> {
            self.inner.audit_trail::<T>(id)
        }

        fn version_info<T: Entity>(&self, id: &str) -> Result<VersionInfo, StoreError> {
            self.inner.version_info::<T>(id)
        }
    }

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::usd())
    }

    fn balanced_tx(id: &str, amount: Decimal) -> Transaction {
        Transaction::journal(
            id,
            Utc::now(),
            format!("journal {id}"),
            "user-1",
            vec![
                Entry::debit("acct-cash", usd(amount)),
                Entry::credit("acct-loan", usd(amount)),
            ],
        )
    }

    fn processor_with_bus() -> (TransactionProcessor<MemoryStore>, Arc<EventBus>) {
        let bus = Arc::new(EventBus::new());
        let processor = TransactionProcessor::new(Arc::new(MemoryStore::new()), Arc::clone(&bus));
        (processor, bus)
    }

    fn record_events(bus: &EventBus, event_type: &'static str) -> Arc<Mutex<Vec<Event>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        bus.subscribe(
            event_type,
            Arc::new(move |event: &Event| -> Result<(), crate::event::HandlerError> {
                sink.lock().expect("event log").push(event.clone());
                Ok(())
            }) as Arc<dyn crate::event::EventHandler>,
        );
        log
    }

    #[test]
    fn test_process_posts_and_stamps() {
        let (processor, bus) = processor_with_bus();
        let posted_events = record_events(&bus, TRANSACTION_POSTED);

        let mut tx = balanced_tx("T1", dec!(100.00));
        processor.process_transaction(&mut tx, &Cancellation::none()).unwrap();

        assert_eq!(tx.status, TransactionStatus::Posted);
        assert!(tx.posted_at.is_some());
        assert_eq!(tx.version, 1);

        let stored = processor.get_transaction(&TransactionId::new("T1")).unwrap();
        assert_eq!(stored.status, TransactionStatus::Posted);
        assert_eq!(posted_events.lock().expect("events").len(), 1);
    }

    #[test]
    fn test_process_rejects_unbalanced_and_writes_nothing() {
        let (processor, bus) = processor_with_bus();
        let failed_events = record_events(&bus, TRANSACTION_FAILED);

        let mut tx = Transaction::journal(
            "T2",
            Utc::now(),
            "unbalanced",
            "user-1",
            vec![
                Entry::debit("acct-cash", usd(dec!(100.00))),
                Entry::credit("acct-loan", usd(dec!(99.99))),
            ],
        );
        let err = processor
            .process_transaction(&mut tx, &Cancellation::none())
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        match &err {
            LedgerError::Validation { source, .. } => {
                assert!(source.errors().iter().any(|r| r.code == "UNBALANCED"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }

        // Nothing persisted, status untouched, failure event emitted.
        assert_eq!(tx.status, TransactionStatus::Draft);
        assert!(tx.posted_at.is_none());
        assert!(matches!(
            processor.get_transaction(&TransactionId::new("T2")),
            Err(LedgerError::Storage(StoreError::NotFound { .. }))
        ));
        assert_eq!(failed_events.lock().expect("events").len(), 1);
    }

    #[test]
    fn test_process_rejects_posted_status() {
        let (processor, _) = processor_with_bus();
        let mut tx = balanced_tx("T3", dec!(10));
        processor.process_transaction(&mut tx, &Cancellation::none()).unwrap();

        let err = processor
            .process_transaction(&mut tx, &Cancellation::none())
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATUS");
    }

    #[test]
    fn test_failed_store_write_resets_in_memory_state() {
        let store = Arc::new(FlakyStore::new());
        let bus = Arc::new(EventBus::new());
        let processor = TransactionProcessor::new(Arc::clone(&store), bus);

        let mut tx = balanced_tx("T4", dec!(25));
        let before = tx.clone();
        store.fail_from_now_on();

        let err = processor
            .process_transaction(&mut tx, &Cancellation::none())
            .unwrap_err();
        assert_eq!(err.error_code(), "STORAGE");

        // The caller's object is back in its prior state, so retry is safe.
        assert_eq!(tx.status, before.status);
        assert_eq!(tx.posted_at, before.posted_at);
        assert_eq!(tx.last_modified, before.last_modified);
    }

    #[test]
    fn test_batch_posts_all_or_nothing() {
        let (processor, bus) = processor_with_bus();
        let posted_events = record_events(&bus, TRANSACTION_POSTED);

        let mut batch = vec![balanced_tx("B1", dec!(10)), balanced_tx("B2", dec!(20))];
        processor.process_batch(&mut batch, &Cancellation::none()).unwrap();

        assert!(batch.iter().all(|tx| tx.status == TransactionStatus::Posted));
        assert_eq!(posted_events.lock().expect("events").len(), 2);
    }

    #[test]
    fn test_batch_aborts_before_any_write_on_invalid_status() {
        let (processor, bus) = processor_with_bus();
        let posted_events = record_events(&bus, TRANSACTION_POSTED);

        let mut already_posted = balanced_tx("B4", dec!(5));
        already_posted.status = TransactionStatus::Posted;
        let mut batch = vec![balanced_tx("B3", dec!(5)), already_posted];

        let err = processor
            .process_batch(&mut batch, &Cancellation::none())
            .unwrap_err();
        match &err {
            LedgerError::InvalidStatus { id, .. } => assert_eq!(id.as_str(), "B4"),
            other => panic!("expected invalid status, got {other:?}"),
        }

        // Phase 1 aborted: B3 was never written and no event escaped.
        assert_eq!(batch[0].status, TransactionStatus::Draft);
        assert!(matches!(
            processor.get_transaction(&TransactionId::new("B3")),
            Err(LedgerError::Storage(StoreError::NotFound { .. }))
        ));
        assert!(posted_events.lock().expect("events").is_empty());
    }

    #[test]
    fn test_void_once_then_already_voided() {
        let (processor, bus) = processor_with_bus();
        let voided_events = record_events(&bus, TRANSACTION_VOIDED);

        let mut tx = balanced_tx("T5", dec!(50));
        processor.process_transaction(&mut tx, &Cancellation::none()).unwrap();

        let id = TransactionId::new("T5");
        let voided = processor
            .void_transaction(&id, "entered in error", &Cancellation::none())
            .unwrap();
        assert_eq!(voided.status, TransactionStatus::Voided);
        assert!(voided.voided_at.is_some());
        assert_eq!(voided.void_reason.as_deref(), Some("entered in error"));

        let err = processor
            .void_transaction(&id, "again", &Cancellation::none())
            .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_VOIDED");
        assert_eq!(voided_events.lock().expect("events").len(), 1);
    }

    #[test]
    fn test_void_requires_posted() {
        let (processor, _) = processor_with_bus();
        let mut draft = balanced_tx("T6", dec!(50));
        processor
            .create_transaction(&mut draft, &Cancellation::none())
            .unwrap();

        let err = processor
            .void_transaction(&TransactionId::new("T6"), "too early", &Cancellation::none())
            .unwrap_err();
        assert_eq!(err.error_code(), "CANNOT_VOID_NON_POSTED");
    }

    #[test]
    fn test_reverse_builds_swapped_posted_reversal() {
        let (processor, _) = processor_with_bus();
        let mut tx = balanced_tx("T7", dec!(50));
        processor.process_transaction(&mut tx, &Cancellation::none()).unwrap();

        let reversal = processor
            .reverse_transaction(&TransactionId::new("T7"), "err", &Cancellation::none())
            .unwrap();

        assert_eq!(reversal.id.as_str(), "REV-T7");
        assert_eq!(reversal.transaction_type, TransactionType::Reversal);
        assert_eq!(reversal.status, TransactionStatus::Posted);
        assert_eq!(reversal.reversed_from, Some(TransactionId::new("T7")));
        assert_eq!(reversal.entries[0].entry_type, EntryType::Credit);
        assert_eq!(reversal.entries[1].entry_type, EntryType::Debit);
        assert_eq!(reversal.entries[0].amount, usd(dec!(50)));

        let original = processor.get_transaction(&TransactionId::new("T7")).unwrap();
        assert!(original.reversed_at.is_some());
        assert_eq!(original.reversal_id, Some(TransactionId::new("REV-T7")));
        assert_eq!(original.status, TransactionStatus::Posted);

        let err = processor
            .reverse_transaction(&TransactionId::new("T7"), "again", &Cancellation::none())
            .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_REVERSED");
    }

    #[test]
    fn test_reverse_requires_posted() {
        let (processor, _) = processor_with_bus();
        let mut draft = balanced_tx("T8", dec!(50));
        processor
            .create_transaction(&mut draft, &Cancellation::none())
            .unwrap();

        let err = processor
            .reverse_transaction(&TransactionId::new("T8"), "nope", &Cancellation::none())
            .unwrap_err();
        assert_eq!(err.error_code(), "CANNOT_REVERSE_NON_POSTED");
    }

    #[test]
    fn test_submit_moves_draft_to_pending() {
        let (processor, bus) = processor_with_bus();
        let pending_events = record_events(&bus, TRANSACTION_PENDING);

        let mut tx = balanced_tx("T9", dec!(10));
        processor.submit_transaction(&mut tx, &Cancellation::none()).unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(pending_events.lock().expect("events").len(), 1);

        let err = processor
            .submit_transaction(&mut tx, &Cancellation::none())
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATUS");

        // A pending transaction still posts.
        processor.process_transaction(&mut tx, &Cancellation::none()).unwrap();
        assert_eq!(tx.status, TransactionStatus::Posted);
    }

    #[test]
    fn test_summary_totals() {
        let (processor, _) = processor_with_bus();
        let tx = Transaction::journal(
            "T10",
            Utc::now(),
            "split",
            "user-1",
            vec![
                Entry::debit("acct-b", usd(dec!(100))),
                Entry::credit("acct-c", usd(dec!(60))),
                Entry::credit("acct-a", usd(dec!(40))),
            ],
        );

        let summary = processor.summary(&tx).unwrap();
        assert_eq!(summary.total_debits, usd(dec!(100)));
        assert_eq!(summary.total_credits, usd(dec!(100)));
        assert!(summary.net_amount.is_zero());
        assert_eq!(summary.entry_count, 3);
        let ids: Vec<&str> = summary
            .affected_accounts
            .iter()
            .map(AccountId::as_str)
            .collect();
        assert_eq!(ids, vec!["acct-a", "acct-b", "acct-c"]);
    }

    #[test]
    fn test_summary_of_empty_transaction_fails() {
        let (processor, _) = processor_with_bus();
        let tx = Transaction::journal("T11", Utc::now(), "empty", "user-1", vec![]);
        let err = processor.summary(&tx).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn test_cancellation_observed_before_any_work() {
        let (processor, _) = processor_with_bus();
        let cancel = Cancellation::new();
        cancel.cancel();

        let mut tx = balanced_tx("T12", dec!(10));
        let err = processor.process_transaction(&mut tx, &cancel).unwrap_err();
        assert_eq!(err.error_code(), "CANCELLED");
        assert_eq!(tx.status, TransactionStatus::Draft);
        assert!(matches!(
            processor.get_transaction(&TransactionId::new("T12")),
            Err(LedgerError::Storage(StoreError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_posted_event_carries_status_payload() {
        let (processor, bus) = processor_with_bus();
        let posted_events = record_events(&bus, TRANSACTION_POSTED);
        let balance_events = record_events(&bus, ACCOUNT_BALANCE_UPDATED);

        let mut tx = balanced_tx("T13", dec!(75));
        processor.process_transaction(&mut tx, &Cancellation::none()).unwrap();

        let events = posted_events.lock().expect("events");
        let payload: TransactionStatusEvent =
            serde_json::from_value(events[0].data.clone()).unwrap();
        assert_eq!(payload.transaction_id.as_str(), "T13");
        assert_eq!(payload.old_status, TransactionStatus::Draft);
        assert_eq!(payload.new_status, TransactionStatus::Posted);

        // One balance event per affected account.
        assert_eq!(balance_events.lock().expect("events").len(), 2);
    }

    #[test]
    fn test_batch_rollback_compensates_posted_elements() {
        let store = Arc::new(FlakyStore::new());
        let bus = Arc::new(EventBus::new());
        let posted_events = record_events(&bus, TRANSACTION_POSTED);
        let processor = TransactionProcessor::new(Arc::clone(&store), Arc::clone(&bus));

        // Seed both as drafts, then fail only the second posting write.
        let mut first = balanced_tx("B5", dec!(10));
        let mut second = balanced_tx("B6", dec!(20));
        processor.create_transaction(&mut first, &Cancellation::none()).unwrap();
        processor.create_transaction(&mut second, &Cancellation::none()).unwrap();
        store.fail_nth_write_from_now(1);

        let mut batch = vec![first, second];
        let err = processor
            .process_batch(&mut batch, &Cancellation::none())
            .unwrap_err();
        assert_eq!(err.error_code(), "STORAGE");

        // The committed element was compensated back to Draft, in memory
        // and in the store, and no posted event survived.
        assert_eq!(batch[0].status, TransactionStatus::Draft);
        assert!(batch[0].posted_at.is_none());
        assert_eq!(batch[1].status, TransactionStatus::Draft);
        assert!(batch[1].posted_at.is_none());

        let stored_first = processor.get_transaction(&TransactionId::new("B5")).unwrap();
        assert_eq!(stored_first.status, TransactionStatus::Draft);
        assert!(stored_first.posted_at.is_none());
        let stored_second = processor.get_transaction(&TransactionId::new("B6")).unwrap();
        assert_eq!(stored_second.status, TransactionStatus::Draft);

        assert!(posted_events.lock().expect("events").is_empty());
    }
}
