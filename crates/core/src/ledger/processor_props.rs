//! Property-based tests for the transaction engine.

use std::sync::Arc;

use chrono::Utc;
use ledgerkit_shared::{Cancellation, Currency, Money};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::entry::{Entry, EntryType};
use super::processor::TransactionProcessor;
use super::transaction::{Transaction, TransactionStatus};
use super::validator::TransactionValidator;
use crate::event::EventBus;
use crate::store::MemoryStore;
use crate::validation::Validator;

fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::usd())
}

/// Strategy for positive amounts between 0.01 and 10,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for balanced entry lists: each amount becomes a debit/credit
/// pair against distinct accounts.
fn balanced_entries() -> impl Strategy<Value = Vec<Entry>> {
    prop::collection::vec(positive_amount(), 1..6).prop_map(|amounts| {
        let mut entries = Vec::with_capacity(amounts.len() * 2);
        for (i, amount) in amounts.into_iter().enumerate() {
            entries.push(Entry::debit(format!("debit-{i}"), usd(amount)));
            entries.push(Entry::credit(format!("credit-{i}"), usd(amount)));
        }
        entries
    })
}

fn transaction(entries: Vec<Entry>) -> Transaction {
    Transaction::journal("TX", Utc::now(), "generated", "prop-test", entries)
}

fn processor() -> TransactionProcessor<MemoryStore> {
    TransactionProcessor::new(Arc::new(MemoryStore::new()), Arc::new(EventBus::new()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any balanced transaction with unique accounts and one currency
    /// passes structural validation.
    #[test]
    fn prop_balanced_transaction_validates(entries in balanced_entries()) {
        let results = TransactionValidator.validate(&transaction(entries));
        prop_assert!(results.iter().all(|r| !r.is_error()));
    }

    /// For every validated transaction, total debits equal total credits.
    #[test]
    fn prop_summary_net_is_zero_for_balanced(entries in balanced_entries()) {
        let tx = transaction(entries);
        let summary = processor().summary(&tx).unwrap();
        prop_assert_eq!(summary.total_debits.amount, summary.total_credits.amount);
        prop_assert!(summary.net_amount.is_zero());
    }

    /// Perturbing one amount in a balanced transaction makes it unbalanced.
    #[test]
    fn prop_perturbed_transaction_is_rejected(
        entries in balanced_entries(),
        delta in 1i64..10_000i64,
    ) {
        let mut entries = entries;
        entries[0].amount = entries[0]
            .amount
            .add(&usd(Decimal::new(delta, 2)))
            .unwrap();

        let results = TransactionValidator.validate(&transaction(entries));
        prop_assert!(results.iter().any(|r| r.code == "UNBALANCED"));
    }

    /// Swapping every entry's side preserves balance: a reversal of a
    /// balanced transaction is itself balanced.
    #[test]
    fn prop_side_swap_preserves_balance(entries in balanced_entries()) {
        let swapped: Vec<Entry> = entries.iter().map(Entry::reversed).collect();
        let results = TransactionValidator.validate(&transaction(swapped));
        prop_assert!(results.iter().all(|r| !r.is_error()));
    }

    /// Fewer than two entries is always rejected.
    #[test]
    fn prop_single_entry_rejected(amount in positive_amount()) {
        let tx = transaction(vec![Entry::debit("only", usd(amount))]);
        let results = TransactionValidator.validate(&tx);
        prop_assert!(results.iter().any(|r| r.code == "INSUFFICIENT_ENTRIES"));
    }

    /// A duplicated account is always rejected, whatever the amounts.
    #[test]
    fn prop_duplicate_account_rejected(amount in positive_amount()) {
        let tx = transaction(vec![
            Entry::debit("same", usd(amount)),
            Entry::credit("same", usd(amount)),
        ]);
        let results = TransactionValidator.validate(&tx);
        prop_assert!(results.iter().any(|r| r.code == "DUPLICATE_ACCOUNT"));
    }

    /// Posting then voiding walks the version chain 1 → 2 with no gaps.
    #[test]
    fn prop_lifecycle_versions_are_contiguous(entries in balanced_entries()) {
        let processor = processor();
        let mut tx = transaction(entries);
        processor.process_transaction(&mut tx, &Cancellation::none()).unwrap();
        prop_assert_eq!(tx.version, 1);
        prop_assert_eq!(tx.status, TransactionStatus::Posted);

        let voided = processor
            .void_transaction(&tx.id, "prop", &Cancellation::none())
            .unwrap();
        prop_assert_eq!(voided.version, 2);
    }

    /// Validation never mutates the transaction it inspects.
    #[test]
    fn prop_validation_is_pure(entries in balanced_entries()) {
        let tx = transaction(entries);
        let before = tx.clone();
        let _ = TransactionValidator.validate(&tx);
        prop_assert_eq!(tx, before);
    }
}

#[test]
fn side_swap_involution() {
    let entry = Entry::debit("a", usd(Decimal::ONE));
    assert_eq!(entry.reversed().reversed().entry_type, EntryType::Debit);
}
