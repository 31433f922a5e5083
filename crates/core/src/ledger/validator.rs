//! Structural validation of the double-entry invariants.

use std::collections::HashSet;

use rust_decimal::Decimal;

use super::entry::EntryType;
use super::transaction::Transaction;
use crate::validation::{RuleDescriptor, Severity, ValidationResult, Validator};

/// A transaction must have at least two entries.
pub const CODE_INSUFFICIENT_ENTRIES: &str = "INSUFFICIENT_ENTRIES";
/// An entry amount was zero or negative.
pub const CODE_INVALID_AMOUNT: &str = "INVALID_AMOUNT";
/// Entries span more than one currency.
pub const CODE_MIXED_CURRENCIES: &str = "MIXED_CURRENCIES";
/// An account appears in more than one entry.
pub const CODE_DUPLICATE_ACCOUNT: &str = "DUPLICATE_ACCOUNT";
/// Total debits do not equal total credits.
pub const CODE_UNBALANCED: &str = "UNBALANCED";
/// The transaction description is empty (warning only).
pub const CODE_MISSING_DESCRIPTION: &str = "MISSING_DESCRIPTION";

/// Enforces the structural invariants every transaction must satisfy
/// before posting: entry count, positive amounts, single currency, unique
/// accounts, and balance.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionValidator;

impl TransactionValidator {
    /// Creates the validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Validator<Transaction> for TransactionValidator {
    fn validate(&self, tx: &Transaction) -> Vec<ValidationResult> {
        let mut results = Vec::new();

        if tx.entries.len() < 2 {
            results.push(ValidationResult::error(
                CODE_INSUFFICIENT_ENTRIES,
                "Transaction must have at least two entries",
            ));
        }

        if tx.description.trim().is_empty() {
            results.push(ValidationResult::warning(
                CODE_MISSING_DESCRIPTION,
                "Transaction description is empty",
            ));
        }

        let currency = tx.currency().cloned();
        let mut seen_accounts = HashSet::new();
        let mut total_debits = Decimal::ZERO;
        let mut total_credits = Decimal::ZERO;

        for (index, entry) in tx.entries.iter().enumerate() {
            if entry.amount.is_zero() {
                results.push(
                    ValidationResult::error(CODE_INVALID_AMOUNT, "Entry amount cannot be zero")
                        .with_field(format!("entries[{index}].amount")),
                );
            } else if entry.amount.is_negative() {
                results.push(
                    ValidationResult::error(CODE_INVALID_AMOUNT, "Entry amount cannot be negative")
                        .with_field(format!("entries[{index}].amount")),
                );
            }

            if let Some(currency) = &currency {
                if &entry.amount.currency != currency {
                    results.push(
                        ValidationResult::error(
                            CODE_MIXED_CURRENCIES,
                            "All entries must use the same currency",
                        )
                        .with_field(format!("entries[{index}].amount.currency")),
                    );
                    // Totals are only meaningful within one currency.
                    continue;
                }
            }

            if !seen_accounts.insert(entry.account_id.clone()) {
                results.push(
                    ValidationResult::error(
                        CODE_DUPLICATE_ACCOUNT,
                        "Account used multiple times in transaction",
                    )
                    .with_field(format!("entries[{index}].account_id")),
                );
            }

            match entry.entry_type {
                EntryType::Debit => total_debits += entry.amount.amount,
                EntryType::Credit => total_credits += entry.amount.amount,
            }
        }

        if total_debits != total_credits {
            results.push(
                ValidationResult::error(CODE_UNBALANCED, "Total debits must equal total credits")
                    .with_metadata("total_debits", total_debits.to_string())
                    .with_metadata("total_credits", total_credits.to_string()),
            );
        }

        results
    }

    fn rules(&self) -> Vec<RuleDescriptor> {
        vec![
            RuleDescriptor {
                id: CODE_INSUFFICIENT_ENTRIES.to_string(),
                description: "Transaction must have at least two entries".to_string(),
                severity: Severity::Error,
                category: "structure".to_string(),
            },
            RuleDescriptor {
                id: CODE_INVALID_AMOUNT.to_string(),
                description: "Entry amounts must be positive".to_string(),
                severity: Severity::Error,
                category: "amounts".to_string(),
            },
            RuleDescriptor {
                id: CODE_MIXED_CURRENCIES.to_string(),
                description: "All entries must use the same currency".to_string(),
                severity: Severity::Error,
                category: "amounts".to_string(),
            },
            RuleDescriptor {
                id: CODE_DUPLICATE_ACCOUNT.to_string(),
                description: "No account may appear in more than one entry".to_string(),
                severity: Severity::Error,
                category: "structure".to_string(),
            },
            RuleDescriptor {
                id: CODE_UNBALANCED.to_string(),
                description: "Total debits must equal total credits".to_string(),
                severity: Severity::Error,
                category: "balance".to_string(),
            },
            RuleDescriptor {
                id: CODE_MISSING_DESCRIPTION.to_string(),
                description: "Transactions should carry a description".to_string(),
                severity: Severity::Warning,
                category: "structure".to_string(),
            },
        ]
    }

    fn priority(&self) -> i32 {
        // Structural checks run before any registered business validators.
        -100
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::Entry;
    use chrono::Utc;
    use ledgerkit_shared::{Currency, Money};
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::usd())
    }

    fn eur(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::new("EUR").unwrap())
    }

    fn tx(entries: Vec<Entry>) -> Transaction {
        Transaction::journal("T1", Utc::now(), "test", "user-1", entries)
    }

    fn codes(results: &[ValidationResult]) -> Vec<&str> {
        results.iter().map(|r| r.code.as_str()).collect()
    }

    #[test]
    fn test_balanced_transaction_passes() {
        let results = TransactionValidator.validate(&tx(vec![
            Entry::debit("a", usd(dec!(100.00))),
            Entry::credit("b", usd(dec!(100.00))),
        ]));
        assert!(results.is_empty());
    }

    #[test]
    fn test_insufficient_entries() {
        let results = TransactionValidator.validate(&tx(vec![Entry::debit("a", usd(dec!(100)))]));
        assert!(codes(&results).contains(&CODE_INSUFFICIENT_ENTRIES));
    }

    #[test]
    fn test_zero_amount() {
        let results = TransactionValidator.validate(&tx(vec![
            Entry::debit("a", usd(dec!(0))),
            Entry::credit("b", usd(dec!(0))),
        ]));
        assert!(codes(&results).contains(&CODE_INVALID_AMOUNT));
        let field = results
            .iter()
            .find(|r| r.code == CODE_INVALID_AMOUNT)
            .and_then(|r| r.field.as_deref());
        assert_eq!(field, Some("entries[0].amount"));
    }

    #[test]
    fn test_negative_amount() {
        let results = TransactionValidator.validate(&tx(vec![
            Entry::debit("a", usd(dec!(-10))),
            Entry::credit("b", usd(dec!(-10))),
        ]));
        assert!(codes(&results).contains(&CODE_INVALID_AMOUNT));
    }

    #[test]
    fn test_mixed_currencies() {
        let results = TransactionValidator.validate(&tx(vec![
            Entry::debit("a", usd(dec!(100))),
            Entry::credit("b", eur(dec!(100))),
        ]));
        assert!(codes(&results).contains(&CODE_MIXED_CURRENCIES));
    }

    #[test]
    fn test_duplicate_account() {
        let results = TransactionValidator.validate(&tx(vec![
            Entry::debit("a", usd(dec!(100))),
            Entry::credit("a", usd(dec!(100))),
        ]));
        assert!(codes(&results).contains(&CODE_DUPLICATE_ACCOUNT));
    }

    #[test]
    fn test_unbalanced() {
        let results = TransactionValidator.validate(&tx(vec![
            Entry::debit("a", usd(dec!(100.00))),
            Entry::credit("b", usd(dec!(99.99))),
        ]));
        let unbalanced = results
            .iter()
            .find(|r| r.code == CODE_UNBALANCED)
            .expect("unbalanced finding");
        assert_eq!(unbalanced.metadata["total_debits"], "100.00");
        assert_eq!(unbalanced.metadata["total_credits"], "99.99");
    }

    #[test]
    fn test_missing_description_is_warning_only() {
        let mut transaction = tx(vec![
            Entry::debit("a", usd(dec!(100))),
            Entry::credit("b", usd(dec!(100))),
        ]);
        transaction.description = String::new();

        let results = TransactionValidator.validate(&transaction);
        assert_eq!(codes(&results), vec![CODE_MISSING_DESCRIPTION]);
        assert!(results.iter().all(|r| !r.is_error()));
    }

    #[test]
    fn test_multi_entry_balance() {
        // One debit split across two credits still balances.
        let results = TransactionValidator.validate(&tx(vec![
            Entry::debit("a", usd(dec!(100))),
            Entry::credit("b", usd(dec!(60))),
            Entry::credit("c", usd(dec!(40))),
        ]));
        assert!(results.is_empty());
    }

    #[test]
    fn test_all_violations_reported_together() {
        let results = TransactionValidator.validate(&tx(vec![
            Entry::debit("a", usd(dec!(0))),
            Entry::credit("a", usd(dec!(50))),
        ]));
        let found = codes(&results);
        assert!(found.contains(&CODE_INVALID_AMOUNT));
        assert!(found.contains(&CODE_DUPLICATE_ACCOUNT));
        assert!(found.contains(&CODE_UNBALANCED));
    }
}
