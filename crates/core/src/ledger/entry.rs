//! Ledger entry domain types.

use ledgerkit_shared::{AccountId, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Type of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    /// Debit entry (increases assets/expenses, decreases liabilities/equity/revenue).
    Debit,
    /// Credit entry (decreases assets/expenses, increases liabilities/equity/revenue).
    Credit,
}

impl EntryType {
    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

/// A single entry in a transaction.
///
/// Each transaction consists of two or more entries that must balance
/// (total debits = total credits) in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// The account affected by this entry.
    pub account_id: AccountId,
    /// Entry amount; always positive.
    pub amount: Money,
    /// Whether this is a debit or credit.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Optional description for this line.
    #[serde(default)]
    pub description: String,
}

impl Entry {
    /// Creates an entry.
    #[must_use]
    pub fn new(
        account_id: impl Into<AccountId>,
        amount: Money,
        entry_type: EntryType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            amount,
            entry_type,
            description: description.into(),
        }
    }

    /// Creates a debit entry with an empty description.
    #[must_use]
    pub fn debit(account_id: impl Into<AccountId>, amount: Money) -> Self {
        Self::new(account_id, amount, EntryType::Debit, "")
    }

    /// Creates a credit entry with an empty description.
    #[must_use]
    pub fn credit(account_id: impl Into<AccountId>, amount: Money) -> Self {
        Self::new(account_id, amount, EntryType::Credit, "")
    }

    /// Returns the signed amount: positive for debit, negative for credit.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.entry_type {
            EntryType::Debit => self.amount.amount,
            EntryType::Credit => -self.amount.amount,
        }
    }

    /// Returns this entry with debit and credit swapped, amount unchanged.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            account_id: self.account_id.clone(),
            amount: self.amount.clone(),
            entry_type: self.entry_type.opposite(),
            description: format!("Reversal of: {}", self.description),
        }
    }
}
