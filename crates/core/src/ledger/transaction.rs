//! Transaction aggregate.

use chrono::{DateTime, Utc};
use ledgerkit_shared::{Currency, TransactionId};
use serde::{Deserialize, Serialize};

use super::entry::Entry;
use crate::store::Entity;

/// Transaction type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// General journal entry.
    Journal,
    /// Transfer between accounts.
    Transfer,
    /// Reversal of a previously posted transaction.
    Reversal,
}

/// Transaction status in the posting lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Transaction is being drafted and can be modified.
    Draft,
    /// Transaction has been submitted for posting.
    Pending,
    /// Transaction has been posted to the ledger (entries locked).
    Posted,
    /// Transaction has been voided (excluded from balances).
    Voided,
}

impl TransactionStatus {
    /// Returns true if the transaction can still be modified.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Pending)
    }

    /// Returns true if the transaction can be posted.
    #[must_use]
    pub fn can_post(&self) -> bool {
        matches!(self, Self::Draft | Self::Pending)
    }

    /// Returns true if the transaction is immutable.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Posted | Self::Voided)
    }
}

/// A financial transaction: a balanced set of ledger entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Classification.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Current lifecycle status.
    pub status: TransactionStatus,
    /// Business date.
    pub date: DateTime<Utc>,
    /// Description of the transaction.
    pub description: String,
    /// Ordered ledger entries.
    pub entries: Vec<Entry>,
    /// Opaque identity of the creator; recorded, never interpreted.
    pub created_by: String,
    /// When the transaction was created.
    pub created: DateTime<Utc>,
    /// When the transaction last changed.
    pub last_modified: DateTime<Utc>,
    /// When the transaction was posted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,
    /// When the transaction was voided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voided_at: Option<DateTime<Utc>>,
    /// Why the transaction was voided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub void_reason: Option<String>,
    /// When the transaction was reversed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversed_at: Option<DateTime<Utc>>,
    /// Id of the transaction that reverses this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversal_id: Option<TransactionId>,
    /// For a Reversal: id of the transaction it reverses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversed_from: Option<TransactionId>,
    /// Storage version; managed by the store, absent from snapshots.
    #[serde(skip)]
    pub version: u64,
}

impl Transaction {
    /// Creates a draft transaction with current timestamps.
    #[must_use]
    pub fn new(
        id: impl Into<TransactionId>,
        transaction_type: TransactionType,
        date: DateTime<Utc>,
        description: impl Into<String>,
        created_by: impl Into<String>,
        entries: Vec<Entry>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            transaction_type,
            status: TransactionStatus::Draft,
            date,
            description: description.into(),
            entries,
            created_by: created_by.into(),
            created: now,
            last_modified: now,
            posted_at: None,
            voided_at: None,
            void_reason: None,
            reversed_at: None,
            reversal_id: None,
            reversed_from: None,
            version: 0,
        }
    }

    /// Creates a draft journal transaction.
    #[must_use]
    pub fn journal(
        id: impl Into<TransactionId>,
        date: DateTime<Utc>,
        description: impl Into<String>,
        created_by: impl Into<String>,
        entries: Vec<Entry>,
    ) -> Self {
        Self::new(id, TransactionType::Journal, date, description, created_by, entries)
    }

    /// Returns the currency of the transaction's entries, if any.
    ///
    /// Validated transactions are single-currency, so the first entry's
    /// currency is the transaction's currency.
    #[must_use]
    pub fn currency(&self) -> Option<&Currency> {
        self.entries.first().map(|entry| &entry.amount.currency)
    }
}

impl Entity for Transaction {
    const KIND: &'static str = "transaction";

    fn entity_id(&self) -> &str {
        self.id.as_str()
    }

    fn version(&self) -> Option<u64> {
        Some(self.version)
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerkit_shared::Money;
    use rust_decimal_macros::dec;

    fn sample() -> Transaction {
        Transaction::journal(
            "T1",
            Utc::now(),
            "Office rent",
            "user-1",
            vec![
                Entry::debit("acct-rent", Money::new(dec!(100), Currency::usd())),
                Entry::credit("acct-cash", Money::new(dec!(100), Currency::usd())),
            ],
        )
    }

    #[test]
    fn test_new_transaction_is_draft() {
        let tx = sample();
        assert_eq!(tx.status, TransactionStatus::Draft);
        assert!(tx.status.can_post());
        assert!(tx.posted_at.is_none());
        assert_eq!(tx.version, 0);
    }

    #[test]
    fn test_status_predicates() {
        assert!(TransactionStatus::Draft.is_editable());
        assert!(TransactionStatus::Pending.is_editable());
        assert!(!TransactionStatus::Posted.is_editable());
        assert!(!TransactionStatus::Voided.is_editable());

        assert!(TransactionStatus::Draft.can_post());
        assert!(TransactionStatus::Pending.can_post());
        assert!(!TransactionStatus::Posted.can_post());
        assert!(!TransactionStatus::Voided.can_post());

        assert!(TransactionStatus::Posted.is_immutable());
        assert!(TransactionStatus::Voided.is_immutable());
    }

    #[test]
    fn test_currency_comes_from_first_entry() {
        let tx = sample();
        assert_eq!(tx.currency().map(Currency::as_str), Some("USD"));

        let empty = Transaction::journal("T2", Utc::now(), "", "user-1", vec![]);
        assert!(empty.currency().is_none());
    }

    #[test]
    fn test_json_shape_matches_contract() {
        let tx = sample();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["id"], "T1");
        assert_eq!(json["type"], "JOURNAL");
        assert_eq!(json["status"], "DRAFT");
        assert_eq!(json["entries"][0]["type"], "DEBIT");
        assert_eq!(json["entries"][0]["amount"]["amount"], "100");
        // Unset optionals are omitted, and the version never serializes.
        assert!(json.get("posted_at").is_none());
        assert!(json.get("void_reason").is_none());
        assert!(json.get("version").is_none());

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, tx.id);
        assert_eq!(back.entries, tx.entries);
    }
}
