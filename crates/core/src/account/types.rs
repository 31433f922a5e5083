//! Account entity and type-based balance semantics.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use ledgerkit_shared::{AccountId, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::AccountError;
use crate::ledger::EntryType;
use crate::store::Entity;

/// Classification of an account.
///
/// The classification determines the normal balance side: Asset and Expense
/// accounts are debit-normal; Liability, Equity, and Revenue accounts are
/// credit-normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Resources owned (debit-normal).
    Asset,
    /// Obligations owed (credit-normal).
    Liability,
    /// Owner's residual interest (credit-normal).
    Equity,
    /// Income earned (credit-normal).
    Revenue,
    /// Costs incurred (debit-normal).
    Expense,
}

impl AccountType {
    /// All account types, in statement order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Returns the side on which this account type's balance increases.
    ///
    /// This is the sole home of the type → direction mapping; every balance
    /// computation calls through here.
    #[must_use]
    pub const fn normal_side(self) -> EntryType {
        match self {
            Self::Asset | Self::Expense => EntryType::Debit,
            Self::Liability | Self::Equity | Self::Revenue => EntryType::Credit,
        }
    }

    /// Returns the signed contribution of an entry to this account's
    /// balance: positive on the normal side, negative on the opposite.
    #[must_use]
    pub fn balance_contribution(self, side: EntryType, amount: Decimal) -> Decimal {
        if side == self.normal_side() {
            amount
        } else {
            -amount
        }
    }
}

/// Lifecycle status of an account.
///
/// Accounts are never physically deleted; retiring one is a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Account accepts postings.
    Active,
    /// Account is dormant but may be reactivated.
    Inactive,
    /// Account is permanently retired.
    Closed,
    /// Account is temporarily locked.
    Frozen,
}

impl AccountStatus {
    /// Returns true if the account accepts postings.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A ledger account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Account code used for reporting and categorization.
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Classification; immutable after creation.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Lifecycle status.
    pub status: AccountStatus,
    /// Currency balances are reported in when no postings exist.
    pub currency: Currency,
    /// Optional parent for hierarchical charts of accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<AccountId>,
    /// When the account was created.
    pub created: DateTime<Utc>,
    /// Last modification timestamp.
    pub last_modified: DateTime<Utc>,
    /// Additional metadata (categories, tags, custom attributes).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
    /// Storage version; managed by the store.
    #[serde(skip)]
    pub version: u64,
}

impl Account {
    /// Creates a new active account with current timestamps.
    #[must_use]
    pub fn new(
        id: impl Into<AccountId>,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            account_type,
            status: AccountStatus::Active,
            currency,
            parent_id: None,
            created: now,
            last_modified: now,
            metadata: HashMap::new(),
            version: 0,
        }
    }

    /// Sets the parent account id.
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<AccountId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Entity for Account {
    const KIND: &'static str = "account";

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

/// Checks the invariants an account update must preserve.
///
/// # Errors
///
/// Returns `AccountError::TypeImmutable` if the update changes the type.
pub fn validate_update(current: &Account, updated: &Account) -> Result<(), AccountError> {
    if current.account_type != updated.account_type {
        return Err(AccountError::TypeImmutable(updated.id.clone()));
    }
    Ok(())
}

/// Walks the parent chain of `account`, resolving parents through `lookup`,
/// and fails if the chain revisits an account or dangles.
///
/// # Errors
///
/// Returns `AccountError::ParentCycle` on a cycle and
/// `AccountError::UnknownParent` on a dangling parent reference.
pub fn validate_hierarchy<F>(account: &Account, mut lookup: F) -> Result<(), AccountError>
where
    F: FnMut(&AccountId) -> Option<Account>,
{
    let mut seen: HashSet<AccountId> = HashSet::new();
    seen.insert(account.id.clone());

    let mut current = account.parent_id.clone();
    let mut child = account.id.clone();
    while let Some(parent_id) = current {
        if !seen.insert(parent_id.clone()) {
            return Err(AccountError::ParentCycle(account.id.clone()));
        }
        let parent = lookup(&parent_id).ok_or_else(|| AccountError::UnknownParent {
            child: child.clone(),
            parent: parent_id.clone(),
        })?;
        child = parent_id;
        current = parent.parent_id;
    }
    Ok(())
}
