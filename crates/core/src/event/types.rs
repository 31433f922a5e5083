//! Event envelope, lifecycle event names, and typed payloads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ledgerkit_shared::{AccountId, TransactionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::ledger::TransactionStatus;

/// A transaction was persisted for the first time.
pub const TRANSACTION_CREATED: &str = "transaction.created";
/// A transaction passed (or failed) validation.
pub const TRANSACTION_VALIDATED: &str = "transaction.validated";
/// A transaction was submitted for posting.
pub const TRANSACTION_PENDING: &str = "transaction.pending";
/// A transaction was posted to the ledger.
pub const TRANSACTION_POSTED: &str = "transaction.posted";
/// Processing a transaction failed.
pub const TRANSACTION_FAILED: &str = "transaction.failed";
/// A posted transaction was voided.
pub const TRANSACTION_VOIDED: &str = "transaction.voided";
/// A posting changed an account's balance.
pub const ACCOUNT_BALANCE_UPDATED: &str = "account.balance.updated";

/// A domain event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: String,
    /// Event type name (e.g. `transaction.posted`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
    /// Component that published the event.
    pub source: String,
    /// Opaque payload.
    pub data: Value,
    /// Additional context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl Event {
    /// Creates an event with a generated id and the current timestamp.
    #[must_use]
    pub fn new(event_type: impl Into<String>, source: impl Into<String>, data: Value) -> Self {
        Self {
            id: format!("evt-{}", Uuid::now_v7()),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            source: source.into(),
            data,
            metadata: HashMap::new(),
        }
    }
}

/// Payload of `transaction.validated` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationEvent {
    /// The validated transaction.
    pub transaction_id: TransactionId,
    /// Whether validation passed.
    pub valid: bool,
    /// Error messages, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Warning messages, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Payload of transaction status-change events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatusEvent {
    /// The transaction that changed.
    pub transaction_id: TransactionId,
    /// Status before the change.
    pub old_status: TransactionStatus,
    /// Status after the change.
    pub new_status: TransactionStatus,
    /// Reason, when the operation carries one (void, failure).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Payload of `account.balance.updated` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceUpdateEvent {
    /// The affected account.
    pub account_id: AccountId,
    /// The transaction that moved the balance.
    pub transaction_id: TransactionId,
}
