//! Store domain types: the entity contract, audit records, version info.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Contract an entity must satisfy to be persisted.
///
/// `KIND` tags the entity's namespace in the store; ids are unique within a
/// kind. `version` participates in optimistic locking: `None` marks the
/// entity as unversioned, which disables the check entirely. Version 0
/// means "never persisted"; the store stamps 1 on create.
pub trait Entity: Serialize + DeserializeOwned + Clone {
    /// Stable entity-kind name (e.g. `"transaction"`).
    const KIND: &'static str;

    /// The entity's unique identifier within its kind.
    fn entity_id(&self) -> &str;

    /// Current version as known to the caller, or `None` for unversioned
    /// entities.
    fn version(&self) -> Option<u64> {
        None
    }

    /// Called by the store after create/read/update to sync the caller's
    /// copy with the stored version. Default is a no-op for unversioned
    /// entities.
    fn set_version(&mut self, _version: u64) {}
}

/// Mutation kind recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// Entity was created.
    Create,
    /// Entity was overwritten.
    Update,
    /// Entity was removed.
    Delete,
}

/// One append-only audit record. Never mutated after write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique record identifier.
    pub id: String,
    /// Entity kind the mutation applied to.
    pub entity_type: String,
    /// Id of the mutated entity.
    pub entity_id: String,
    /// What happened.
    pub operation: Operation,
    /// When the mutation committed.
    pub timestamp: DateTime<Utc>,
    /// Opaque identity of whoever performed the mutation.
    pub actor: String,
    /// Snapshot before the mutation (absent for Create).
    pub previous_state: Option<Value>,
    /// Snapshot after the mutation (absent for Delete).
    pub new_state: Option<Value>,
    /// Additional context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

/// Version metadata for a stored entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Current version; increments by exactly one per successful update.
    pub version: u64,
    /// When the entity last changed.
    pub modified_at: DateTime<Utc>,
    /// Who last changed it.
    pub modified_by: String,
}
