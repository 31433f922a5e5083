//! Versioned entity persistence with optimistic locking and audit trail.
//!
//! This module defines the generic repository contract consumed by the
//! transaction engine and the reporting calculator, plus an in-memory
//! reference implementation. Entities are persisted as JSON snapshots keyed
//! by (entity kind, id); every mutation appends an audit record in the same
//! critical section, so a successful mutation and its audit record are
//! indivisible.

pub mod error;
pub mod memory;
pub mod query;
pub mod types;


pub use error::StoreError;
pub use memory::MemoryStore;
pub use query::{Filter, FilterOp, Query, SortKey};
pub use types::{AuditEntry, Entity, Operation, VersionInfo};

/// Generic repository contract.
///
/// Implementations must be safe for concurrent use; the version-exchange
/// protocol (read, modify, update with the read version) makes
/// read-modify-write cycles appear serializable, and `OPTIMISTIC_LOCK` is
/// the signal to retry the whole cycle.
pub trait Repository: Send + Sync {
    /// Persists a new entity and initializes its version to 1.
    ///
    /// # Errors
    ///
    /// `INVALID_ID` if the id is empty; `DUPLICATE_ID` if an entity of the
    /// same kind and id already exists.
    fn create<T: Entity>(&self, entity: &mut T, actor: &str) -> Result<(), StoreError>;

    /// Reads an entity snapshot by id.
    ///
    /// The returned value is a copy; mutating it never affects stored state.
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` if no entity of this kind has the id.
    fn read<T: Entity>(&self, id: &str) -> Result<T, StoreError>;

    /// Overwrites an existing entity, returning the new version.
    ///
    /// When the entity exposes a version, it must equal the stored version;
    /// otherwise the update fails with `OPTIMISTIC_LOCK` and the caller
    /// should retry its read-modify-write cycle.
    fn update<T: Entity>(&self, entity: &mut T, actor: &str) -> Result<u64, StoreError>;

    /// Removes an entity. The audit trail is retained.
    fn delete<T: Entity>(&self, id: &str, actor: &str) -> Result<(), StoreError>;

    /// Returns entities matching the query, filtered, sorted, and paginated.
    ///
    /// Ordering is deterministic: equal sort keys tie-break by id ascending.
    fn query<T: Entity>(&self, query: &Query) -> Result<Vec<T>, StoreError>;

    /// Returns the number of entities matching the query (pagination ignored).
    fn count<T: Entity>(&self, query: &Query) -> Result<u64, StoreError>;

    /// Returns the audit trail for an id, oldest first.
    ///
    /// Trail order matches commit order even when timestamps collide.
    fn audit_trail<T: Entity>(&self, id: &str) -> Result<Vec<AuditEntry>, StoreError>;

    /// Returns version metadata for an entity.
    fn version_info<T: Entity>(&self, id: &str) -> Result<VersionInfo, StoreError>;
}
