//! In-memory reference implementation of the repository contract.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::error::StoreError;
use super::query::Query;
use super::types::{AuditEntry, Entity, Operation, VersionInfo};
use super::Repository;

/// Snapshot of one stored entity.
#[derive(Debug, Clone)]
struct Record {
    state: Value,
    version: u64,
    modified_at: DateTime<Utc>,
    modified_by: String,
}

#[derive(Debug, Default)]
struct Inner {
    /// Entity snapshots keyed by kind, then id. BTreeMap keeps ids sorted,
    /// which is the deterministic base order for queries.
    records: HashMap<&'static str, BTreeMap<String, Record>>,
    /// Audit trails keyed by (kind, id). Retained after delete.
    audits: HashMap<(&'static str, String), Vec<AuditEntry>>,
}

/// In-memory store: a single RwLock guards the index, so readers share and
/// writers exclude. Mutations and their audit records commit in the same
/// critical section.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn encode<T: Entity>(entity: &T, id: &str) -> Result<Value, StoreError> {
    serde_json::to_value(entity).map_err(|e| StoreError::Codec {
        kind: T::KIND,
        id: id.to_string(),
        message: e.to_string(),
    })
}

fn decode<T: Entity>(record: &Record, id: &str) -> Result<T, StoreError> {
    let mut entity: T = serde_json::from_value(record.state.clone()).map_err(|e| {
        StoreError::Codec {
            kind: T::KIND,
            id: id.to_string(),
            message: e.to_string(),
        }
    })?;
    entity.set_version(record.version);
    Ok(entity)
}

#[allow(clippy::too_many_arguments)]
fn push_audit(
    audits: &mut HashMap<(&'static str, String), Vec<AuditEntry>>,
    kind: &'static str,
    id: &str,
    operation: Operation,
    actor: &str,
    previous_state: Option<Value>,
    new_state: Option<Value>,
    timestamp: DateTime<Utc>,
) {
    let entry = AuditEntry {
        id: format!("audit-{}", Uuid::now_v7()),
        entity_type: kind.to_string(),
        entity_id: id.to_string(),
        operation,
        timestamp,
        actor: actor.to_string(),
        previous_state,
        new_state,
        metadata: HashMap::new(),
    };
    audits.entry((kind, id.to_string())).or_default().push(entry);
}

impl Repository for MemoryStore {
    fn create<T: Entity>(&self, entity: &mut T, actor: &str) -> Result<(), StoreError> {
        let id = entity.entity_id().to_string();
        if id.is_empty() {
            return Err(StoreError::InvalidId { kind: T::KIND });
        }
        let state = encode(entity, &id)?;

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        {
            let records = inner.records.entry(T::KIND).or_default();
            if records.contains_key(&id) {
                return Err(StoreError::DuplicateId { kind: T::KIND, id });
            }
            records.insert(
                id.clone(),
                Record {
                    state: state.clone(),
                    version: 1,
                    modified_at: now,
                    modified_by: actor.to_string(),
                },
            );
        }
        push_audit(
            &mut inner.audits,
            T::KIND,
            &id,
            Operation::Create,
            actor,
            None,
            Some(state),
            now,
        );
        drop(inner);

        entity.set_version(1);
        Ok(())
    }

    fn read<T: Entity>(&self, id: &str) -> Result<T, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let record = inner
            .records
            .get(T::KIND)
            .and_then(|records| records.get(id))
            .ok_or_else(|| StoreError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })?;
        decode(record, id)
    }

    fn update<T: Entity>(&self, entity: &mut T, actor: &str) -> Result<u64, StoreError> {
        let id = entity.entity_id().to_string();
        if id.is_empty() {
            return Err(StoreError::InvalidId { kind: T::KIND });
        }
        let state = encode(entity, &id)?;

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        let (previous, new_version) = {
            let record = inner
                .records
                .get_mut(T::KIND)
                .and_then(|records| records.get_mut(&id))
                .ok_or_else(|| StoreError::NotFound {
                    kind: T::KIND,
                    id: id.clone(),
                })?;

            if let Some(expected) = entity.version() {
                if expected != record.version {
                    return Err(StoreError::OptimisticLock {
                        kind: T::KIND,
                        id,
                        stored: record.version,
                        expected,
                    });
                }
            }

            let previous = std::mem::replace(&mut record.state, state.clone());
            record.version += 1;
            record.modified_at = now;
            record.modified_by = actor.to_string();
            (previous, record.version)
        };
        push_audit(
            &mut inner.audits,
            T::KIND,
            &id,
            Operation::Update,
            actor,
            Some(previous),
            Some(state),
            now,
        );
        drop(inner);

        entity.set_version(new_version);
        Ok(new_version)
    }

    fn delete<T: Entity>(&self, id: &str, actor: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let removed = inner
            .records
            .get_mut(T::KIND)
            .and_then(|records| records.remove(id))
            .ok_or_else(|| StoreError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })?;
        push_audit(
            &mut inner.audits,
            T::KIND,
            id,
            Operation::Delete,
            actor,
            Some(removed.state),
            None,
            Utc::now(),
        );
        Ok(())
    }

    fn query<T: Entity>(&self, query: &Query) -> Result<Vec<T>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let Some(records) = inner.records.get(T::KIND) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<(&String, &Record)> = records
            .iter()
            .filter(|(_, record)| query.matches(&record.state))
            .collect();

        if !query.sort.is_empty() {
            // Stable sort: equal keys keep the id-ascending base order.
            matched.sort_by(|(_, a), (_, b)| query.compare(&a.state, &b.state));
        }

        let windowed: Vec<(&String, &Record)> = match query.page {
            Some(page) => matched
                .into_iter()
                .skip(page.offset())
                .take(page.limit())
                .collect(),
            None => matched,
        };

        windowed
            .into_iter()
            .map(|(id, record)| decode(record, id))
            .collect()
    }

    fn count<T: Entity>(&self, query: &Query) -> Result<u64, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let Some(records) = inner.records.get(T::KIND) else {
            return Ok(0);
        };
        let count = records
            .values()
            .filter(|record| query.matches(&record.state))
            .count();
        Ok(count as u64)
    }

    fn audit_trail<T: Entity>(&self, id: &str) -> Result<Vec<AuditEntry>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .audits
            .get(&(T::KIND, id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn version_info<T: Entity>(&self, id: &str) -> Result<VersionInfo, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let record = inner
            .records
            .get(T::KIND)
            .and_then(|records| records.get(id))
            .ok_or_else(|| StoreError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })?;
        Ok(VersionInfo {
            version: record.version,
            modified_at: record.modified_at,
            modified_by: record.modified_by.clone(),
        })
    }
}
