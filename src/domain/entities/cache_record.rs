use crate::domain::entities::record::SyncRecord;
use crate::domain::value_objects::{EntityId, EntityKind, OwnerId};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the local mirror: the entity's JSON snapshot plus the columns
/// the cache indexes on. The `deleted_at` column mirrors the tombstone
/// inside `data` so tombstoned records stay queryable without decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheRecord {
    pub kind: EntityKind,
    pub entity_id: EntityId,
    pub owner_id: OwnerId,
    pub client_id: Option<EntityId>,
    pub data: Value,
    pub deleted_at: Option<DateTime<Utc>>,
    pub cached_at: DateTime<Utc>,
}

impl CacheRecord {
    pub fn from_entity<T: SyncRecord>(entity: &T) -> Result<Self, AppError> {
        let data = serde_json::to_value(entity)?;
        Ok(Self {
            kind: T::KIND,
            entity_id: entity.id().clone(),
            owner_id: entity.owner_id().clone(),
            client_id: entity.client_id().cloned(),
            data,
            deleted_at: entity.deleted_at(),
            cached_at: Utc::now(),
        })
    }

    pub fn decode<T: SyncRecord>(self) -> Result<T, AppError> {
        serde_json::from_value(self.data)
            .map_err(|err| AppError::DeserializationError(err.to_string()))
    }
}

/// Authoritative per-owner entity sets delivered by a confirmed full sync.
#[derive(Debug, Clone, Default)]
pub struct OwnerSnapshot {
    pub clients: Vec<crate::domain::entities::Client>,
    pub services: Vec<crate::domain::entities::ServiceRecord>,
    pub expenses: Vec<crate::domain::entities::ExpenseRecord>,
}

/// Per-kind row counts for status surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheCounts {
    pub clients: u64,
    pub services: u64,
    pub expenses: u64,
}
