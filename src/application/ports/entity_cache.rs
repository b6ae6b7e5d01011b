use crate::domain::entities::{CacheCounts, CacheRecord, OwnerSnapshot};
use crate::domain::value_objects::{EntityId, EntityKind, OwnerId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable local mirror of every entity the owner has fetched or mutated.
/// May be stale relative to the backend, but never contains a write the
/// application did not request. Storage failures propagate; no retries.
#[async_trait]
pub trait EntityCache: Send + Sync {
    /// All rows for the owner, tombstoned ones included. Empty vec, never
    /// an error, when nothing is cached.
    async fn get(&self, kind: EntityKind, owner: &OwnerId) -> Result<Vec<CacheRecord>, AppError>;

    async fn find(&self, kind: EntityKind, id: &EntityId) -> Result<Option<CacheRecord>, AppError>;

    /// Idempotent upsert by entity id.
    async fn put(&self, record: CacheRecord) -> Result<(), AppError>;

    /// Bulk upsert in a single transaction; partial application is never
    /// observable.
    async fn put_many(&self, records: Vec<CacheRecord>) -> Result<(), AppError>;

    /// Physical removal from the mirror. Domain-level soft delete is a
    /// `put` of a record carrying `deleted_at`, not this.
    async fn remove(&self, kind: EntityKind, id: &EntityId) -> Result<(), AppError>;

    /// Write-through slice replace: clear one entity type for the owner,
    /// then insert the fresh rows, in one transaction.
    async fn replace_for_owner(
        &self,
        kind: EntityKind,
        owner: &OwnerId,
        records: Vec<CacheRecord>,
    ) -> Result<(), AppError>;

    /// Full replace after a confirmed manual sync: clear-then-insert each
    /// entity type (each type atomically) and stamp `last_full_sync_at`.
    async fn replace_all_for_owner(
        &self,
        owner: &OwnerId,
        snapshot: OwnerSnapshot,
    ) -> Result<(), AppError>;

    async fn counts(&self, owner: &OwnerId) -> Result<CacheCounts, AppError>;

    async fn last_full_sync_at(&self, owner: &OwnerId)
        -> Result<Option<DateTime<Utc>>, AppError>;
}
