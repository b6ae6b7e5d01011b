use crate::application::ports::EntityCache;
use crate::domain::entities::{CacheCounts, CacheRecord, OwnerSnapshot, SyncRecord};
use crate::domain::value_objects::{EntityId, EntityKind, OwnerId};
use crate::infrastructure::cache::rows::CachedEntityRow;
use crate::infrastructure::database::DbPool;
use crate::shared::error::AppError;
use crate::shared::time::{from_millis, to_millis};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite};

pub struct SqliteEntityCache {
    pool: DbPool,
}

impl SqliteEntityCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn upsert_into<'e, E>(executor: E, record: &CacheRecord) -> Result<(), AppError>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let data = serde_json::to_string(&record.data)?;
        sqlx::query(
            r#"
            INSERT INTO entity_cache (
                entity_type, entity_id, owner_id, client_id, data, deleted_at, cached_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(entity_type, entity_id) DO UPDATE SET
                owner_id = excluded.owner_id,
                client_id = excluded.client_id,
                data = excluded.data,
                deleted_at = excluded.deleted_at,
                cached_at = excluded.cached_at
            "#,
        )
        .bind(record.kind.as_str())
        .bind(record.entity_id.as_str())
        .bind(record.owner_id.as_str())
        .bind(record.client_id.as_ref().map(|id| id.as_str().to_string()))
        .bind(data)
        .bind(record.deleted_at.map(to_millis))
        .bind(to_millis(record.cached_at))
        .execute(executor)
        .await?;

        Ok(())
    }

    fn records_from_entities<T: SyncRecord>(entities: &[T]) -> Result<Vec<CacheRecord>, AppError> {
        entities.iter().map(CacheRecord::from_entity).collect()
    }
}

#[async_trait]
impl EntityCache for SqliteEntityCache {
    async fn get(&self, kind: EntityKind, owner: &OwnerId) -> Result<Vec<CacheRecord>, AppError> {
        let rows = sqlx::query_as::<_, CachedEntityRow>(
            r#"
            SELECT * FROM entity_cache
            WHERE entity_type = ?1 AND owner_id = ?2
            ORDER BY cached_at ASC, rowid ASC
            "#,
        )
        .bind(kind.as_str())
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CachedEntityRow::into_record).collect()
    }

    async fn find(&self, kind: EntityKind, id: &EntityId) -> Result<Option<CacheRecord>, AppError> {
        let row = sqlx::query_as::<_, CachedEntityRow>(
            "SELECT * FROM entity_cache WHERE entity_type = ?1 AND entity_id = ?2",
        )
        .bind(kind.as_str())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(CachedEntityRow::into_record).transpose()
    }

    async fn put(&self, record: CacheRecord) -> Result<(), AppError> {
        Self::upsert_into(&self.pool, &record).await
    }

    async fn put_many(&self, records: Vec<CacheRecord>) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for record in &records {
            Self::upsert_into(&mut *tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, kind: EntityKind, id: &EntityId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM entity_cache WHERE entity_type = ?1 AND entity_id = ?2")
            .bind(kind.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn replace_for_owner(
        &self,
        kind: EntityKind,
        owner: &OwnerId,
        records: Vec<CacheRecord>,
    ) -> Result<(), AppError> {
        // Clear-then-insert in one transaction so a reader never observes
        // the empty intermediate state.
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM entity_cache WHERE entity_type = ?1 AND owner_id = ?2")
            .bind(kind.as_str())
            .bind(owner.as_str())
            .execute(&mut *tx)
            .await?;
        for record in &records {
            Self::upsert_into(&mut *tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn replace_all_for_owner(
        &self,
        owner: &OwnerId,
        snapshot: OwnerSnapshot,
    ) -> Result<(), AppError> {
        self.replace_for_owner(
            EntityKind::Clients,
            owner,
            Self::records_from_entities(&snapshot.clients)?,
        )
        .await?;
        self.replace_for_owner(
            EntityKind::Services,
            owner,
            Self::records_from_entities(&snapshot.services)?,
        )
        .await?;
        self.replace_for_owner(
            EntityKind::Expenses,
            owner,
            Self::records_from_entities(&snapshot.expenses)?,
        )
        .await?;

        sqlx::query(
            r#"
            INSERT INTO sync_meta (owner_id, last_full_sync_at)
            VALUES (?1, ?2)
            ON CONFLICT(owner_id) DO UPDATE SET
                last_full_sync_at = excluded.last_full_sync_at
            "#,
        )
        .bind(owner.as_str())
        .bind(to_millis(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn counts(&self, owner: &OwnerId) -> Result<CacheCounts, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT entity_type, COUNT(*) as item_count
            FROM entity_cache
            WHERE owner_id = ?1
            GROUP BY entity_type
            "#,
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut counts = CacheCounts::default();
        for row in rows {
            let kind: String = row.try_get("entity_type").unwrap_or_default();
            let count: i64 = row.try_get("item_count").unwrap_or(0);
            match kind.as_str() {
                "clients" => counts.clients = count as u64,
                "services" => counts.services = count as u64,
                "expenses" => counts.expenses = count as u64,
                _ => {}
            }
        }
        Ok(counts)
    }

    async fn last_full_sync_at(
        &self,
        owner: &OwnerId,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let stamp: Option<i64> =
            sqlx::query_scalar("SELECT last_full_sync_at FROM sync_meta WHERE owner_id = ?1")
                .bind(owner.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(stamp.map(from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Client;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_cache() -> SqliteEntityCache {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        SqliteEntityCache::new(pool)
    }

    fn owner() -> OwnerId {
        OwnerId::new("owner-1".into()).unwrap()
    }

    fn sample_client(name: &str) -> Client {
        Client::new(owner(), name.to_string())
    }

    #[tokio::test]
    async fn test_get_on_empty_cache_returns_empty_vec() {
        let cache = setup_cache().await;
        let records = cache.get(EntityKind::Clients, &owner()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_put_is_an_idempotent_upsert() {
        let cache = setup_cache().await;
        let mut client = sample_client("Acme Logistics");

        cache
            .put(CacheRecord::from_entity(&client).unwrap())
            .await
            .unwrap();
        client.phone = Some("555-0100".to_string());
        cache
            .put(CacheRecord::from_entity(&client).unwrap())
            .await
            .unwrap();

        let records = cache.get(EntityKind::Clients, &owner()).await.unwrap();
        assert_eq!(records.len(), 1);
        let stored: Client = records.into_iter().next().unwrap().decode().unwrap();
        assert_eq!(stored.phone.as_deref(), Some("555-0100"));
    }

    #[tokio::test]
    async fn test_tombstoned_rows_stay_queryable() {
        let cache = setup_cache().await;
        let mut client = sample_client("Tombstone Co");
        client.deleted_at = Some(Utc::now());

        cache
            .put(CacheRecord::from_entity(&client).unwrap())
            .await
            .unwrap();

        let records = cache.get(EntityKind::Clients, &owner()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_remove_is_physical() {
        let cache = setup_cache().await;
        let client = sample_client("Gone Ltd");
        cache
            .put(CacheRecord::from_entity(&client).unwrap())
            .await
            .unwrap();

        cache.remove(EntityKind::Clients, &client.id).await.unwrap();

        assert!(cache
            .find(EntityKind::Clients, &client.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_replace_for_owner_clears_previous_rows() {
        let cache = setup_cache().await;
        let stale = sample_client("Stale");
        cache
            .put(CacheRecord::from_entity(&stale).unwrap())
            .await
            .unwrap();

        let fresh = sample_client("Fresh");
        cache
            .replace_for_owner(
                EntityKind::Clients,
                &owner(),
                vec![CacheRecord::from_entity(&fresh).unwrap()],
            )
            .await
            .unwrap();

        let records = cache.get(EntityKind::Clients, &owner()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entity_id, fresh.id);
    }

    #[tokio::test]
    async fn test_replace_all_for_owner_is_idempotent() {
        let cache = setup_cache().await;
        let snapshot = OwnerSnapshot {
            clients: vec![sample_client("A"), sample_client("B")],
            services: vec![],
            expenses: vec![],
        };

        cache
            .replace_all_for_owner(&owner(), snapshot.clone())
            .await
            .unwrap();
        let first = cache.get(EntityKind::Clients, &owner()).await.unwrap();

        cache
            .replace_all_for_owner(&owner(), snapshot)
            .await
            .unwrap();
        let second = cache.get(EntityKind::Clients, &owner()).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(
            first
                .iter()
                .map(|r| r.entity_id.as_str().to_string())
                .collect::<Vec<_>>(),
            second
                .iter()
                .map(|r| r.entity_id.as_str().to_string())
                .collect::<Vec<_>>()
        );

        assert!(cache.last_full_sync_at(&owner()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_counts_groups_by_kind() {
        let cache = setup_cache().await;
        cache
            .put_many(vec![
                CacheRecord::from_entity(&sample_client("One")).unwrap(),
                CacheRecord::from_entity(&sample_client("Two")).unwrap(),
            ])
            .await
            .unwrap();

        let counts = cache.counts(&owner()).await.unwrap();
        assert_eq!(counts.clients, 2);
        assert_eq!(counts.services, 0);
        assert_eq!(counts.expenses, 0);
    }
}
