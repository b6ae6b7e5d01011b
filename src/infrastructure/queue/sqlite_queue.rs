use crate::application::ports::{MutationApplier, MutationQueue};
use crate::domain::entities::{DrainOutcome, QueueChanged, QueueItem};
use crate::domain::value_objects::{EntityKind, MutationKind, QueueItemId, QueuePayload};
use crate::infrastructure::database::DbPool;
use crate::infrastructure::queue::rows::QueueItemRow;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub struct SqliteMutationQueue {
    pool: DbPool,
    max_retries: u32,
    // Single-flight guard for drains. try_lock, not lock: a drain started
    // while one is running must return immediately, not wait its turn.
    drain_gate: Mutex<()>,
    changes: broadcast::Sender<QueueChanged>,
}

impl SqliteMutationQueue {
    pub fn new(pool: DbPool, max_retries: u32) -> Self {
        let (changes, _) = broadcast::channel(32);
        Self {
            pool,
            max_retries,
            drain_gate: Mutex::new(()),
            changes,
        }
    }

    async fn notify(&self) {
        let pending = self.pending_count().await.unwrap_or(0);
        let _ = self.changes.send(QueueChanged { pending });
    }

    async fn load_work_list(&self) -> Result<Vec<QueueItem>, AppError> {
        // rowid breaks same-millisecond ties so FIFO survives bursts.
        let rows = sqlx::query_as::<_, QueueItemRow>(
            r#"
            SELECT * FROM mutation_queue
            WHERE status IN ('pending', 'processing')
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(QueueItemRow::into_item).collect()
    }

    async fn mark_processing(&self, id: &QueueItemId) -> Result<(), AppError> {
        sqlx::query("UPDATE mutation_queue SET status = 'processing', updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now().timestamp_millis())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn finish_success(&self, id: &QueueItemId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM mutation_queue WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn finish_failure(
        &self,
        item: &QueueItem,
        message: String,
    ) -> Result<bool, AppError> {
        let retries = item.retries + 1;
        let terminal = retries >= self.max_retries;
        let status = if terminal { "failed" } else { "pending" };

        sqlx::query(
            r#"
            UPDATE mutation_queue
            SET status = ?1, retries = ?2, error_message = ?3, updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(status)
        .bind(retries as i64)
        .bind(&message)
        .bind(Utc::now().timestamp_millis())
        .bind(item.id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(terminal)
    }

    async fn handle_failure(
        &self,
        item: &QueueItem,
        message: String,
        outcome: &mut DrainOutcome,
    ) -> Result<(), AppError> {
        let terminal = self.finish_failure(item, message).await?;
        if terminal {
            warn!(
                target: "sync::queue",
                item = %item.id,
                entity = %item.entity,
                operation = %item.operation,
                "mutation exhausted its retries and was parked as failed"
            );
        }
        outcome.failed += 1;
        Ok(())
    }
}

#[async_trait]
impl MutationQueue for SqliteMutationQueue {
    async fn enqueue(
        &self,
        entity: EntityKind,
        operation: MutationKind,
        payload: QueuePayload,
    ) -> Result<QueueItemId, AppError> {
        let id = QueueItemId::generate();
        let payload_text = serde_json::to_string(payload.as_json())?;
        let now = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO mutation_queue (
                id, entity_type, operation, payload, status, retries, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 'pending', 0, ?5, ?5)
            "#,
        )
        .bind(id.as_str())
        .bind(entity.as_str())
        .bind(operation.as_str())
        .bind(payload_text)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.notify().await;
        Ok(id)
    }

    async fn pending_count(&self) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM mutation_queue WHERE status IN ('pending', 'processing')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn failed_count(&self) -> Result<u64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM mutation_queue WHERE status = 'failed'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }

    async fn pending_items(&self) -> Result<Vec<QueueItem>, AppError> {
        self.load_work_list().await
    }

    async fn failed_items(&self) -> Result<Vec<QueueItem>, AppError> {
        let rows = sqlx::query_as::<_, QueueItemRow>(
            r#"
            SELECT * FROM mutation_queue
            WHERE status = 'failed'
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(QueueItemRow::into_item).collect()
    }

    async fn drain(&self, applier: &dyn MutationApplier) -> Result<DrainOutcome, AppError> {
        let _guard = match self.drain_gate.try_lock() {
            Ok(guard) => guard,
            Err(_) => return Ok(DrainOutcome::default()),
        };

        // Snapshot the work list up front: items enqueued mid-drain join
        // the next pass instead of being replayed out of order.
        let items = self.load_work_list().await?;
        let mut outcome = DrainOutcome::default();

        for item in items {
            self.mark_processing(&item.id).await?;

            match applier.apply(&item).await {
                Ok(true) => {
                    self.finish_success(&item.id).await?;
                    outcome.processed += 1;
                }
                Ok(false) => {
                    self.handle_failure(&item, "apply reported failure".to_string(), &mut outcome)
                        .await?;
                }
                Err(err) => {
                    self.handle_failure(&item, err.to_string(), &mut outcome).await?;
                }
            }
        }

        if outcome.processed > 0 || outcome.failed > 0 {
            info!(
                target: "sync::queue",
                processed = outcome.processed,
                failed = outcome.failed,
                "drain pass finished"
            );
        }

        self.notify().await;
        Ok(outcome)
    }

    async fn retry_failed(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE mutation_queue
            SET status = 'pending', retries = 0, updated_at = ?1
            WHERE status = 'failed'
            "#,
        )
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        self.notify().await;
        Ok(result.rows_affected())
    }

    fn subscribe(&self) -> broadcast::Receiver<QueueChanged> {
        self.changes.subscribe()
    }
}
