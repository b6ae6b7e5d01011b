use crate::domain::entities::{DrainOutcome, QueueChanged, QueueItem};
use crate::domain::value_objects::{EntityKind, MutationKind, QueueItemId, QueuePayload};
use crate::shared::error::AppError;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Applies one queued mutation against the remote backend.
/// `Ok(true)` deletes the item; `Ok(false)` and `Err` both count as a
/// failed attempt, with the error message recorded on the item.
#[async_trait]
pub trait MutationApplier: Send + Sync {
    async fn apply(&self, item: &QueueItem) -> Result<bool, AppError>;
}

/// Durable, ordered, at-least-once delivery queue of writes that could not
/// be confirmed synchronously against the remote backend.
#[async_trait]
pub trait MutationQueue: Send + Sync {
    /// Append-only; new items start `pending` with zero retries.
    async fn enqueue(
        &self,
        entity: EntityKind,
        operation: MutationKind,
        payload: QueuePayload,
    ) -> Result<QueueItemId, AppError>;

    /// Items in `pending` or `processing`, via an indexed count.
    async fn pending_count(&self) -> Result<u64, AppError>;

    async fn failed_count(&self) -> Result<u64, AppError>;

    async fn pending_items(&self) -> Result<Vec<QueueItem>, AppError>;

    /// Terminal items awaiting operator intervention.
    async fn failed_items(&self) -> Result<Vec<QueueItem>, AppError>;

    /// Replays the pending set through `applier`, strictly sequential in
    /// `created_at` order. Single-flight: a drain started while another is
    /// in progress is a no-op returning zero counters. The work list is
    /// snapshotted at start; items enqueued mid-drain wait for the next
    /// pass. Listeners are notified once at the end, not per item.
    async fn drain(&self, applier: &dyn MutationApplier) -> Result<DrainOutcome, AppError>;

    /// Resets every failed item to pending with zero retries. Manual
    /// intervention only; never triggered automatically.
    async fn retry_failed(&self) -> Result<u64, AppError>;

    fn subscribe(&self) -> broadcast::Receiver<QueueChanged>;
}
