use crate::domain::value_objects::{
    EntityKind, MutationKind, QueueItemId, QueuePayload, QueueStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable record of one pending mutation. Items for the same entity
/// id are never merged; a drain replays them strictly in `created_at` order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueItem {
    pub id: QueueItemId,
    pub entity: EntityKind,
    pub operation: MutationKind,
    pub payload: QueuePayload,
    pub created_at: DateTime<Utc>,
    pub retries: u32,
    pub status: QueueStatus,
    pub error_message: Option<String>,
}

/// Counters returned by one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainOutcome {
    pub processed: u32,
    pub failed: u32,
}

/// Broadcast to change-listeners when the queue's pending set moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueChanged {
    pub pending: u64,
}
