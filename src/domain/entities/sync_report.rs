use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the UI banner shows: connectivity plus queue depth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncStatusSnapshot {
    pub is_online: bool,
    pub pending: u64,
    pub failed: u64,
    pub last_online_at: Option<DateTime<Utc>>,
    pub last_full_sync_at: Option<DateTime<Utc>>,
}
