use serde::{Deserialize, Serialize};

/// Lifecycle of a queued mutation: pending → processing → (deleted | pending | failed).
/// `Failed` is terminal until an explicit retry resets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueStatus {
    Pending,
    Processing,
    Failed,
    Unknown(String),
}

impl QueueStatus {
    pub fn as_str(&self) -> &str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Processing => "processing",
            QueueStatus::Failed => "failed",
            QueueStatus::Unknown(value) => value.as_str(),
        }
    }
}

impl From<&str> for QueueStatus {
    fn from(value: &str) -> Self {
        match value {
            "pending" => QueueStatus::Pending,
            "processing" => QueueStatus::Processing,
            "failed" => QueueStatus::Failed,
            other => QueueStatus::Unknown(other.to_string()),
        }
    }
}
