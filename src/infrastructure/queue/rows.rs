use crate::domain::entities::QueueItem;
use crate::domain::value_objects::{
    EntityKind, MutationKind, QueueItemId, QueuePayload, QueueStatus,
};
use crate::shared::error::AppError;
use crate::shared::time::from_millis;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct QueueItemRow {
    pub id: String,
    pub entity_type: String,
    pub operation: String,
    pub payload: String,
    pub status: String,
    pub retries: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub error_message: Option<String>,
}

impl QueueItemRow {
    pub fn into_item(self) -> Result<QueueItem, AppError> {
        let id = QueueItemId::new(self.id).map_err(AppError::ValidationError)?;
        let entity = EntityKind::parse(&self.entity_type).map_err(AppError::DeserializationError)?;
        let operation = MutationKind::parse(&self.operation).map_err(AppError::DeserializationError)?;
        let payload = QueuePayload::from_json_str(&self.payload)
            .map_err(AppError::DeserializationError)?;

        Ok(QueueItem {
            id,
            entity,
            operation,
            payload,
            created_at: from_millis(self.created_at),
            retries: self.retries.max(0) as u32,
            status: QueueStatus::from(self.status.as_str()),
            error_message: self.error_message,
        })
    }
}
