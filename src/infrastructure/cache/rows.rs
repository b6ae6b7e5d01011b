use crate::domain::entities::CacheRecord;
use crate::domain::value_objects::{EntityId, EntityKind, OwnerId};
use crate::shared::error::AppError;
use crate::shared::time::from_millis;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct CachedEntityRow {
    pub entity_type: String,
    pub entity_id: String,
    pub owner_id: String,
    pub client_id: Option<String>,
    pub data: String,
    pub deleted_at: Option<i64>,
    pub cached_at: i64,
}

impl CachedEntityRow {
    pub fn into_record(self) -> Result<CacheRecord, AppError> {
        let kind = EntityKind::parse(&self.entity_type).map_err(AppError::DeserializationError)?;
        let entity_id = EntityId::new(self.entity_id).map_err(AppError::ValidationError)?;
        let owner_id = OwnerId::new(self.owner_id).map_err(AppError::ValidationError)?;
        let client_id = self
            .client_id
            .map(EntityId::new)
            .transpose()
            .map_err(AppError::ValidationError)?;
        let data = serde_json::from_str(&self.data)
            .map_err(|err| AppError::DeserializationError(err.to_string()))?;

        Ok(CacheRecord {
            kind,
            entity_id,
            owner_id,
            client_id,
            data,
            deleted_at: self.deleted_at.map(from_millis),
            cached_at: from_millis(self.cached_at),
        })
    }
}
