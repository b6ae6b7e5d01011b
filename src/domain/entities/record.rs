use crate::domain::value_objects::{EntityId, EntityKind, OwnerId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// An owner-scoped record the sync core can mirror locally and queue for
/// replay. Implemented by the three CRM entities.
pub trait SyncRecord: Serialize + DeserializeOwned + Clone + Send + Sync {
    const KIND: EntityKind;

    fn id(&self) -> &EntityId;
    fn owner_id(&self) -> &OwnerId;
    fn client_id(&self) -> Option<&EntityId> {
        None
    }
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}
