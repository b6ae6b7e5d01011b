use crate::domain::entities::record::SyncRecord;
use crate::domain::value_objects::{EntityId, EntityKind, OwnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer of the delivery business.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: EntityId,
    pub owner_id: OwnerId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Client {
    pub fn new(owner_id: OwnerId, name: String) -> Self {
        Self {
            id: EntityId::generate(),
            owner_id,
            name,
            phone: None,
            email: None,
            address: None,
            notes: None,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }
}

impl SyncRecord for Client {
    const KIND: EntityKind = EntityKind::Clients;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }
}
