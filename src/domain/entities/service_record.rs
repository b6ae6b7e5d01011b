use crate::domain::entities::record::SyncRecord;
use crate::domain::value_objects::{money, EntityId, EntityKind, OwnerId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One delivery job performed for a client. The money fields are decimal
/// currency values carried as floats; they are normalized on the way in
/// (see `money::lenient_amount`) so aggregation never trips over stray
/// string encodings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: EntityId,
    pub owner_id: OwnerId,
    pub client_id: EntityId,
    pub date: NaiveDate,
    #[serde(default)]
    pub pickup_address: Option<String>,
    #[serde(default)]
    pub dropoff_address: Option<String>,
    #[serde(default, deserialize_with = "money::lenient_amount")]
    pub cost: f64,
    #[serde(default, deserialize_with = "money::lenient_amount")]
    pub driver_fee: f64,
    #[serde(default, deserialize_with = "money::lenient_amount")]
    pub waiting_time: f64,
    #[serde(default, deserialize_with = "money::lenient_amount")]
    pub extra_fee: f64,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ServiceRecord {
    pub fn new(owner_id: OwnerId, client_id: EntityId, date: NaiveDate) -> Self {
        Self {
            id: EntityId::generate(),
            owner_id,
            client_id,
            date,
            pickup_address: None,
            dropoff_address: None,
            cost: 0.0,
            driver_fee: 0.0,
            waiting_time: 0.0,
            extra_fee: 0.0,
            notes: None,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    /// Everything billed to the client for this job.
    pub fn total_charge(&self) -> f64 {
        self.cost + self.waiting_time + self.extra_fee
    }

    /// What the business keeps after paying the driver.
    pub fn net_income(&self) -> f64 {
        self.total_charge() - self.driver_fee
    }
}

impl SyncRecord for ServiceRecord {
    const KIND: EntityKind = EntityKind::Services;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    fn client_id(&self) -> Option<&EntityId> {
        Some(&self.client_id)
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }
}
