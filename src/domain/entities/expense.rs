use crate::domain::entities::record::SyncRecord;
use crate::domain::value_objects::{money, EntityId, EntityKind, OwnerId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A cost booked against the business (fuel, tolls, maintenance, …).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: EntityId,
    pub owner_id: OwnerId,
    pub date: NaiveDate,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "money::lenient_amount")]
    pub amount: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ExpenseRecord {
    pub fn new(owner_id: OwnerId, date: NaiveDate, category: String) -> Self {
        Self {
            id: EntityId::generate(),
            owner_id,
            date,
            category,
            description: None,
            amount: 0.0,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }
}

impl SyncRecord for ExpenseRecord {
    const KIND: EntityKind = EntityKind::Expenses;

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
