use crate::domain::entities::{Client, ExpenseRecord, ServiceRecord};
use crate::domain::value_objects::{EntityId, OwnerId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;

/// The remote CRUD backend, treated as an opaque collaborator. Deletes are
/// logical on the backend (it sets `deletedAt`); physical removal never
/// crosses this boundary.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn get_clients(&self, owner: &OwnerId) -> Result<Vec<Client>, AppError>;
    async fn save_client(&self, client: &Client) -> Result<(), AppError>;
    async fn delete_client(&self, id: &EntityId) -> Result<(), AppError>;

    async fn get_services(
        &self,
        owner: &OwnerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<ServiceRecord>, AppError>;
    async fn save_service(&self, service: &ServiceRecord) -> Result<(), AppError>;
    /// Distinct from `save_service` so the backend can audit-log edits.
    async fn update_service(&self, service: &ServiceRecord) -> Result<(), AppError>;
    async fn delete_service(&self, id: &EntityId) -> Result<(), AppError>;

    async fn get_expenses(
        &self,
        owner: &OwnerId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<ExpenseRecord>, AppError>;
    async fn save_expense(&self, expense: &ExpenseRecord) -> Result<(), AppError>;
    async fn delete_expense(&self, id: &EntityId) -> Result<(), AppError>;
}
