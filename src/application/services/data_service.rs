use crate::application::services::hybrid_store::HybridStore;
use crate::domain::entities::{Client, ExpenseRecord, ServiceRecord, SyncRecord, SyncStatusSnapshot};
use crate::domain::value_objects::{EntityId, OwnerId};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, warn};

#[derive(Debug, Clone, Default)]
struct DataState {
    clients: Vec<Client>,
    services: Vec<ServiceRecord>,
    expenses: Vec<ExpenseRecord>,
}

/// The UI's view of the data: every mutation lands in the in-memory state
/// before the first await on the persistence path, so the caller's next
/// read reflects it immediately. Persistence failures are reconciled with
/// a full refresh rather than fine-grained rollback.
pub struct DataService {
    store: Arc<HybridStore>,
    owner: OwnerId,
    state: RwLock<DataState>,
    is_syncing: AtomicBool,
    // Single-flight guard: overlapping refreshes collapse into the one
    // already in flight instead of issuing redundant round-trips.
    refresh_gate: Mutex<()>,
}

impl DataService {
    pub fn new(store: Arc<HybridStore>, owner: OwnerId) -> Self {
        Self {
            store,
            owner,
            state: RwLock::new(DataState::default()),
            is_syncing: AtomicBool::new(false),
            refresh_gate: Mutex::new(()),
        }
    }

    // ---- snapshots ----

    pub async fn clients(&self) -> Vec<Client> {
        self.state.read().await.clients.clone()
    }

    pub async fn services(&self) -> Vec<ServiceRecord> {
        self.state.read().await.services.clone()
    }

    pub async fn expenses(&self) -> Vec<ExpenseRecord> {
        self.state.read().await.expenses.clone()
    }

    pub fn is_syncing(&self) -> bool {
        self.is_syncing.load(Ordering::SeqCst)
    }

    pub fn is_online(&self) -> bool {
        self.store.is_online()
    }

    pub async fn pending_count(&self) -> Result<u64, AppError> {
        self.store.pending_count().await
    }

    pub async fn status(&self) -> Result<SyncStatusSnapshot, AppError> {
        self.store.status(&self.owner).await
    }

    // ---- clients ----

    pub async fn save_client(&self, client: Client) -> Result<(), AppError> {
        {
            let mut state = self.state.write().await;
            upsert_by_id(&mut state.clients, client.clone());
        }
        self.run_persist(self.store.save_client(&client)).await
    }

    pub async fn delete_client(&self, id: &EntityId) -> Result<(), AppError> {
        {
            let mut state = self.state.write().await;
            set_tombstone(&mut state.clients, id, Some(Utc::now()));
        }
        self.run_persist(self.store.delete_client(id)).await
    }

    pub async fn restore_client(&self, id: &EntityId) -> Result<(), AppError> {
        {
            let mut state = self.state.write().await;
            set_tombstone(&mut state.clients, id, None);
        }
        self.run_persist(async {
            self.store.restore_client(id).await.map(|_| ())
        })
        .await
    }

    // ---- services ----

    pub async fn save_service(&self, service: ServiceRecord) -> Result<(), AppError> {
        {
            let mut state = self.state.write().await;
            upsert_by_id(&mut state.services, service.clone());
        }
        self.run_persist(self.store.save_service(&service)).await
    }

    pub async fn update_service(&self, service: ServiceRecord) -> Result<(), AppError> {
        {
            let mut state = self.state.write().await;
            upsert_by_id(&mut state.services, service.clone());
        }
        self.run_persist(self.store.update_service(&service)).await
    }

    pub async fn delete_service(&self, id: &EntityId) -> Result<(), AppError> {
        {
            let mut state = self.state.write().await;
            set_tombstone(&mut state.services, id, Some(Utc::now()));
        }
        self.run_persist(self.store.delete_service(id)).await
    }

    pub async fn restore_service(&self, id: &EntityId) -> Result<(), AppError> {
        {
            let mut state = self.state.write().await;
            set_tombstone(&mut state.services, id, None);
        }
        self.run_persist(async {
            self.store.restore_service(id).await.map(|_| ())
        })
        .await
    }

    // ---- expenses ----

    pub async fn save_expense(&self, expense: ExpenseRecord) -> Result<(), AppError> {
        {
            let mut state = self.state.write().await;
            upsert_by_id(&mut state.expenses, expense.clone());
        }
        self.run_persist(self.store.save_expense(&expense)).await
    }

    pub async fn delete_expense(&self, id: &EntityId) -> Result<(), AppError> {
        {
            let mut state = self.state.write().await;
            set_tombstone(&mut state.expenses, id, Some(Utc::now()));
        }
        self.run_persist(self.store.delete_expense(id)).await
    }

    pub async fn restore_expense(&self, id: &EntityId) -> Result<(), AppError> {
        {
            let mut state = self.state.write().await;
            set_tombstone(&mut state.expenses, id, None);
        }
        self.run_persist(async {
            self.store.restore_expense(id).await.map(|_| ())
        })
        .await
    }

    // ---- sync surface ----

    pub async fn refresh_data(&self) -> Result<(), AppError> {
        let _guard = match self.refresh_gate.try_lock() {
            Ok(guard) => guard,
            Err(_) => return Ok(()),
        };

        let clients = self.store.clients(&self.owner).await?;
        let services = self.store.services(&self.owner, None, None).await?;
        let expenses = self.store.expenses(&self.owner, None).await?;

        let mut state = self.state.write().await;
        state.clients = clients;
        state.services = services;
        state.expenses = expenses;
        Ok(())
    }

    pub async fn force_sync(&self) -> Result<(), AppError> {
        self.is_syncing.store(true, Ordering::SeqCst);
        let result = async {
            self.store.force_sync(&self.owner).await?;
            self.refresh_data().await
        }
        .await;
        self.is_syncing.store(false, Ordering::SeqCst);
        result
    }

    async fn run_persist(
        &self,
        op: impl Future<Output = Result<(), AppError>>,
    ) -> Result<(), AppError> {
        self.is_syncing.store(true, Ordering::SeqCst);
        let result = op.await;
        if let Err(err) = &result {
            // The optimistic edit is discarded wholesale: re-fetch
            // everything rather than rolling back one record.
            warn!(target: "sync::data", error = %err, "persistence failed, refreshing state");
            if let Err(refresh_err) = self.refresh_data().await {
                error!(
                    target: "sync::data",
                    error = %refresh_err,
                    "refresh after failed persistence also failed"
                );
            }
        }
        self.is_syncing.store(false, Ordering::SeqCst);
        result
    }
}

fn upsert_by_id<T: SyncRecord>(list: &mut Vec<T>, entity: T) {
    match list.iter_mut().find(|existing| existing.id() == entity.id()) {
        Some(slot) => *slot = entity,
        None => list.push(entity),
    }
}

fn set_tombstone<T: SyncRecord>(list: &mut [T], id: &EntityId, at: Option<DateTime<Utc>>) {
    if let Some(entity) = list.iter_mut().find(|existing| existing.id() == id) {
        entity.set_deleted_at(at);
    }
}
