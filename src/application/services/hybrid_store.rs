use crate::application::ports::{EntityCache, MutationApplier, MutationQueue, RemoteBackend};
use crate::domain::entities::{
    CacheRecord, Client, DrainOutcome, ExpenseRecord, OwnerSnapshot, QueueChanged, QueueItem,
    ServiceRecord, SyncRecord, SyncStatusSnapshot,
};
use crate::domain::value_objects::{EntityId, EntityKind, MutationKind, OwnerId, QueuePayload};
use crate::infrastructure::connectivity::ConnectivityMonitor;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The single read/write gateway over the remote backend and the local
/// mirror. Every mutation lands in the cache first, then either reaches
/// the backend directly (online) or joins the mutation queue (offline or
/// remote failure). Remote-write failures are converted into queued work
/// rather than surfaced: the write is locally committed, pending remote
/// confirmation, and only the pending/failed counters betray it.
pub struct HybridStore {
    cache: Arc<dyn EntityCache>,
    queue: Arc<dyn MutationQueue>,
    remote: Arc<dyn RemoteBackend>,
    monitor: Arc<ConnectivityMonitor>,
    listener: StdMutex<Option<JoinHandle<()>>>,
}

impl HybridStore {
    pub fn new(
        cache: Arc<dyn EntityCache>,
        queue: Arc<dyn MutationQueue>,
        remote: Arc<dyn RemoteBackend>,
        monitor: Arc<ConnectivityMonitor>,
    ) -> Arc<Self> {
        Arc::new(Self {
            cache,
            queue,
            remote,
            monitor,
            listener: StdMutex::new(None),
        })
    }

    /// Subscribes to connectivity transitions and drains the queue on
    /// every reconnect, plus once at startup to catch leftovers from a
    /// previous run.
    pub fn start(self: &Arc<Self>) {
        let store = Arc::clone(self);
        let mut rx = self.monitor.subscribe();
        let handle = tokio::spawn(async move {
            if store.monitor.is_online() {
                store.drain_and_log().await;
            }
            loop {
                match rx.recv().await {
                    Ok(true) => store.drain_and_log().await,
                    Ok(false) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        if let Ok(mut slot) = self.listener.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }

    pub fn stop(&self) {
        if let Ok(mut slot) = self.listener.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    async fn drain_and_log(&self) {
        if let Err(err) = self.drain_queue().await {
            warn!(target: "sync::hybrid", error = %err, "queue drain failed");
        }
    }

    pub async fn drain_queue(&self) -> Result<DrainOutcome, AppError> {
        let applier = RemoteApplier {
            remote: Arc::clone(&self.remote),
        };
        self.queue.drain(&applier).await
    }

    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    pub async fn pending_count(&self) -> Result<u64, AppError> {
        self.queue.pending_count().await
    }

    pub async fn failed_items(&self) -> Result<Vec<QueueItem>, AppError> {
        self.queue.failed_items().await
    }

    pub async fn retry_failed(&self) -> Result<u64, AppError> {
        self.queue.retry_failed().await
    }

    pub fn subscribe_queue(&self) -> broadcast::Receiver<QueueChanged> {
        self.queue.subscribe()
    }

    pub async fn status(&self, owner: &OwnerId) -> Result<SyncStatusSnapshot, AppError> {
        Ok(SyncStatusSnapshot {
            is_online: self.monitor.is_online(),
            pending: self.queue.pending_count().await?,
            failed: self.queue.failed_count().await?,
            last_online_at: self.monitor.last_online_at().await,
            last_full_sync_at: self.cache.last_full_sync_at(owner).await?,
        })
    }

    /// Explicit, user-triggered full resync. Meaningless without
    /// connectivity, so it fails loudly before touching anything.
    pub async fn force_sync(&self, owner: &OwnerId) -> Result<(), AppError> {
        if !self.monitor.is_online() {
            return Err(AppError::Offline(
                "full resync requires connectivity".to_string(),
            ));
        }

        // Pending local writes go out first so the authoritative fetch
        // cannot overwrite them.
        self.drain_queue().await?;

        let clients = self.remote.get_clients(owner).await?;
        let services = self.remote.get_services(owner, None, None).await?;
        let expenses = self.remote.get_expenses(owner, None, None).await?;
        self.cache
            .replace_all_for_owner(
                owner,
                OwnerSnapshot {
                    clients,
                    services,
                    expenses,
                },
            )
            .await?;

        info!(target: "sync::hybrid", owner = %owner, "full resync complete");
        Ok(())
    }

    // ---- clients ----

    pub async fn clients(&self, owner: &OwnerId) -> Result<Vec<Client>, AppError> {
        self.read_list::<Client>(owner, self.remote.get_clients(owner))
            .await
    }

    pub async fn save_client(&self, client: &Client) -> Result<(), AppError> {
        self.write_entity(client, MutationKind::Create, self.remote.save_client(client))
            .await
    }

    pub async fn delete_client(&self, id: &EntityId) -> Result<(), AppError> {
        self.delete_entity::<Client>(id, self.remote.delete_client(id))
            .await
    }

    pub async fn restore_client(&self, id: &EntityId) -> Result<Client, AppError> {
        let client = self.load_for_restore::<Client>(id).await?;
        self.save_client(&client).await?;
        Ok(client)
    }

    // ---- services ----

    pub async fn services(
        &self,
        owner: &OwnerId,
        range: Option<(NaiveDate, NaiveDate)>,
        client: Option<&EntityId>,
    ) -> Result<Vec<ServiceRecord>, AppError> {
        let (start, end) = match range {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        };
        let list = self
            .read_list::<ServiceRecord>(owner, self.remote.get_services(owner, start, end))
            .await?;
        // Filtered here, not at the source, so remote and cache reads
        // observe identical semantics.
        Ok(filter_services(list, range, client))
    }

    pub async fn save_service(&self, service: &ServiceRecord) -> Result<(), AppError> {
        self.write_entity(
            service,
            MutationKind::Create,
            self.remote.save_service(service),
        )
        .await
    }

    pub async fn update_service(&self, service: &ServiceRecord) -> Result<(), AppError> {
        self.write_entity(
            service,
            MutationKind::Update,
            self.remote.update_service(service),
        )
        .await
    }

    pub async fn delete_service(&self, id: &EntityId) -> Result<(), AppError> {
        self.delete_entity::<ServiceRecord>(id, self.remote.delete_service(id))
            .await
    }

    pub async fn restore_service(&self, id: &EntityId) -> Result<ServiceRecord, AppError> {
        let service = self.load_for_restore::<ServiceRecord>(id).await?;
        self.update_service(&service).await?;
        Ok(service)
    }

    // ---- expenses ----

    pub async fn expenses(
        &self,
        owner: &OwnerId,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<ExpenseRecord>, AppError> {
        let (start, end) = match range {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        };
        let list = self
            .read_list::<ExpenseRecord>(owner, self.remote.get_expenses(owner, start, end))
            .await?;
        Ok(filter_expenses(list, range))
    }

    pub async fn save_expense(&self, expense: &ExpenseRecord) -> Result<(), AppError> {
        self.write_entity(
            expense,
            MutationKind::Create,
            self.remote.save_expense(expense),
        )
        .await
    }

    pub async fn delete_expense(&self, id: &EntityId) -> Result<(), AppError> {
        self.delete_entity::<ExpenseRecord>(id, self.remote.delete_expense(id))
            .await
    }

    pub async fn restore_expense(&self, id: &EntityId) -> Result<ExpenseRecord, AppError> {
        let expense = self.load_for_restore::<ExpenseRecord>(id).await?;
        self.save_expense(&expense).await?;
        Ok(expense)
    }

    // ---- shared routing ----

    async fn write_entity<T: SyncRecord>(
        &self,
        entity: &T,
        operation: MutationKind,
        remote_call: impl Future<Output = Result<(), AppError>> + Send,
    ) -> Result<(), AppError> {
        // Local mirror first: the caller's next read sees this write
        // regardless of network state. Cache failures propagate.
        self.cache.put(CacheRecord::from_entity(entity)?).await?;
        let payload = serde_json::to_value(entity)?;
        self.submit_remote(T::KIND, operation, payload, remote_call)
            .await
    }

    async fn delete_entity<T: SyncRecord>(
        &self,
        id: &EntityId,
        remote_call: impl Future<Output = Result<(), AppError>> + Send,
    ) -> Result<(), AppError> {
        // Domain delete is a tombstone, not a row removal.
        if let Some(row) = self.cache.find(T::KIND, id).await? {
            let mut entity: T = row.decode()?;
            entity.set_deleted_at(Some(Utc::now()));
            self.cache.put(CacheRecord::from_entity(&entity)?).await?;
        }
        let payload = serde_json::json!({ "id": id.as_str() });
        self.submit_remote(T::KIND, MutationKind::Delete, payload, remote_call)
            .await
    }

    async fn load_for_restore<T: SyncRecord>(&self, id: &EntityId) -> Result<T, AppError> {
        let row = self.cache.find(T::KIND, id).await?.ok_or_else(|| {
            AppError::NotFound(format!("{} {} is not in the local mirror", T::KIND, id))
        })?;
        let mut entity: T = row.decode()?;
        entity.set_deleted_at(None);
        Ok(entity)
    }

    async fn submit_remote(
        &self,
        kind: EntityKind,
        operation: MutationKind,
        payload: Value,
        remote_call: impl Future<Output = Result<(), AppError>> + Send,
    ) -> Result<(), AppError> {
        if self.monitor.is_online() {
            match remote_call.await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(
                        target: "sync::hybrid",
                        entity = %kind,
                        operation = %operation,
                        error = %err,
                        "remote write failed, queueing for replay"
                    );
                }
            }
        }
        let payload = QueuePayload::new(payload).map_err(AppError::ValidationError)?;
        self.queue.enqueue(kind, operation, payload).await?;
        Ok(())
    }

    async fn read_list<T: SyncRecord>(
        &self,
        owner: &OwnerId,
        remote_call: impl Future<Output = Result<Vec<T>, AppError>> + Send,
    ) -> Result<Vec<T>, AppError> {
        if self.monitor.is_online() {
            match remote_call.await {
                Ok(fresh) => {
                    self.write_through(owner, &fresh).await;
                    return Ok(fresh);
                }
                Err(err) => {
                    warn!(
                        target: "sync::hybrid",
                        entity = %T::KIND,
                        error = %err,
                        "remote read failed, serving local mirror"
                    );
                }
            }
        }
        let rows = self.cache.get(T::KIND, owner).await?;
        rows.into_iter().map(CacheRecord::decode).collect()
    }

    async fn write_through<T: SyncRecord>(&self, owner: &OwnerId, fresh: &[T]) {
        let records: Result<Vec<_>, AppError> =
            fresh.iter().map(CacheRecord::from_entity).collect();
        let result = match records {
            Ok(records) => self.cache.replace_for_owner(T::KIND, owner, records).await,
            Err(err) => Err(err),
        };
        // The remote read already succeeded; a stale mirror is worth a
        // warning, not a failed call.
        if let Err(err) = result {
            warn!(
                target: "sync::hybrid",
                entity = %T::KIND,
                error = %err,
                "write-through cache update failed"
            );
        }
    }
}

fn filter_services(
    list: Vec<ServiceRecord>,
    range: Option<(NaiveDate, NaiveDate)>,
    client: Option<&EntityId>,
) -> Vec<ServiceRecord> {
    list.into_iter()
        .filter(|s| range.map_or(true, |(start, end)| s.date >= start && s.date <= end))
        .filter(|s| client.map_or(true, |c| &s.client_id == c))
        .collect()
}

fn filter_expenses(
    list: Vec<ExpenseRecord>,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Vec<ExpenseRecord> {
    list.into_iter()
        .filter(|e| range.map_or(true, |(start, end)| e.date >= start && e.date <= end))
        .collect()
}

/// Dispatch table for drains: entity × operation → backend call. Payloads
/// that no longer decode count as failed attempts and go terminal once
/// the retry budget runs out.
pub(crate) struct RemoteApplier {
    remote: Arc<dyn RemoteBackend>,
}

#[async_trait]
impl MutationApplier for RemoteApplier {
    async fn apply(&self, item: &QueueItem) -> Result<bool, AppError> {
        let payload = item.payload.as_json();
        match (item.entity, item.operation) {
            (EntityKind::Clients, MutationKind::Create)
            | (EntityKind::Clients, MutationKind::Update) => {
                let client: Client = decode_payload(payload)?;
                self.remote.save_client(&client).await?;
            }
            (EntityKind::Clients, MutationKind::Delete) => {
                self.remote.delete_client(&payload_id(payload)?).await?;
            }
            (EntityKind::Services, MutationKind::Create) => {
                let service: ServiceRecord = decode_payload(payload)?;
                self.remote.save_service(&service).await?;
            }
            (EntityKind::Services, MutationKind::Update) => {
                let service: ServiceRecord = decode_payload(payload)?;
                self.remote.update_service(&service).await?;
            }
            (EntityKind::Services, MutationKind::Delete) => {
                self.remote.delete_service(&payload_id(payload)?).await?;
            }
            (EntityKind::Expenses, MutationKind::Create)
            | (EntityKind::Expenses, MutationKind::Update) => {
                let expense: ExpenseRecord = decode_payload(payload)?;
                self.remote.save_expense(&expense).await?;
            }
            (EntityKind::Expenses, MutationKind::Delete) => {
                self.remote.delete_expense(&payload_id(payload)?).await?;
            }
        }
        Ok(true)
    }
}

fn decode_payload<T: SyncRecord>(payload: &Value) -> Result<T, AppError> {
    serde_json::from_value(payload.clone())
        .map_err(|err| AppError::DeserializationError(format!("queued payload does not decode: {err}")))
}

fn payload_id(payload: &Value) -> Result<EntityId, AppError> {
    let raw = payload
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AppError::DeserializationError("queued delete payload is missing its id".to_string())
        })?;
    EntityId::new(raw.to_string()).map_err(AppError::ValidationError)
}
