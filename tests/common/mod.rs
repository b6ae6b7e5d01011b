#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use fleetdesk::application::ports::{EntityCache, MutationQueue, RemoteBackend};
use fleetdesk::application::services::{DataService, HybridStore};
use fleetdesk::domain::entities::{Client, ExpenseRecord, ServiceRecord};
use fleetdesk::domain::value_objects::{EntityId, OwnerId};
use fleetdesk::infrastructure::cache::SqliteEntityCache;
use fleetdesk::infrastructure::connectivity::{ConnectivityMonitor, ReachabilityProbe};
use fleetdesk::infrastructure::queue::SqliteMutationQueue;
use fleetdesk::shared::error::AppError;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// In-memory stand-in for the remote backend: an entity store per kind, a
/// call log, failure switches, and an optional gate that parks requests
/// until released.
#[derive(Default)]
pub struct FakeRemote {
    pub online: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
    pub clients: Mutex<HashMap<String, Client>>,
    pub services: Mutex<HashMap<String, ServiceRecord>>,
    pub expenses: Mutex<HashMap<String, ExpenseRecord>>,
    pub calls: Mutex<Vec<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        let remote = Self::default();
        remote.online.store(true, Ordering::SeqCst);
        Arc::new(remote)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Every subsequent request parks until the returned handle is
    /// notified.
    pub fn install_gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn remove_gate(&self) {
        *self.gate.lock().unwrap() = None;
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    async fn maybe_wait(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn write_guard(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Network("injected write failure".to_string()));
        }
        Ok(())
    }

    fn read_guard(&self) -> Result<(), AppError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Network("injected read failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteBackend for FakeRemote {
    async fn get_clients(&self, owner: &OwnerId) -> Result<Vec<Client>, AppError> {
        self.record("get_clients");
        self.maybe_wait().await;
        self.read_guard()?;
        let owned = owner.clone();
        Ok(self
            .clients
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.owner_id == owned)
            .cloned()
            .collect())
    }

    async fn save_client(&self, client: &Client) -> Result<(), AppError> {
        self.record("save_client");
        self.maybe_wait().await;
        self.write_guard()?;
        self.clients
            .lock()
            .unwrap()
            .insert(client.id.as_str().to_string(), client.clone());
        Ok(())
    }

    async fn delete_client(&self, id: &EntityId) -> Result<(), AppError> {
        self.record("delete_client");
        self.maybe_wait().await;
        self.write_guard()?;
        if let Some(client) = self.clients.lock().unwrap().get_mut(id.as_str()) {
            client.deleted_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn get_services(
        &self,
        owner: &OwnerId,
        _start: Option<NaiveDate>,
        _end: Option<NaiveDate>,
    ) -> Result<Vec<ServiceRecord>, AppError> {
        self.record("get_services");
        self.maybe_wait().await;
        self.read_guard()?;
        let owned = owner.clone();
        Ok(self
            .services
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.owner_id == owned)
            .cloned()
            .collect())
    }

    async fn save_service(&self, service: &ServiceRecord) -> Result<(), AppError> {
        self.record("save_service");
        self.maybe_wait().await;
        self.write_guard()?;
        self.services
            .lock()
            .unwrap()
            .insert(service.id.as_str().to_string(), service.clone());
        Ok(())
    }

    async fn update_service(&self, service: &ServiceRecord) -> Result<(), AppError> {
        self.record("update_service");
        self.maybe_wait().await;
        self.write_guard()?;
        self.services
            .lock()
            .unwrap()
            .insert(service.id.as_str().to_string(), service.clone());
        Ok(())
    }

    async fn delete_service(&self, id: &EntityId) -> Result<(), AppError> {
        self.record("delete_service");
        self.maybe_wait().await;
        self.write_guard()?;
        if let Some(service) = self.services.lock().unwrap().get_mut(id.as_str()) {
            service.deleted_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn get_expenses(
        &self,
        owner: &OwnerId,
        _start: Option<NaiveDate>,
        _end: Option<NaiveDate>,
    ) -> Result<Vec<ExpenseRecord>, AppError> {
        self.record("get_expenses");
        self.maybe_wait().await;
        self.read_guard()?;
        let owned = owner.clone();
        Ok(self
            .expenses
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.owner_id == owned)
            .cloned()
            .collect())
    }

    async fn save_expense(&self, expense: &ExpenseRecord) -> Result<(), AppError> {
        self.record("save_expense");
        self.maybe_wait().await;
        self.write_guard()?;
        self.expenses
            .lock()
            .unwrap()
            .insert(expense.id.as_str().to_string(), expense.clone());
        Ok(())
    }

    async fn delete_expense(&self, id: &EntityId) -> Result<(), AppError> {
        self.record("delete_expense");
        self.maybe_wait().await;
        self.write_guard()?;
        if let Some(expense) = self.expenses.lock().unwrap().get_mut(id.as_str()) {
            expense.deleted_at = Some(chrono::Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl ReachabilityProbe for FakeRemote {
    async fn check(&self) -> Result<(), AppError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::Network("backend unreachable".to_string()))
        }
    }
}

pub struct TestHarness {
    pub store: Arc<HybridStore>,
    pub remote: Arc<FakeRemote>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub queue: Arc<SqliteMutationQueue>,
    pub cache: Arc<SqliteEntityCache>,
}

impl TestHarness {
    pub fn data_service(&self, owner: OwnerId) -> Arc<DataService> {
        Arc::new(DataService::new(Arc::clone(&self.store), owner))
    }
}

pub async fn harness() -> TestHarness {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let cache = Arc::new(SqliteEntityCache::new(pool.clone()));
    let queue = Arc::new(SqliteMutationQueue::new(pool.clone(), 3));
    let remote = FakeRemote::new();

    // Long probe interval: connectivity is driven by the tests, not the
    // background loop.
    let monitor = ConnectivityMonitor::with_timings(
        Arc::clone(&remote) as Arc<dyn ReachabilityProbe>,
        Duration::from_secs(3600),
        Duration::from_millis(200),
    );

    let store = HybridStore::new(
        Arc::clone(&cache) as Arc<dyn EntityCache>,
        Arc::clone(&queue) as Arc<dyn MutationQueue>,
        Arc::clone(&remote) as Arc<dyn RemoteBackend>,
        Arc::clone(&monitor),
    );

    TestHarness {
        store,
        remote,
        monitor,
        queue,
        cache,
    }
}

pub fn owner() -> OwnerId {
    OwnerId::new("owner-1".to_string()).unwrap()
}

pub fn client_named(id: &str, name: &str) -> Client {
    let mut client = Client::new(owner(), name.to_string());
    client.id = EntityId::new(id.to_string()).unwrap();
    client
}

pub fn service_with_cost(id: &str, client_id: &str, cost: f64) -> ServiceRecord {
    let mut service = ServiceRecord::new(
        owner(),
        EntityId::new(client_id.to_string()).unwrap(),
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
    );
    service.id = EntityId::new(id.to_string()).unwrap();
    service.cost = cost;
    service
}
