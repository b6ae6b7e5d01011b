use crate::application::ports::{EntityCache, MutationQueue, RemoteBackend};
use crate::application::services::{DataService, HybridStore};
use crate::infrastructure::cache::SqliteEntityCache;
use crate::infrastructure::connectivity::{ConnectivityMonitor, ReachabilityProbe};
use crate::infrastructure::database::{Database, DbPool};
use crate::infrastructure::queue::SqliteMutationQueue;
use crate::infrastructure::remote::RestRemoteBackend;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use crate::domain::value_objects::OwnerId;
use std::sync::Arc;
use tracing::info;

/// Composition root: wires pool → cache → queue → monitor → hybrid store
/// and owns their lifecycle. Construct once, hand out `DataService`
/// instances per signed-in owner, and `dispose()` on shutdown.
pub struct AppContext {
    pub config: AppConfig,
    pool: DbPool,
    pub store: Arc<HybridStore>,
    pub monitor: Arc<ConnectivityMonitor>,
}

impl AppContext {
    pub async fn initialize(config: AppConfig) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let pool = Database::initialize(&config.database).await?;

        let cache: Arc<dyn EntityCache> = Arc::new(SqliteEntityCache::new(pool.clone()));
        let queue: Arc<dyn MutationQueue> =
            Arc::new(SqliteMutationQueue::new(pool.clone(), config.sync.max_retries));

        let rest = Arc::new(RestRemoteBackend::new(&config.remote)?);
        let probe: Arc<dyn ReachabilityProbe> = rest.clone();
        let remote: Arc<dyn RemoteBackend> = rest;

        let monitor = ConnectivityMonitor::new(probe, &config.sync);
        monitor.start();

        let store = HybridStore::new(cache, queue, remote, Arc::clone(&monitor));
        if config.sync.drain_on_reconnect {
            store.start();
        }

        info!("fleetdesk sync core initialized");

        Ok(Self {
            config,
            pool,
            store,
            monitor,
        })
    }

    pub fn data_service(&self, owner: OwnerId) -> DataService {
        DataService::new(Arc::clone(&self.store), owner)
    }

    pub async fn dispose(&self) {
        self.store.stop();
        self.monitor.dispose();
        self.pool.close().await;
        info!("fleetdesk sync core disposed");
    }
}
