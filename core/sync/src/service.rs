//! Top-level sync service wiring the core components together.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use waypoint_common::Result;
use waypoint_storage::{Connectivity, LocalCache, QueueStore, RemoteStore};

use crate::engine::SyncEngine;
use crate::hydrator::{Hydrator, QueueStats};
use crate::monitor::NetworkMonitor;
use crate::scheduler::AutoSync;
use crate::status::{StatusBus, Subscription, SyncStatus};

/// Configuration for the sync service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Interval between auto-sync passes.
    pub auto_sync_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync_interval: Duration::from_secs(30),
        }
    }
}

/// Collaborator stores the service is built over.
pub struct SyncStores {
    pub trips_remote: Arc<dyn RemoteStore>,
    pub expenses_remote: Arc<dyn RemoteStore>,
    pub trip_cache: Arc<dyn LocalCache>,
    pub expense_cache: Arc<dyn LocalCache>,
    pub queue: Arc<dyn QueueStore>,
    pub connectivity: Arc<dyn Connectivity>,
}

/// The public surface of the sync core.
///
/// Owns the engine, monitor, scheduler, hydrator and status bus, and
/// delegates to them. Everything outside the core talks to this type
/// (or to a status subscription obtained from it).
pub struct SyncService {
    config: SyncConfig,
    status: Arc<StatusBus>,
    engine: Arc<SyncEngine>,
    monitor: NetworkMonitor,
    scheduler: AutoSync,
    hydrator: Hydrator,
}

impl SyncService {
    /// Wire up the core components over the given stores.
    pub fn new(stores: SyncStores, config: SyncConfig) -> Self {
        let status = Arc::new(StatusBus::new());
        let engine = Arc::new(SyncEngine::new(
            stores.queue.clone(),
            stores.trips_remote.clone(),
            stores.expenses_remote.clone(),
            stores.connectivity.clone(),
            status.clone(),
        ));
        let monitor = NetworkMonitor::new(stores.connectivity, engine.clone(), status.clone());
        let scheduler = AutoSync::new(engine.clone());
        let hydrator = Hydrator::new(
            stores.trips_remote,
            stores.expenses_remote,
            stores.trip_cache,
            stores.expense_cache,
            stores.queue,
            engine.clone(),
            status.clone(),
        );

        Self {
            config,
            status,
            engine,
            monitor,
            scheduler,
            hydrator,
        }
    }

    /// Run one queue pass now.
    pub async fn start_sync(&self) -> Result<()> {
        self.engine.start_sync().await
    }

    /// Start the repeating auto-sync timer with the configured interval.
    pub fn start_auto_sync(&self) {
        self.scheduler.start(self.config.auto_sync_interval);
    }

    /// Start the repeating auto-sync timer with an explicit interval.
    pub fn start_auto_sync_every(&self, interval: Duration) {
        self.scheduler.start(interval);
    }

    /// Cancel the auto-sync timer.
    pub fn stop_auto_sync(&self) {
        self.scheduler.stop();
    }

    /// Start reacting to connectivity transitions.
    pub fn start_network_monitoring(&self) {
        self.monitor.start();
    }

    /// Stop reacting to connectivity transitions.
    pub fn stop_network_monitoring(&self) {
        self.monitor.stop();
    }

    /// Register a listener for status broadcasts.
    pub fn on_status_change(
        &self,
        listener: impl Fn(&SyncStatus) + Send + Sync + 'static,
    ) -> Subscription {
        self.status.subscribe(listener)
    }

    /// Count queue items per status.
    pub async fn stats(&self) -> Result<QueueStats> {
        self.hydrator.stats().await
    }

    /// Pull all of an owner's trips into the local cache.
    pub async fn hydrate_trips(&self, owner_id: &str) -> Result<Vec<waypoint_common::Record>> {
        self.hydrator.hydrate_trips(owner_id).await
    }

    /// Pull one trip's expenses into the local cache.
    pub async fn hydrate_expenses(&self, trip_id: &str) -> Result<Vec<waypoint_common::Record>> {
        self.hydrator.hydrate_expenses(trip_id).await
    }

    /// Drain the queue and re-hydrate everything the owner holds.
    pub async fn force_full_sync(&self, owner_id: &str) -> Result<()> {
        self.hydrator.force_full_sync(owner_id).await
    }
}
