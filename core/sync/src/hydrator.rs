//! Cache hydration and full resync.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use waypoint_common::{Record, Result};
use waypoint_storage::{LocalCache, QueueStatus, QueueStore, RemoteStore};

use crate::engine::SyncEngine;
use crate::status::{
    StatusBus, SyncStatus, FULL_SYNC_COMPLETE_MESSAGE, FULL_SYNC_MESSAGE, SYNC_FAILED_MESSAGE,
};

/// Count of queue items per lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: usize,
    pub syncing: usize,
    pub synced: usize,
    pub failed: usize,
}

/// Bulk-pulls authoritative data into the local caches.
///
/// Hydration bypasses the queue entirely: it reads the remote store
/// directly and overwrites the caches. Queue draining is delegated to
/// the engine when composing a full resync.
pub struct Hydrator {
    trips_remote: Arc<dyn RemoteStore>,
    expenses_remote: Arc<dyn RemoteStore>,
    trip_cache: Arc<dyn LocalCache>,
    expense_cache: Arc<dyn LocalCache>,
    queue: Arc<dyn QueueStore>,
    engine: Arc<SyncEngine>,
    status: Arc<StatusBus>,
}

impl Hydrator {
    /// Create a hydrator over the collaborator stores.
    pub fn new(
        trips_remote: Arc<dyn RemoteStore>,
        expenses_remote: Arc<dyn RemoteStore>,
        trip_cache: Arc<dyn LocalCache>,
        expense_cache: Arc<dyn LocalCache>,
        queue: Arc<dyn QueueStore>,
        engine: Arc<SyncEngine>,
        status: Arc<StatusBus>,
    ) -> Self {
        Self {
            trips_remote,
            expenses_remote,
            trip_cache,
            expense_cache,
            queue,
            engine,
            status,
        }
    }

    /// Pull all trips owned by `owner_id` into the trip cache.
    ///
    /// A remote error propagates to the caller unchanged. An empty
    /// result leaves the cache untouched; a non-empty result is written
    /// in exactly one bulk call. Returns the fetched records.
    pub async fn hydrate_trips(&self, owner_id: &str) -> Result<Vec<Record>> {
        let trips = self.trips_remote.get_all(owner_id).await?;
        if trips.is_empty() {
            debug!("No remote trips for {}, leaving cache untouched", owner_id);
            return Ok(trips);
        }
        self.trip_cache.save_many(&trips).await?;
        info!("Hydrated {} trips for {}", trips.len(), owner_id);
        Ok(trips)
    }

    /// Pull all expenses of one trip into the expense cache.
    ///
    /// Same contract as [`hydrate_trips`](Self::hydrate_trips).
    pub async fn hydrate_expenses(&self, trip_id: &str) -> Result<Vec<Record>> {
        let expenses = self.expenses_remote.get_by_parent(trip_id).await?;
        if expenses.is_empty() {
            debug!("No remote expenses for trip {}", trip_id);
            return Ok(expenses);
        }
        self.expense_cache.save_many(&expenses).await?;
        info!("Hydrated {} expenses for trip {}", expenses.len(), trip_id);
        Ok(expenses)
    }

    /// Drain the queue, then re-hydrate everything the owner holds.
    ///
    /// Any failure at any step broadcasts a generic `Error` status and
    /// re-throws the original error; it is never swallowed here.
    pub async fn force_full_sync(&self, owner_id: &str) -> Result<()> {
        self.status
            .broadcast(SyncStatus::syncing_with(FULL_SYNC_MESSAGE));

        let result = self.full_sync_inner(owner_id).await;
        if let Err(err) = &result {
            error!("Full sync failed: {}", err);
            self.status
                .broadcast(SyncStatus::error(SYNC_FAILED_MESSAGE));
        }
        result
    }

    async fn full_sync_inner(&self, owner_id: &str) -> Result<()> {
        self.engine.start_sync().await?;

        let trips = self.hydrate_trips(owner_id).await?;
        for trip in &trips {
            self.hydrate_expenses(&trip.id).await?;
        }

        self.status
            .broadcast(SyncStatus::synced(FULL_SYNC_COMPLETE_MESSAGE));
        self.queue.clear_synced().await?;
        Ok(())
    }

    /// Count queue items of every status. Pure aggregation.
    pub async fn stats(&self) -> Result<QueueStats> {
        let mut stats = QueueStats::default();
        for item in self.queue.get_all().await? {
            match item.status {
                QueueStatus::Pending => stats.pending += 1,
                QueueStatus::Syncing => stats.syncing += 1,
                QueueStatus::Synced => stats.synced += 1,
                QueueStatus::Failed => stats.failed += 1,
            }
        }
        Ok(stats)
    }
}
