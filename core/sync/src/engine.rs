//! Core sync engine that drains the mutation queue against the remote store.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use waypoint_common::{EntityKind, Error, Operation, Result};
use waypoint_storage::{Connectivity, QueueItem, QueueStatus, QueueStore, RemoteStore};

use crate::resolver::resolve;
use crate::status::{StatusBus, SyncStatus, SYNC_COMPLETE_MESSAGE};

/// Sync orchestrator.
///
/// The engine is the only component that moves queue items through
/// their lifecycle and the only one that calls the remote store for
/// queued mutations. Each pass drains the pending items strictly in
/// creation order, one at a time; there is no internal parallelism.
pub struct SyncEngine {
    queue: Arc<dyn QueueStore>,
    trips: Arc<dyn RemoteStore>,
    expenses: Arc<dyn RemoteStore>,
    connectivity: Arc<dyn Connectivity>,
    status: Arc<StatusBus>,
    /// Pass guard: overlapping triggers coalesce instead of racing.
    pass_guard: Mutex<()>,
}

impl SyncEngine {
    /// Create a new sync engine over the collaborator stores.
    pub fn new(
        queue: Arc<dyn QueueStore>,
        trips: Arc<dyn RemoteStore>,
        expenses: Arc<dyn RemoteStore>,
        connectivity: Arc<dyn Connectivity>,
        status: Arc<StatusBus>,
    ) -> Self {
        Self {
            queue,
            trips,
            expenses,
            connectivity,
            status,
            pass_guard: Mutex::new(()),
        }
    }

    fn remote_for(&self, kind: EntityKind) -> &Arc<dyn RemoteStore> {
        match kind {
            EntityKind::Trip => &self.trips,
            EntityKind::Expense => &self.expenses,
        }
    }

    /// Run one queue pass.
    ///
    /// While offline this returns immediately: no queue read, no remote
    /// call, no broadcast. A trigger that arrives while a pass is
    /// already running coalesces into that pass and returns `Ok(())`.
    ///
    /// A single item's failure is recorded against that item and never
    /// aborts the pass; only a queue store failure is fatal, in which
    /// case an `Error` status is broadcast, the error propagates, and
    /// no purge happens.
    pub async fn start_sync(&self) -> Result<()> {
        let _pass = match self.pass_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Sync pass already in progress, coalescing trigger");
                return Ok(());
            }
        };

        if !self.connectivity.is_online() {
            debug!("Offline, skipping sync pass");
            return Ok(());
        }

        self.status.broadcast(SyncStatus::syncing());

        let pending = match self.queue.get_pending().await {
            Ok(items) => items,
            Err(err) => {
                error!("Failed to read pending queue items: {}", err);
                self.status.broadcast(SyncStatus::error(err.to_string()));
                return Err(err);
            }
        };

        info!("Starting sync pass over {} pending items", pending.len());

        for item in &pending {
            self.process_item(item).await;
        }

        if let Err(err) = self.queue.clear_synced().await {
            error!("Failed to purge synced queue items: {}", err);
            self.status.broadcast(SyncStatus::error(err.to_string()));
            return Err(err);
        }

        self.status
            .broadcast(SyncStatus::synced(SYNC_COMPLETE_MESSAGE));
        Ok(())
    }

    /// Process one queue item, recording any failure against it.
    async fn process_item(&self, item: &QueueItem) {
        debug!(
            "Processing queue item {}: {} {} {}",
            item.id,
            op_name(item.operation),
            item.kind,
            item.entity_id
        );

        if let Err(err) = self.push_item(item).await {
            warn!("Queue item {} failed: {}", item.id, err);
            if let Err(update_err) = self
                .queue
                .update_status(item.id, QueueStatus::Failed, Some(err.to_string()))
                .await
            {
                error!(
                    "Failed to record failure for queue item {}: {}",
                    item.id, update_err
                );
            }
        }
    }

    async fn push_item(&self, item: &QueueItem) -> Result<()> {
        self.queue
            .update_status(item.id, QueueStatus::Syncing, None)
            .await?;

        let remote = self.remote_for(item.kind);
        match item.operation {
            Operation::Delete => {
                remote.delete(&item.entity_id).await?;
            }
            Operation::Create | Operation::Update => {
                let local = item.payload.clone().ok_or_else(|| {
                    Error::InvalidInput(format!("Queue item {} has no payload", item.id))
                })?;
                // "Not found" comes back as None and simply means the
                // local snapshot has nothing to lose against.
                let current = remote.get_by_id(&item.entity_id).await?;
                let winner = resolve(local, current);
                remote.update(&item.entity_id, &winner).await?;
            }
        }

        self.queue
            .update_status(item.id, QueueStatus::Synced, None)
            .await?;
        Ok(())
    }
}

fn op_name(operation: Operation) -> &'static str {
    match operation {
        Operation::Create => "create",
        Operation::Update => "update",
        Operation::Delete => "delete",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use crate::status::SyncPhase;
    use waypoint_common::Record;
    use waypoint_storage::{ManualConnectivity, MemoryQueue, MemoryRemote};

    struct Fixture {
        queue: Arc<MemoryQueue>,
        trips: Arc<MemoryRemote>,
        expenses: Arc<MemoryRemote>,
        connectivity: Arc<ManualConnectivity>,
        status: Arc<StatusBus>,
        engine: SyncEngine,
    }

    fn fixture(online: bool) -> Fixture {
        let queue = Arc::new(MemoryQueue::new());
        let trips = Arc::new(MemoryRemote::new(EntityKind::Trip));
        let expenses = Arc::new(MemoryRemote::new(EntityKind::Expense));
        let connectivity = Arc::new(ManualConnectivity::new(online));
        let status = Arc::new(StatusBus::new());
        let engine = SyncEngine::new(
            queue.clone(),
            trips.clone(),
            expenses.clone(),
            connectivity.clone(),
            status.clone(),
        );
        Fixture {
            queue,
            trips,
            expenses,
            connectivity,
            status,
            engine,
        }
    }

    fn watch(status: &StatusBus) -> Arc<StdMutex<Vec<SyncStatus>>> {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        // Listener registry lives as long as the bus; the handle is
        // intentionally not kept.
        let _ = status.subscribe(move |s| sink.lock().unwrap().push(s.clone()));
        seen
    }

    fn trip(id: &str) -> Record {
        Record::new(id, Utc::now(), json!({"id": id, "owner_id": "u-1"})).unwrap()
    }

    #[tokio::test]
    async fn test_offline_pass_touches_nothing() {
        let f = fixture(false);
        let seen = watch(&f.status);

        f.engine.start_sync().await.unwrap();

        assert_eq!(f.queue.read_calls(), 0);
        assert_eq!(f.queue.clear_synced_calls(), 0);
        assert_eq!(f.trips.call_count(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_queue_still_purges_and_broadcasts() {
        let f = fixture(true);
        let seen = watch(&f.status);

        f.engine.start_sync().await.unwrap();

        assert_eq!(f.queue.clear_synced_calls(), 1);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].phase, SyncPhase::Syncing);
        assert_eq!(seen[1], SyncStatus::synced(SYNC_COMPLETE_MESSAGE));
    }

    #[tokio::test]
    async fn test_update_resolves_against_remote() {
        let f = fixture(true);

        // Remote copy is newer than the queued snapshot
        let stale = trip("t-1");
        let fresh = Record::new(
            "t-1",
            stale.updated_at + Duration::seconds(5),
            json!({"id": "t-1", "owner_id": "u-1", "name": "remote edit"}),
        )
        .unwrap();
        f.trips.insert(fresh.clone());
        f.queue
            .enqueue(EntityKind::Trip, "t-1", Operation::Update, Some(stale))
            .await
            .unwrap();

        f.engine.start_sync().await.unwrap();

        let stored = f.trips.get_by_id("t-1").await.unwrap().unwrap();
        assert_eq!(stored.data, fresh.data);
        // The synced item was purged
        assert!(f.queue.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_absent_remote_pushes_local() {
        let f = fixture(true);
        let local = trip("t-2");
        f.queue
            .enqueue(EntityKind::Trip, "t-2", Operation::Create, Some(local.clone()))
            .await
            .unwrap();

        f.engine.start_sync().await.unwrap();

        let stored = f.trips.get_by_id("t-2").await.unwrap().unwrap();
        assert_eq!(stored, local);
    }

    #[tokio::test]
    async fn test_delete_removes_remote() {
        let f = fixture(true);
        f.trips.insert(trip("t-3"));
        f.queue
            .enqueue(EntityKind::Trip, "t-3", Operation::Delete, None)
            .await
            .unwrap();

        f.engine.start_sync().await.unwrap();

        assert!(!f.trips.contains("t-3"));
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_the_pass() {
        let f = fixture(true);
        let a = f
            .queue
            .enqueue(EntityKind::Trip, "t-a", Operation::Create, Some(trip("t-a")))
            .await
            .unwrap();
        let b = f
            .queue
            .enqueue(EntityKind::Trip, "t-b", Operation::Create, Some(trip("t-b")))
            .await
            .unwrap();
        let c = f
            .queue
            .enqueue(EntityKind::Trip, "t-c", Operation::Create, Some(trip("t-c")))
            .await
            .unwrap();
        f.trips.fail_entity("t-b", "boom");

        f.engine.start_sync().await.unwrap();

        // a and c synced (and were purged), b failed with the thrown message
        assert!(f.queue.status_of(a.id).is_none());
        assert!(f.queue.status_of(c.id).is_none());
        assert_eq!(f.queue.status_of(b.id), Some(QueueStatus::Failed));
        let remaining = f.queue.get_all().await.unwrap();
        assert_eq!(
            remaining[0].error_message.as_deref(),
            Some("Remote error: boom")
        );
        assert_eq!(f.queue.clear_synced_calls(), 1);
    }

    #[tokio::test]
    async fn test_queue_read_failure_broadcasts_error_and_propagates() {
        let f = fixture(true);
        f.queue.fail_reads("queue unavailable");
        let seen = watch(&f.status);

        let result = f.engine.start_sync().await;

        assert!(result.is_err());
        assert_eq!(f.queue.clear_synced_calls(), 0);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].phase, SyncPhase::Syncing);
        assert_eq!(seen[1].phase, SyncPhase::Error);
    }

    #[tokio::test]
    async fn test_expense_items_use_the_expense_remote() {
        let f = fixture(true);
        let expense =
            Record::new("e-1", Utc::now(), json!({"id": "e-1", "trip_id": "t-1"})).unwrap();
        f.queue
            .enqueue(
                EntityKind::Expense,
                "e-1",
                Operation::Create,
                Some(expense.clone()),
            )
            .await
            .unwrap();

        f.engine.start_sync().await.unwrap();

        assert!(f.expenses.contains("e-1"));
        assert!(!f.trips.contains("e-1"));
    }

    #[tokio::test]
    async fn test_overlapping_trigger_coalesces() {
        let f = fixture(true);
        let engine = Arc::new(f.engine);

        // Hold the pass guard and fire a second trigger
        let _pass = engine.pass_guard.try_lock().unwrap();
        engine.start_sync().await.unwrap();

        // The coalesced trigger did nothing
        assert_eq!(f.queue.read_calls(), 0);
        let _ = f.connectivity; // keep fixture fields alive
    }
}
