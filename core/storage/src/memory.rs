//! In-memory store implementations for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;

use waypoint_common::{EntityKind, Error, Operation, Record, Result};

use crate::cache::LocalCache;
use crate::platform::{Connectivity, ConnectivityEvent};
use crate::queue::{QueueItem, QueueStatus, QueueStore};
use crate::remote::RemoteStore;

/// In-memory remote store.
///
/// Useful for testing and development. All data is stored in memory and
/// lost on drop. Ownership filtering reads the `owner_id` payload field
/// and parent filtering reads `trip_id`. Failures can be injected
/// globally or per entity id to exercise error paths.
pub struct MemoryRemote {
    kind: EntityKind,
    records: Arc<RwLock<HashMap<String, Record>>>,
    fail_all: RwLock<Option<String>>,
    fail_for: RwLock<HashMap<String, String>>,
    calls: AtomicUsize,
}

impl MemoryRemote {
    /// Create an empty remote store for one entity kind.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            records: Arc::new(RwLock::new(HashMap::new())),
            fail_all: RwLock::new(None),
            fail_for: RwLock::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Seed a record directly, bypassing the trait surface.
    pub fn insert(&self, record: Record) {
        self.records
            .write()
            .unwrap()
            .insert(record.id.clone(), record);
    }

    /// Make every call fail with the given message until cleared.
    pub fn set_failure(&self, message: impl Into<String>) {
        *self.fail_all.write().unwrap() = Some(message.into());
    }

    /// Clear a global failure.
    pub fn clear_failure(&self) {
        *self.fail_all.write().unwrap() = None;
    }

    /// Make calls touching one entity id fail with the given message.
    pub fn fail_entity(&self, id: impl Into<String>, message: impl Into<String>) {
        self.fail_for
            .write()
            .unwrap()
            .insert(id.into(), message.into());
    }

    /// Number of trait calls served (including failed ones).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether an entity currently exists remotely.
    pub fn contains(&self, id: &str) -> bool {
        self.records.read().unwrap().contains_key(id)
    }

    fn check(&self, id: Option<&str>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_all.read().unwrap().as_ref() {
            return Err(Error::Remote(message.clone()));
        }
        if let Some(id) = id {
            if let Some(message) = self.fail_for.read().unwrap().get(id) {
                return Err(Error::Remote(message.clone()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Record>> {
        self.check(Some(id))?;
        Ok(self.records.read().unwrap().get(id).cloned())
    }

    async fn update(&self, id: &str, record: &Record) -> Result<Record> {
        self.check(Some(id))?;
        self.records
            .write()
            .unwrap()
            .insert(id.to_string(), record.clone());
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check(Some(id))?;
        self.records.write().unwrap().remove(id);
        Ok(())
    }

    async fn get_all(&self, owner_id: &str) -> Result<Vec<Record>> {
        self.check(None)?;
        let mut records: Vec<Record> = self
            .records
            .read()
            .unwrap()
            .values()
            .filter(|r| r.field_str("owner_id") == Some(owner_id))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn get_by_parent(&self, parent_id: &str) -> Result<Vec<Record>> {
        self.check(None)?;
        let mut records: Vec<Record> = self
            .records
            .read()
            .unwrap()
            .values()
            .filter(|r| r.field_str("trip_id") == Some(parent_id))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}

/// In-memory local cache for one entity kind.
pub struct MemoryCache {
    records: Arc<RwLock<HashMap<String, Record>>>,
    save_many_calls: AtomicUsize,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            save_many_calls: AtomicUsize::new(0),
        }
    }

    /// Number of entities currently cached.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }

    /// Number of `save_many` calls served.
    pub fn save_many_calls(&self) -> usize {
        self.save_many_calls.load(Ordering::SeqCst)
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalCache for MemoryCache {
    async fn save(&self, record: &Record) -> Result<()> {
        self.records
            .write()
            .unwrap()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn save_many(&self, records: &[Record]) -> Result<()> {
        self.save_many_calls.fetch_add(1, Ordering::SeqCst);
        let mut map = self.records.write().unwrap();
        for record in records {
            map.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Record>> {
        let mut records: Vec<Record> = self.records.read().unwrap().values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Record>> {
        Ok(self.records.read().unwrap().get(id).cloned())
    }

    async fn delete(&self, id: &str, _optimistic: bool) -> Result<()> {
        self.records.write().unwrap().remove(id);
        Ok(())
    }
}

/// In-memory mutation queue with monotonically assigned ids.
pub struct MemoryQueue {
    items: Arc<RwLock<Vec<QueueItem>>>,
    next_id: AtomicI64,
    fail_reads: RwLock<Option<String>>,
    read_calls: AtomicUsize,
    clear_synced_calls: AtomicUsize,
}

impl MemoryQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicI64::new(1),
            fail_reads: RwLock::new(None),
            read_calls: AtomicUsize::new(0),
            clear_synced_calls: AtomicUsize::new(0),
        }
    }

    /// Make every read fail with the given message until cleared.
    pub fn fail_reads(&self, message: impl Into<String>) {
        *self.fail_reads.write().unwrap() = Some(message.into());
    }

    /// Clear an injected read failure.
    pub fn clear_read_failure(&self) {
        *self.fail_reads.write().unwrap() = None;
    }

    /// Number of `get_pending`/`get_all` calls served.
    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    /// Number of `clear_synced` calls served.
    pub fn clear_synced_calls(&self) -> usize {
        self.clear_synced_calls.load(Ordering::SeqCst)
    }

    /// Current status of one item, if present.
    pub fn status_of(&self, id: i64) -> Option<QueueStatus> {
        self.items
            .read()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.status)
    }

    fn check_read(&self) -> Result<()> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_reads.read().unwrap().as_ref() {
            return Err(Error::Queue(message.clone()));
        }
        Ok(())
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueStore for MemoryQueue {
    async fn enqueue(
        &self,
        kind: EntityKind,
        entity_id: &str,
        operation: Operation,
        payload: Option<Record>,
    ) -> Result<QueueItem> {
        if operation != Operation::Delete && payload.is_none() {
            return Err(Error::InvalidInput(
                "Payload required for create/update mutations".to_string(),
            ));
        }
        let item = QueueItem {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            kind,
            entity_id: entity_id.to_string(),
            operation,
            payload,
            status: QueueStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
        };
        self.items.write().unwrap().push(item.clone());
        Ok(item)
    }

    async fn get_pending(&self) -> Result<Vec<QueueItem>> {
        self.check_read()?;
        Ok(self
            .items
            .read()
            .unwrap()
            .iter()
            .filter(|i| i.status == QueueStatus::Pending)
            .cloned()
            .collect())
    }

    async fn get_all(&self) -> Result<Vec<QueueItem>> {
        self.check_read()?;
        Ok(self.items.read().unwrap().clone())
    }

    async fn update_status(
        &self,
        id: i64,
        status: QueueStatus,
        error_message: Option<String>,
    ) -> Result<()> {
        let mut items = self.items.write().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::NotFound(format!("Queue item not found: {}", id)))?;
        item.status = status;
        item.error_message = if status == QueueStatus::Failed {
            error_message
        } else {
            None
        };
        Ok(())
    }

    async fn clear_synced(&self) -> Result<()> {
        self.clear_synced_calls.fetch_add(1, Ordering::SeqCst);
        self.items
            .write()
            .unwrap()
            .retain(|i| i.status != QueueStatus::Synced);
        Ok(())
    }
}

/// Manually driven connectivity signal for tests and the demo CLI.
pub struct ManualConnectivity {
    online: AtomicBool,
    sender: broadcast::Sender<ConnectivityEvent>,
}

impl ManualConnectivity {
    /// Create a signal with the given initial state.
    pub fn new(online: bool) -> Self {
        let (sender, _) = broadcast::channel(16);
        Self {
            online: AtomicBool::new(online),
            sender,
        }
    }

    /// Flip connectivity and notify subscribers of the transition.
    pub fn set_online(&self, online: bool) {
        let was = self.online.swap(online, Ordering::SeqCst);
        if was != online {
            let event = if online {
                ConnectivityEvent::Online
            } else {
                ConnectivityEvent::Offline
            };
            // No subscribers is fine; send only fails when empty.
            let _ = self.sender.send(event);
        }
    }
}

impl Connectivity for ManualConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn events(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.sender.subscribe()
    }
}
