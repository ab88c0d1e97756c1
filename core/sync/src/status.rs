//! Synchronous status broadcast bus.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Fixed message broadcast when a queue pass completes.
pub const SYNC_COMPLETE_MESSAGE: &str = "All changes synced";
/// Fixed message broadcast while the device is offline.
pub const OFFLINE_MESSAGE: &str = "Offline mode - changes will sync when you reconnect";
/// Fixed message broadcast when a full resync starts.
pub const FULL_SYNC_MESSAGE: &str = "Syncing everything";
/// Fixed message broadcast when a full resync completes.
pub const FULL_SYNC_COMPLETE_MESSAGE: &str = "Full sync complete";
/// Generic failure message broadcast when a full resync fails.
pub const SYNC_FAILED_MESSAGE: &str = "Sync failed";

/// Coarse sync phase visible to the rest of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    Idle,
    Syncing,
    Synced,
    Error,
}

/// Runtime-only sync state broadcast to listeners. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub phase: SyncPhase,
    pub message: Option<String>,
}

impl SyncStatus {
    pub fn idle() -> Self {
        Self {
            phase: SyncPhase::Idle,
            message: None,
        }
    }

    pub fn idle_with(message: impl Into<String>) -> Self {
        Self {
            phase: SyncPhase::Idle,
            message: Some(message.into()),
        }
    }

    pub fn syncing() -> Self {
        Self {
            phase: SyncPhase::Syncing,
            message: None,
        }
    }

    pub fn syncing_with(message: impl Into<String>) -> Self {
        Self {
            phase: SyncPhase::Syncing,
            message: Some(message.into()),
        }
    }

    pub fn synced(message: impl Into<String>) -> Self {
        Self {
            phase: SyncPhase::Synced,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            phase: SyncPhase::Error,
            message: Some(message.into()),
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phase = match self.phase {
            SyncPhase::Idle => "idle",
            SyncPhase::Syncing => "syncing",
            SyncPhase::Synced => "synced",
            SyncPhase::Error => "error",
        };
        match &self.message {
            Some(message) => write!(f, "{}: {}", phase, message),
            None => write!(f, "{}", phase),
        }
    }
}

type Listener = Box<dyn Fn(&SyncStatus) + Send + Sync>;
type Registry = Arc<Mutex<Vec<(u64, Listener)>>>;

/// Publish/subscribe broadcast of sync state.
///
/// The bus exclusively owns its listener registry; subscribe and
/// unsubscribe are the only mutators. Broadcasts are synchronous
/// fan-out in registration order, and there is no replay: a listener
/// registered after a broadcast never sees it.
///
/// Listeners must not subscribe or unsubscribe from inside a callback;
/// the registry lock is held for the duration of a broadcast.
pub struct StatusBus {
    registry: Registry,
    next_id: AtomicU64,
}

impl StatusBus {
    /// Create a bus with an empty registry.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener for every subsequent broadcast.
    pub fn subscribe(&self, listener: impl Fn(&SyncStatus) + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.registry
            .lock()
            .unwrap()
            .push((id, Box::new(listener)));
        Subscription {
            registry: self.registry.clone(),
            id,
        }
    }

    /// Deliver a status to every currently-registered listener,
    /// synchronously, in registration order.
    pub fn broadcast(&self, status: SyncStatus) {
        let listeners = self.registry.lock().unwrap();
        for (_, listener) in listeners.iter() {
            listener(&status);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.lock().unwrap().len()
    }
}

impl Default for StatusBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one registered listener.
///
/// Unsubscribing is explicit; dropping the handle leaves the listener
/// registered.
pub struct Subscription {
    registry: Registry,
    id: u64,
}

impl Subscription {
    /// Remove exactly this listener. Other listeners are unaffected.
    pub fn unsubscribe(self) {
        self.registry.lock().unwrap().retain(|(id, _)| *id != self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collector() -> (Arc<Mutex<Vec<SyncStatus>>>, impl Fn(&SyncStatus) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |status: &SyncStatus| {
            sink.lock().unwrap().push(status.clone())
        })
    }

    #[test]
    fn test_broadcast_reaches_all_listeners() {
        let bus = StatusBus::new();
        let (seen_a, listener_a) = collector();
        let (seen_b, listener_b) = collector();
        let _sub_a = bus.subscribe(listener_a);
        let _sub_b = bus.subscribe(listener_b);

        bus.broadcast(SyncStatus::syncing());

        assert_eq!(seen_a.lock().unwrap().len(), 1);
        assert_eq!(seen_b.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unsubscribe_removes_exactly_one_listener() {
        let bus = StatusBus::new();
        let (seen_a, listener_a) = collector();
        let (seen_b, listener_b) = collector();
        let sub_a = bus.subscribe(listener_a);
        let _sub_b = bus.subscribe(listener_b);

        bus.broadcast(SyncStatus::syncing());
        sub_a.unsubscribe();
        bus.broadcast(SyncStatus::synced(SYNC_COMPLETE_MESSAGE));

        assert_eq!(seen_a.lock().unwrap().len(), 1);
        assert_eq!(seen_b.lock().unwrap().len(), 2);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let bus = StatusBus::new();
        bus.broadcast(SyncStatus::error("lost"));

        let (seen, listener) = collector();
        let _sub = bus.subscribe(listener);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let bus = StatusBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = order.clone();
            let _never_unsubscribed = bus.subscribe(move |_| order.lock().unwrap().push(tag));
        }

        bus.broadcast(SyncStatus::idle());
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }
}
