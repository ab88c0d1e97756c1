//! Connectivity-driven sync triggers.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use waypoint_storage::{Connectivity, ConnectivityEvent};

use crate::engine::SyncEngine;
use crate::status::{StatusBus, SyncStatus, OFFLINE_MESSAGE};

/// Observes connectivity transitions and triggers the engine.
///
/// No polling: one initial connectivity check when monitoring starts,
/// then purely event-driven transitions. Stopping only suppresses
/// future triggers; a pass already in flight keeps running.
pub struct NetworkMonitor {
    connectivity: Arc<dyn Connectivity>,
    engine: Arc<SyncEngine>,
    status: Arc<StatusBus>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NetworkMonitor {
    /// Create a monitor wired to the engine and status bus.
    pub fn new(
        connectivity: Arc<dyn Connectivity>,
        engine: Arc<SyncEngine>,
        status: Arc<StatusBus>,
    ) -> Self {
        Self {
            connectivity,
            engine,
            status,
            task: Mutex::new(None),
        }
    }

    /// Start monitoring.
    ///
    /// Registers for connectivity transitions, then evaluates current
    /// connectivity once and broadcasts `Idle` (with the offline
    /// message only when currently offline). Must be called from within
    /// a tokio runtime. Calling it while already started is a no-op.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap();
        if task.is_some() {
            warn!("Network monitoring already started, ignoring");
            return;
        }

        // Subscribe before the initial check so no transition slips
        // between the two.
        let mut events = self.connectivity.events();

        if self.connectivity.is_online() {
            self.status.broadcast(SyncStatus::idle());
        } else {
            self.status.broadcast(SyncStatus::idle_with(OFFLINE_MESSAGE));
        }

        let engine = self.engine.clone();
        let status = self.status.clone();
        *task = Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ConnectivityEvent::Online) => {
                        info!("Connectivity restored, triggering sync");
                        // Fire-and-forget: the pass guard coalesces this
                        // with any concurrently running pass.
                        let engine = engine.clone();
                        tokio::spawn(async move {
                            if let Err(err) = engine.start_sync().await {
                                warn!("Connectivity-triggered sync failed: {}", err);
                            }
                        });
                    }
                    Ok(ConnectivityEvent::Offline) => {
                        debug!("Connectivity lost");
                        status.broadcast(SyncStatus::idle_with(OFFLINE_MESSAGE));
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Missed {} connectivity events", missed);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }

    /// Stop monitoring; subsequent connectivity transitions trigger
    /// nothing. Safe to call when not running.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
            info!("Network monitoring stopped");
        }
    }

    /// Whether the monitor task is currently active.
    pub fn is_running(&self) -> bool {
        self.task.lock().unwrap().is_some()
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}
