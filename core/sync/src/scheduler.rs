//! Interval-driven sync triggers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::engine::SyncEngine;

/// Fires the engine on a fixed interval.
///
/// An explicit, owned scheduler resource: `start` spawns a single
/// ticker task and holds its cancellable handle, `stop` aborts it.
/// There is never more than one active timer.
pub struct AutoSync {
    engine: Arc<SyncEngine>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AutoSync {
    /// Create a scheduler wired to the engine.
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self {
            engine,
            task: Mutex::new(None),
        }
    }

    /// Start the repeating timer.
    ///
    /// The first pass fires after one full `period`, not immediately.
    /// Calling this while a timer is already active logs a warning and
    /// changes nothing. Must be called from within a tokio runtime.
    pub fn start(&self, period: Duration) {
        let mut task = self.task.lock().unwrap();
        if task.is_some() {
            warn!("Auto-sync timer already running, ignoring start");
            return;
        }

        info!("Auto-sync started with interval {:?}", period);
        let engine = self.engine.clone();
        *task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                debug!("Auto-sync tick");
                if let Err(err) = engine.start_sync().await {
                    warn!("Auto-sync pass failed: {}", err);
                }
            }
        }));
    }

    /// Cancel the timer. Safe to call when none is running.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
            info!("Auto-sync stopped");
        }
    }

    /// Whether a timer is currently active.
    pub fn is_running(&self) -> bool {
        self.task.lock().unwrap().is_some()
    }
}

impl Drop for AutoSync {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}
