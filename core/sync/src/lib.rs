//! Waypoint Sync Engine
//!
//! This module provides offline-first synchronization for Waypoint, including:
//! - A queue drain that replays pending local mutations against the remote store
//! - Last-write-wins conflict resolution
//! - Connectivity- and timer-driven sync triggers
//! - A synchronous status broadcast bus
//! - Cache hydration and full resync
//!
//! The engine mutates only the mutation queue; the hydrator mutates only
//! the local caches. Everything else it touches is behind the
//! collaborator traits in `waypoint_storage`.

pub mod engine;
pub mod hydrator;
pub mod monitor;
pub mod resolver;
pub mod scheduler;
pub mod service;
pub mod status;

// Re-export main types
pub use engine::SyncEngine;
pub use hydrator::{Hydrator, QueueStats};
pub use monitor::NetworkMonitor;
pub use resolver::resolve;
pub use scheduler::AutoSync;
pub use service::{SyncConfig, SyncService, SyncStores};
pub use status::{StatusBus, Subscription, SyncPhase, SyncStatus};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        // Verify the main types are accessible
        let _config = SyncConfig::default();
        let _bus = StatusBus::new();
        let _status = SyncStatus::idle();
    }
}
