//! Collaborator contracts consumed by the Waypoint sync engine.
//!
//! This module provides trait-based interfaces for the three durable
//! stores the engine works against (remote store, local cache, mutation
//! queue) plus the platform connectivity signal, and in-memory
//! implementations of each for testing and development.
//!
//! # Design Principles
//! - Backend isolation: no transport-specific logic in the sync engine
//! - Async operations: every store access is a suspension point
//! - "Not found" on a point read is `Ok(None)`, never an error
//! - Unified error semantics via `waypoint_common::Error`

pub mod cache;
pub mod memory;
pub mod platform;
pub mod queue;
pub mod remote;

pub use cache::LocalCache;
pub use memory::{ManualConnectivity, MemoryCache, MemoryQueue, MemoryRemote};
pub use platform::{Connectivity, ConnectivityEvent};
pub use queue::{QueueItem, QueueStatus, QueueStore};
pub use remote::RemoteStore;
