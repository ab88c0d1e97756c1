//! Mutation queue trait and record types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use waypoint_common::{EntityKind, Operation, Record, Result};

/// Lifecycle status of a queued mutation.
///
/// Transitions `Pending -> Syncing -> {Synced | Failed}` are made
/// exclusively by the sync engine. `Failed` items are not reconsidered
/// automatically; an external caller must re-mark them `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Syncing,
    Synced,
    Failed,
}

/// A single recorded local mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    /// Locally unique, monotonically assigned id.
    pub id: i64,
    /// Kind of entity the mutation applies to.
    pub kind: EntityKind,
    /// Entity identifier.
    pub entity_id: String,
    /// Recorded operation.
    pub operation: Operation,
    /// Snapshot of the entity at mutation time, absent for deletes.
    pub payload: Option<Record>,
    /// Current lifecycle status.
    pub status: QueueStatus,
    /// Failure message; set if and only if `status == Failed`.
    pub error_message: Option<String>,
    /// When the mutation was recorded.
    pub created_at: DateTime<Utc>,
}

/// Durable list of pending local mutations.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Record a new mutation with status `Pending`.
    ///
    /// Called by the local-write path whenever a mutation cannot be
    /// confirmed as persisted remotely.
    async fn enqueue(
        &self,
        kind: EntityKind,
        entity_id: &str,
        operation: Operation,
        payload: Option<Record>,
    ) -> Result<QueueItem>;

    /// Read all `Pending` items in creation order.
    async fn get_pending(&self) -> Result<Vec<QueueItem>>;

    /// Read every item regardless of status, in creation order.
    async fn get_all(&self) -> Result<Vec<QueueItem>>;

    /// Update the status of one item.
    ///
    /// `error_message` must be provided exactly when `status` is
    /// `Failed`; it is cleared on every other transition.
    async fn update_status(
        &self,
        id: i64,
        status: QueueStatus,
        error_message: Option<String>,
    ) -> Result<()>;

    /// Remove every `Synced` item in one call.
    async fn clear_synced(&self) -> Result<()>;
}
