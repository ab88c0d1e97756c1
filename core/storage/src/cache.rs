//! Local cache trait definition.

use async_trait::async_trait;

use waypoint_common::{Record, Result};

/// Durable mirror of one entity kind for offline reads.
///
/// The cache is only ever written by the hydrator (bulk pulls) and the
/// out-of-scope local-write path; the sync engine itself never touches
/// it during a queue pass.
#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Save a single entity snapshot.
    async fn save(&self, record: &Record) -> Result<()>;

    /// Save a batch of entity snapshots in one call.
    async fn save_many(&self, records: &[Record]) -> Result<()>;

    /// Read all cached entities.
    async fn get_all(&self) -> Result<Vec<Record>>;

    /// Read one cached entity, `Ok(None)` when absent.
    async fn get_by_id(&self, id: &str) -> Result<Option<Record>>;

    /// Remove a cached entity.
    ///
    /// `optimistic` marks a local delete that has not yet been
    /// confirmed remotely.
    async fn delete(&self, id: &str, optimistic: bool) -> Result<()>;
}
