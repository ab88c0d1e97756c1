//! Remote store trait definition.

use async_trait::async_trait;

use waypoint_common::{EntityKind, Record, Result};

/// CRUD client against the authoritative store for one entity kind.
///
/// Implementations must handle their own authentication, timeouts and
/// rate limiting; the sync engine inherits whatever call semantics the
/// backend provides.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The entity kind this store serves.
    fn kind(&self) -> EntityKind;

    /// Fetch the current remote version of an entity.
    ///
    /// # Postconditions
    /// - Returns `Ok(None)` when the entity does not exist remotely;
    ///   absence is an answer, not an error.
    ///
    /// # Errors
    /// - Network/backend errors
    async fn get_by_id(&self, id: &str) -> Result<Option<Record>>;

    /// Push a whole-record snapshot to the remote store.
    ///
    /// # Postconditions
    /// - The entity exists remotely with the given snapshot (upsert)
    /// - Returns the stored version
    async fn update(&self, id: &str, record: &Record) -> Result<Record>;

    /// Delete an entity by id.
    ///
    /// # Errors
    /// - Network/backend errors
    async fn delete(&self, id: &str) -> Result<()>;

    /// Fetch all entities owned by `owner_id`.
    async fn get_all(&self, owner_id: &str) -> Result<Vec<Record>>;

    /// Fetch all entities belonging to a parent entity.
    ///
    /// Used for the child kind (expenses of one trip).
    async fn get_by_parent(&self, parent_id: &str) -> Result<Vec<Record>>;
}
