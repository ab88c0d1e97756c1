//! Common types used throughout Waypoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of entity tracked by the sync engine.
///
/// This is a closed set: the queue and the remote stores only ever
/// carry trips and the expenses that belong to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Trip,
    Expense,
}

impl EntityKind {
    /// Get the kind name as used in logs and queue records.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Trip => "trip",
            EntityKind::Expense => "expense",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutation operation recorded against an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// A whole-record snapshot of an entity.
///
/// The engine only ever inspects `id` and `updated_at`; everything else
/// is opaque payload carried in `data` and handed back to the remote
/// store untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Entity identifier.
    pub id: String,
    /// Last modification time, used for last-write-wins arbitration.
    pub updated_at: DateTime<Utc>,
    /// Opaque entity fields.
    pub data: serde_json::Value,
}

impl Record {
    /// Create a new record snapshot.
    ///
    /// # Preconditions
    /// - `id` must be non-empty
    ///
    /// # Errors
    /// - Returns error if id is empty
    pub fn new(
        id: impl Into<String>,
        updated_at: DateTime<Utc>,
        data: serde_json::Value,
    ) -> crate::Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Record id cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            updated_at,
            data,
        })
    }

    /// Read a string field out of the opaque payload, if present.
    ///
    /// Used by stores that index on payload fields such as `owner_id`
    /// or `trip_id`.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }
}
