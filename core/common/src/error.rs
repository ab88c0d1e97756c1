//! Common error types for Waypoint.

use thiserror::Error;

/// Top-level error type for Waypoint operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Remote store operation failed.
    #[error("Remote error: {0}")]
    Remote(String),

    /// Local cache operation failed.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Queue store operation failed.
    #[error("Queue error: {0}")]
    Queue(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
