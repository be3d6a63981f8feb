//! Persistence layer for tidings
//!
//! Two namespaces keyed by notification id, both surviving restarts:
//! - requests: the serialized notification request
//! - fired: timestamp of the last registered firing
//!
//! Removing a request always removes its fired record in the same operation.

mod memory;
mod sqlite;
mod traits;

pub use memory::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;
use tidings_util::{NotificationId, TidingsError};

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Malformed request {id:?}: {reason}")]
    Malformed {
        id: Option<NotificationId>,
        reason: String,
    },

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<StoreError> for TidingsError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Malformed { id, reason } => TidingsError::MalformedRequest { id, reason },
            other => TidingsError::StoreUnavailable(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
