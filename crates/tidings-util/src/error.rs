//! Error types for tidings

use thiserror::Error;

use crate::NotificationId;

/// Core error type for tidings operations
///
/// Every failure the engine can surface for a single request maps onto one of
/// these variants. None of them is fatal to the host process.
#[derive(Debug, Error)]
pub enum TidingsError {
    /// Persisted or submitted request data could not be parsed
    #[error("Malformed request {id:?}: {reason}")]
    MalformedRequest {
        id: Option<NotificationId>,
        reason: String,
    },

    /// The persistence layer failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The platform refused to arm a wake
    #[error("Wake primitive failure: {0}")]
    WakePrimitiveFailure(String),

    /// Rendering or displaying the notification failed
    #[error("Display failure: {0}")]
    DisplayFailure(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TidingsError {
    pub fn malformed(id: Option<NotificationId>, reason: impl Into<String>) -> Self {
        Self::MalformedRequest {
            id,
            reason: reason.into(),
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    pub fn wake(msg: impl Into<String>) -> Self {
        Self::WakePrimitiveFailure(msg.into())
    }

    pub fn display(msg: impl Into<String>) -> Self {
        Self::DisplayFailure(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for per-request data problems that a restore pass skips over
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedRequest { .. })
    }
}

pub type Result<T> = std::result::Result<T, TidingsError>;
