//! Host adapter traits

use tidings_api::{Payload, WakeRequest};
use thiserror::Error;
use tidings_util::{NotificationId, TidingsError};

use crate::DisplayHandle;

/// Errors from host adapter operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Wake refused: {0}")]
    WakeRefused(String),

    #[error("Display failed: {0}")]
    DisplayFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

impl From<HostError> for TidingsError {
    fn from(e: HostError) -> Self {
        match e {
            HostError::WakeRefused(msg) => TidingsError::WakePrimitiveFailure(msg),
            HostError::DisplayFailed(msg) => TidingsError::DisplayFailure(msg),
            other => TidingsError::Internal(other.to_string()),
        }
    }
}

/// Events raised by the host towards the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A previously armed wake has fired
    WakeFired { id: NotificationId },

    /// The user dismissed a displayed notification
    Dismissed { id: NotificationId },
}

/// Host adapter trait - implemented by platform-specific adapters
///
/// All calls are synchronous and may fail; the engine never retries them.
pub trait HostAdapter: Send + Sync {
    /// Register a future callback for `wake.id`, replacing any existing one
    fn arm_wake(&self, wake: &WakeRequest) -> HostResult<()>;

    /// Cancel the wake registered for `id`, if any
    fn disarm_wake(&self, id: NotificationId) -> HostResult<()>;

    /// Build and show the user-visible notification
    fn render_and_display(&self, id: NotificationId, payload: &Payload) -> HostResult<DisplayHandle>;

    /// Tell the host application layer a notification was dismissed
    fn notify_cleared(&self, _id: NotificationId, _payload: &Payload) -> HostResult<()> {
        Ok(())
    }

    /// Optional: check if the host adapter is healthy
    fn is_healthy(&self) -> bool {
        true
    }
}
