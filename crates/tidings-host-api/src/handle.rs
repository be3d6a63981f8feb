//! Display handle abstraction

use serde::{Deserialize, Serialize};
use tidings_util::NotificationId;

/// Opaque handle to a notification shown by the host
///
/// This contains platform-specific identifiers and is created by the
/// host adapter when a notification is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayHandle {
    /// Notification the handle belongs to
    pub id: NotificationId,

    /// Platform-specific payload (opaque to core)
    payload: DisplayHandlePayload,
}

impl DisplayHandle {
    pub fn new(id: NotificationId, payload: DisplayHandlePayload) -> Self {
        Self { id, payload }
    }

    pub fn payload(&self) -> &DisplayHandlePayload {
        &self.payload
    }
}

/// Platform-specific handle payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum DisplayHandlePayload {
    /// Shown through the log only
    Logged,

    /// Shown by an external display command
    Command { pid: u32 },

    /// Mock for testing
    Mock { seq: u64 },
}

impl DisplayHandlePayload {
    /// Get the process ID if applicable
    pub fn pid(&self) -> Option<u32> {
        match self {
            DisplayHandlePayload::Command { pid } => Some(*pid),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_serialization() {
        let handle = DisplayHandle::new(NotificationId::new(3), DisplayHandlePayload::Command { pid: 1234 });

        let json = serde_json::to_string(&handle).unwrap();
        let parsed: DisplayHandle = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, handle);
        assert_eq!(parsed.payload().pid(), Some(1234));
    }

    #[test]
    fn logged_handle_has_no_pid() {
        assert_eq!(DisplayHandlePayload::Logged.pid(), None);
    }
}
