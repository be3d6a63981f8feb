//! Mock host adapter for testing

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tidings_api::{Payload, WakeRequest};
use tidings_util::NotificationId;

use crate::{DisplayHandle, DisplayHandlePayload, HostAdapter, HostError, HostResult};

/// Mock host adapter for unit/integration testing
///
/// Records every call. Armed wakes follow cancel-then-set semantics per id.
pub struct MockHost {
    next_seq: AtomicU64,
    wakes: Arc<Mutex<HashMap<NotificationId, WakeRequest>>>,
    arm_history: Arc<Mutex<Vec<WakeRequest>>>,
    displayed: Arc<Mutex<Vec<(NotificationId, Payload)>>>,
    cleared: Arc<Mutex<Vec<(NotificationId, Payload)>>>,

    /// Configure arm_wake to fail
    pub fail_arm: Arc<Mutex<bool>>,

    /// Configure render_and_display to fail
    pub fail_display: Arc<Mutex<bool>>,

    /// Configure notify_cleared to fail
    pub fail_cleared: Arc<Mutex<bool>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            next_seq: AtomicU64::new(1),
            wakes: Arc::new(Mutex::new(HashMap::new())),
            arm_history: Arc::new(Mutex::new(Vec::new())),
            displayed: Arc::new(Mutex::new(Vec::new())),
            cleared: Arc::new(Mutex::new(Vec::new())),
            fail_arm: Arc::new(Mutex::new(false)),
            fail_display: Arc::new(Mutex::new(false)),
            fail_cleared: Arc::new(Mutex::new(false)),
        }
    }

    /// Wake currently armed for `id`
    pub fn armed(&self, id: NotificationId) -> Option<WakeRequest> {
        self.wakes.lock().unwrap().get(&id).copied()
    }

    /// Number of ids with an armed wake
    pub fn armed_count(&self) -> usize {
        self.wakes.lock().unwrap().len()
    }

    /// Every successful arm_wake call, in order
    pub fn arm_history(&self) -> Vec<WakeRequest> {
        self.arm_history.lock().unwrap().clone()
    }

    /// Ids displayed so far, in order
    pub fn displayed(&self) -> Vec<NotificationId> {
        self.displayed
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of times `id` was displayed
    pub fn display_count(&self, id: NotificationId) -> usize {
        self.displayed
            .lock()
            .unwrap()
            .iter()
            .filter(|(shown, _)| *shown == id)
            .count()
    }

    /// Cleared callbacks received, in order
    pub fn cleared(&self) -> Vec<(NotificationId, Payload)> {
        self.cleared.lock().unwrap().clone()
    }

    /// Forget recorded calls but keep armed wakes
    pub fn clear_history(&self) {
        self.arm_history.lock().unwrap().clear();
        self.displayed.lock().unwrap().clear();
        self.cleared.lock().unwrap().clear();
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostAdapter for MockHost {
    fn arm_wake(&self, wake: &WakeRequest) -> HostResult<()> {
        if *self.fail_arm.lock().unwrap() {
            return Err(HostError::WakeRefused("Mock arm failure".into()));
        }

        self.wakes.lock().unwrap().insert(wake.id, *wake);
        self.arm_history.lock().unwrap().push(*wake);
        Ok(())
    }

    fn disarm_wake(&self, id: NotificationId) -> HostResult<()> {
        self.wakes.lock().unwrap().remove(&id);
        Ok(())
    }

    fn render_and_display(&self, id: NotificationId, payload: &Payload) -> HostResult<DisplayHandle> {
        if *self.fail_display.lock().unwrap() {
            return Err(HostError::DisplayFailed("Mock display failure".into()));
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.displayed.lock().unwrap().push((id, payload.clone()));
        Ok(DisplayHandle::new(id, DisplayHandlePayload::Mock { seq }))
    }

    fn notify_cleared(&self, id: NotificationId, payload: &Payload) -> HostResult<()> {
        if *self.fail_cleared.lock().unwrap() {
            return Err(HostError::Internal("Mock cleared callback failure".into()));
        }

        self.cleared.lock().unwrap().push((id, payload.clone()));
        Ok(())
    }
}
