//! Wake-fired handling

use tidings_host_api::DisplayHandle;
use tidings_util::{NotificationId, Result};
use tracing::{debug, info};

use crate::ScheduleEngine;

/// Result of handling a fired wake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    /// No request is persisted under the id (cancelled or expired meanwhile)
    Missing,
    Delivered(DisplayHandle),
}

/// Delivers the notification for a wake that fired
pub struct FireCoordinator<'a> {
    engine: &'a ScheduleEngine,
}

impl<'a> FireCoordinator<'a> {
    pub fn new(engine: &'a ScheduleEngine) -> Self {
        Self { engine }
    }

    /// Register the firing, then display. Never removes or re-arms.
    pub fn on_fired(&self, id: NotificationId, now: i64) -> Result<FireOutcome> {
        let store = self.engine.store();

        let Some(request) = store.get(id)? else {
            debug!(id = %id, "Wake fired for unknown notification");
            return Ok(FireOutcome::Missing);
        };

        store.register_fired(id, now)?;
        let handle = self.engine.host().render_and_display(id, &request.payload)?;

        info!(id = %id, fired_at = now, "Notification fired");
        Ok(FireOutcome::Delivered(handle))
    }
}
