//! Local host adapter implementation

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tidings_api::{Payload, WakeRequest};
use tidings_config::DisplayCommand;
use tidings_host_api::{
    DisplayHandle, DisplayHandlePayload, HostAdapter, HostError, HostEvent, HostResult,
};
use tidings_util::NotificationId;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{delay_until, first_fire_at, spawn_display, RenderedNotification};

/// Local host adapter
///
/// Wakes are tokio tasks on the runtime the adapter was created in. They do
/// not survive the process; the daemon re-arms them with a restore pass.
pub struct LocalHost {
    runtime: Handle,
    display: Option<DisplayCommand>,
    wakes: Arc<Mutex<HashMap<NotificationId, JoinHandle<()>>>>,
    event_tx: mpsc::UnboundedSender<HostEvent>,
    event_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<HostEvent>>>>,
}

impl LocalHost {
    /// Create an adapter bound to the current tokio runtime
    pub fn new(display: Option<DisplayCommand>) -> HostResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| HostError::Internal(format!("no tokio runtime: {e}")))?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            runtime,
            display,
            wakes: Arc::new(Mutex::new(HashMap::new())),
            event_tx: tx,
            event_rx: Arc::new(Mutex::new(Some(rx))),
        })
    }

    /// Take the event stream. Only the first call gets it.
    pub fn subscribe(&self) -> Option<mpsc::UnboundedReceiver<HostEvent>> {
        self.event_rx.lock().ok().and_then(|mut rx| rx.take())
    }

    /// Number of wakes that have not finished yet
    pub fn pending_wakes(&self) -> usize {
        self.wakes
            .lock()
            .map(|wakes| wakes.values().filter(|task| !task.is_finished()).count())
            .unwrap_or(0)
    }

    fn wakes(&self) -> HostResult<MutexGuard<'_, HashMap<NotificationId, JoinHandle<()>>>> {
        self.wakes
            .lock()
            .map_err(|_| HostError::Internal("wake table lock poisoned".into()))
    }
}

impl HostAdapter for LocalHost {
    fn arm_wake(&self, wake: &WakeRequest) -> HostResult<()> {
        let now = tidings_util::now_millis();
        let first = first_fire_at(wake, now);
        let delay = delay_until(first, now);
        let period = wake.repeat_period.filter(|p| *p > 0);
        let id = wake.id;
        let tx = self.event_tx.clone();

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(HostEvent::WakeFired { id }).is_err() {
                return;
            }

            if let Some(period) = period {
                let period = std::time::Duration::from_millis(period as u64);
                loop {
                    tokio::time::sleep(period).await;
                    if tx.send(HostEvent::WakeFired { id }).is_err() {
                        return;
                    }
                }
            }
        });

        if let Some(previous) = self.wakes()?.insert(id, task) {
            previous.abort();
        }

        debug!(wake = %wake, first_fire = first, "Local wake armed");
        Ok(())
    }

    fn disarm_wake(&self, id: NotificationId) -> HostResult<()> {
        if let Some(task) = self.wakes()?.remove(&id) {
            task.abort();
            debug!(id = %id, "Local wake disarmed");
        }
        Ok(())
    }

    fn render_and_display(&self, id: NotificationId, payload: &Payload) -> HostResult<DisplayHandle> {
        let rendered = RenderedNotification::from_payload(id, payload);
        info!(id = %id, title = %rendered.title, body = %rendered.body, "Notification");

        let Some(command) = &self.display else {
            return Ok(DisplayHandle::new(id, DisplayHandlePayload::Logged));
        };

        let _guard = self.runtime.enter();
        let pid = spawn_display(command, id, &rendered, self.event_tx.clone())?;
        Ok(DisplayHandle::new(id, DisplayHandlePayload::Command { pid }))
    }

    fn notify_cleared(&self, id: NotificationId, _payload: &Payload) -> HostResult<()> {
        info!(id = %id, "Notification cleared");
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        !self.event_tx.is_closed()
    }
}

impl Drop for LocalHost {
    fn drop(&mut self) {
        if let Ok(wakes) = self.wakes.lock() {
            for task in wakes.values() {
                task.abort();
            }
        }
    }
}
