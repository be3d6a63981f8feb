//! Notification display through the log and an external command

use std::process::Stdio;
use tidings_api::Payload;
use tidings_config::DisplayCommand;
use tidings_host_api::{HostError, HostEvent, HostResult};
use tidings_util::NotificationId;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Text shown for a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
    pub title: String,
    pub body: String,
}

impl RenderedNotification {
    /// Pick `title` and `body` out of the opaque payload
    pub fn from_payload(id: NotificationId, payload: &Payload) -> Self {
        let text = |key: &str| payload.get(key).and_then(|v| v.as_str()).map(str::to_owned);

        Self {
            title: text("title").unwrap_or_else(|| format!("Notification {id}")),
            body: text("body").unwrap_or_default(),
        }
    }
}

/// Spawn the display command and report a dismissal when it exits successfully.
///
/// Must be called from within a tokio runtime. Returns the child pid.
pub fn spawn_display(
    command: &DisplayCommand,
    id: NotificationId,
    rendered: &RenderedNotification,
    event_tx: mpsc::UnboundedSender<HostEvent>,
) -> HostResult<u32> {
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .arg(&rendered.title)
        .arg(&rendered.body)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .kill_on_drop(false)
        .spawn()
        .map_err(|e| HostError::DisplayFailed(format!("{}: {e}", command.program)))?;

    let pid = child
        .id()
        .ok_or_else(|| HostError::DisplayFailed("display command exited before start".into()))?;

    info!(id = %id, pid, program = %command.program, "Display command started");

    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => {
                debug!(id = %id, pid, "Display command finished, reporting dismissal");
                let _ = event_tx.send(HostEvent::Dismissed { id });
            }
            Ok(status) => warn!(id = %id, pid, status = ?status, "Display command failed"),
            Err(e) => warn!(id = %id, pid, error = %e, "Error waiting for display command"),
        }
    });

    Ok(pid)
}
