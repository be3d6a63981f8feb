//! Schedule engine: applies reconcile plans to the store and host

use std::sync::Arc;
use tidings_api::NotificationRequest;
use tidings_host_api::HostAdapter;
use tidings_store::{FiredHistory, NotificationStore};
use tidings_util::{NotificationId, Result, TidingsError};
use tracing::{debug, info, warn};

use crate::{plan, Action, Plan};

/// The scheduling engine
///
/// Holds no state of its own beyond the injected store and host.
pub struct ScheduleEngine {
    store: Arc<dyn NotificationStore>,
    host: Arc<dyn HostAdapter>,
}

impl ScheduleEngine {
    pub fn new(store: Arc<dyn NotificationStore>, host: Arc<dyn HostAdapter>) -> Self {
        Self { store, host }
    }

    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    pub fn host(&self) -> &Arc<dyn HostAdapter> {
        &self.host
    }

    /// Persist a new request and reconcile it
    pub fn schedule(&self, request: &NotificationRequest, now: i64) -> Result<Plan> {
        request.validate()?;
        self.store.save(request)?;

        info!(
            id = %request.id,
            at_time = request.at_time,
            repeat_interval = request.repeat_interval,
            alert_while_idle = request.alert_while_idle,
            "Notification scheduled"
        );

        self.reconcile(request, now, None, false)
    }

    /// Disarm any wake for `id` and forget the request. Idempotent.
    pub fn cancel(&self, id: NotificationId) -> Result<()> {
        let disarmed = self.host.disarm_wake(id).map_err(TidingsError::from);
        if let Err(e) = &disarmed {
            warn!(id = %id, error = %e, "Failed to disarm wake");
        }

        self.store.remove(id)?;
        info!(id = %id, "Notification cancelled");
        disarmed
    }

    /// Decide what to do with `request`, without side effects
    pub fn plan(
        &self,
        request: &NotificationRequest,
        now: i64,
        fired: Option<&FiredHistory>,
        skip_immediate: bool,
    ) -> Plan {
        plan(request, now, fired, skip_immediate)
    }

    /// Plan and apply
    ///
    /// Returns the applied plan. If any action failed, every other action was
    /// still attempted and the first failure is returned.
    pub fn reconcile(
        &self,
        request: &NotificationRequest,
        now: i64,
        fired: Option<&FiredHistory>,
        skip_immediate: bool,
    ) -> Result<Plan> {
        request.validate()?;

        let plan = self.plan(request, now, fired, skip_immediate);
        debug!(id = %request.id, now, actions = ?plan.actions(), "Reconciling");

        self.apply(request, &plan, now)?;
        Ok(plan)
    }

    /// Apply the actions of `plan` in order
    pub fn apply(&self, request: &NotificationRequest, plan: &Plan, now: i64) -> Result<()> {
        let mut first_error = None;

        for action in plan.actions() {
            if let Err(e) = self.apply_action(request, action, now) {
                warn!(id = %request.id, action = ?action, error = %e, "Action failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn apply_action(&self, request: &NotificationRequest, action: &Action, now: i64) -> Result<()> {
        match action {
            Action::DeliverNow { reason } => {
                // Record first so a failed display is not delivered again
                self.store.register_fired(request.id, now)?;
                let handle = self.host.render_and_display(request.id, &request.payload)?;
                info!(id = %request.id, reason = ?reason, handle = ?handle.payload(), "Notification delivered");
            }
            Action::Expire => {
                self.store.remove(request.id)?;
                info!(id = %request.id, at_time = request.at_time, "Expired notification removed");
            }
            Action::ArmWake(wake) => {
                self.host.arm_wake(wake)?;
                debug!(id = %request.id, wake = %wake, "Wake armed");
            }
        }
        Ok(())
    }
}
