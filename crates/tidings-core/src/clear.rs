//! Dismissal handling

use tidings_api::WakeRequest;
use tidings_util::{NotificationId, Result, TidingsError};
use tracing::{debug, info, warn};

use crate::ScheduleEngine;

/// Result of handling a dismissal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// No request is persisted under the id
    Missing,
    /// One-shot request removed
    Removed,
    /// Repeating idle-capable request armed for its next occurrence
    Rearmed(Option<WakeRequest>),
    /// Repeating request left to the platform repetition
    LeftRepeating,
}

/// Reacts to the user dismissing a notification
pub struct ClearCoordinator<'a> {
    engine: &'a ScheduleEngine,
}

impl<'a> ClearCoordinator<'a> {
    pub fn new(engine: &'a ScheduleEngine) -> Self {
        Self { engine }
    }

    /// Remove or re-arm the dismissed request, then tell the host application.
    ///
    /// The cleared callback runs even if re-arming failed; that failure is
    /// returned afterwards.
    pub fn on_cleared(&self, id: NotificationId, now: i64) -> Result<ClearOutcome> {
        let store = self.engine.store();

        let Some(request) = store.get(id)? else {
            debug!(id = %id, "Dismissal for unknown notification");
            return Ok(ClearOutcome::Missing);
        };

        let handled = if !request.is_repeating() {
            store
                .remove(id)
                .map(|_| ClearOutcome::Removed)
                .map_err(TidingsError::from)
        } else if request.alert_while_idle {
            self.engine
                .reconcile(&request, now, None, true)
                .map(|plan| ClearOutcome::Rearmed(plan.wake().copied()))
        } else {
            Ok(ClearOutcome::LeftRepeating)
        };

        if let Err(e) = &handled {
            warn!(id = %id, error = %e, "Failed to update dismissed notification");
        }

        self.engine.host().notify_cleared(id, &request.payload)?;

        let outcome = handled?;
        info!(id = %id, outcome = ?outcome, "Notification cleared");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tidings_api::NotificationRequest;
    use tidings_host_api::MockHost;
    use tidings_store::{MemoryStore, NotificationStore};
    use tidings_util::DAY_MILLIS;

    const NOW: i64 = 1_750_000_000_000;

    fn setup() -> (Arc<MemoryStore>, Arc<MockHost>, ScheduleEngine) {
        let store = Arc::new(MemoryStore::new());
        let host = Arc::new(MockHost::new());
        let engine = ScheduleEngine::new(store.clone(), host.clone());
        (store, host, engine)
    }

    #[test]
    fn missing_request_skips_callback() {
        let (_store, host, engine) = setup();
        let outcome = ClearCoordinator::new(&engine).on_cleared(NotificationId::new(1), NOW).unwrap();
        assert_eq!(outcome, ClearOutcome::Missing);
        assert!(host.cleared().is_empty());
    }

    #[test]
    fn one_shot_is_removed() {
        let (store, host, engine) = setup();
        let request = NotificationRequest::new(2).with_field("title", "Done");
        store.save(&request).unwrap();
        store.register_fired(request.id, NOW).unwrap();

        let outcome = ClearCoordinator::new(&engine).on_cleared(request.id, NOW).unwrap();

        assert_eq!(outcome, ClearOutcome::Removed);
        assert!(store.get(request.id).unwrap().is_none());
        assert_eq!(store.last_fired(request.id).unwrap(), 0);
        assert_eq!(host.cleared(), vec![(request.id, request.payload.clone())]);
    }

    #[test]
    fn repeating_idle_is_rearmed_after_now() {
        let (store, host, engine) = setup();
        let request = NotificationRequest::new(3)
            .with_at_time(NOW - 90_000_000)
            .with_repeat_interval(DAY_MILLIS)
            .with_alert_while_idle(true);
        store.save(&request).unwrap();
        store.register_fired(request.id, NOW - 90_000_000).unwrap();

        let outcome = ClearCoordinator::new(&engine).on_cleared(request.id, NOW).unwrap();

        let ClearOutcome::Rearmed(Some(wake)) = outcome else {
            panic!("expected re-arm, got {outcome:?}");
        };
        assert!(wake.instant > NOW);
        assert_eq!(host.armed(request.id), Some(wake));
        assert!(host.displayed().is_empty());
        assert!(store.get(request.id).unwrap().is_some());
        assert_eq!(host.cleared().len(), 1);
    }

    #[test]
    fn repeating_non_idle_is_left_alone() {
        let (store, host, engine) = setup();
        let request = NotificationRequest::new(4)
            .with_at_time(NOW - 1_000)
            .with_repeat_interval(60_000);
        store.save(&request).unwrap();

        let outcome = ClearCoordinator::new(&engine).on_cleared(request.id, NOW).unwrap();

        assert_eq!(outcome, ClearOutcome::LeftRepeating);
        assert!(store.get(request.id).unwrap().is_some());
        assert_eq!(host.armed_count(), 0);
        assert_eq!(host.cleared().len(), 1);
    }

    #[test]
    fn rearm_failure_still_notifies() {
        let (store, host, engine) = setup();
        let request = NotificationRequest::new(5)
            .with_at_time(NOW - 1_000)
            .with_repeat_interval(60_000)
            .with_alert_while_idle(true);
        store.save(&request).unwrap();
        *host.fail_arm.lock().unwrap() = true;

        let result = ClearCoordinator::new(&engine).on_cleared(request.id, NOW);

        assert!(matches!(result, Err(TidingsError::WakePrimitiveFailure(_))));
        assert_eq!(host.cleared().len(), 1);
    }
}
