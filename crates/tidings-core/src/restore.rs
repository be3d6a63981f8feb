//! Restore pass after startup or downtime

use serde::Serialize;
use tidings_api::NotificationRequest;
use tidings_util::{NotificationId, Result};
use tracing::{info, warn};

use crate::ScheduleEngine;

/// Summary of one restore pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    /// Requests reconciled without error
    pub processed: Vec<NotificationId>,
    /// Entries whose persisted data could not be parsed
    pub malformed: Vec<NotificationId>,
    /// Requests whose reconcile returned an error
    pub failed: Vec<NotificationId>,
}

impl RestoreReport {
    pub fn total(&self) -> usize {
        self.processed.len() + self.malformed.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty() && self.failed.is_empty()
    }
}

/// Replays every persisted request through the engine
pub struct RestoreCoordinator<'a> {
    engine: &'a ScheduleEngine,
}

impl<'a> RestoreCoordinator<'a> {
    pub fn new(engine: &'a ScheduleEngine) -> Self {
        Self { engine }
    }

    /// Reconcile every persisted request against the fired history
    ///
    /// Only failing to read the store aborts the pass. Per-request problems
    /// are logged and counted.
    pub fn restore(&self, now: i64) -> Result<RestoreReport> {
        let store = self.engine.store();
        let history = store.fired_snapshot()?;
        let entries = store.get_all_raw()?;

        info!(count = entries.len(), fired = history.len(), "Restoring notifications");

        let mut report = RestoreReport::default();
        for (id, json) in entries {
            let request = match NotificationRequest::from_json(&json) {
                Ok(request) => request,
                Err(e) => {
                    warn!(id = %id, error = %e, "Skipping malformed persisted request");
                    report.malformed.push(id);
                    continue;
                }
            };

            if request.id != id {
                warn!(id = %id, payload_id = %request.id, "Persisted request id does not match its key");
                report.malformed.push(id);
                continue;
            }

            match self.engine.reconcile(&request, now, Some(&history), false) {
                Ok(_) => report.processed.push(id),
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to restore notification");
                    report.failed.push(id);
                }
            }
        }

        info!(
            processed = report.processed.len(),
            malformed = report.malformed.len(),
            failed = report.failed.len(),
            "Restore complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tidings_host_api::MockHost;
    use tidings_store::{MemoryStore, NotificationStore};

    const NOW: i64 = 1_750_000_000_000;

    fn setup() -> (Arc<MemoryStore>, Arc<MockHost>, ScheduleEngine) {
        let store = Arc::new(MemoryStore::new());
        let host = Arc::new(MockHost::new());
        let engine = ScheduleEngine::new(store.clone(), host.clone());
        (store, host, engine)
    }

    #[test]
    fn corrupted_entry_does_not_stop_restore() {
        let (store, host, engine) = setup();
        store.save(&NotificationRequest::new(1).with_at_time(NOW + 1_000)).unwrap();
        store.insert_raw(NotificationId::new(2), "{ not json").unwrap();
        store.save(&NotificationRequest::new(3).with_at_time(NOW + 3_000)).unwrap();

        let report = RestoreCoordinator::new(&engine).restore(NOW).unwrap();

        assert_eq!(report.total(), 3);
        assert_eq!(report.processed, vec![NotificationId::new(1), NotificationId::new(3)]);
        assert_eq!(report.malformed, vec![NotificationId::new(2)]);
        assert_eq!(host.armed_count(), 2);
    }

    #[test]
    fn mismatched_key_is_malformed() {
        let (store, host, engine) = setup();
        store.insert_raw(NotificationId::new(4), r#"{"id": 5, "atTime": 1}"#).unwrap();

        let report = RestoreCoordinator::new(&engine).restore(NOW).unwrap();

        assert_eq!(report.malformed, vec![NotificationId::new(4)]);
        assert_eq!(host.armed_count(), 0);
    }

    #[test]
    fn uses_fired_history_for_missed_check() {
        let (store, host, engine) = setup();
        let fired = NotificationRequest::new(1)
            .with_at_time(NOW - 10_000)
            .with_repeat_interval(60_000)
            .with_alert_while_idle(true);
        let never_fired = NotificationRequest::new(2)
            .with_at_time(NOW - 10_000)
            .with_repeat_interval(60_000)
            .with_alert_while_idle(true);
        store.save(&fired).unwrap();
        store.save(&never_fired).unwrap();
        store.register_fired(fired.id, NOW - 10_000).unwrap();

        let report = RestoreCoordinator::new(&engine).restore(NOW).unwrap();

        assert!(report.is_clean());
        assert_eq!(host.displayed(), vec![never_fired.id]);
        assert_eq!(host.armed_count(), 2);
    }

    #[test]
    fn failures_are_counted_and_pass_continues() {
        let (store, host, engine) = setup();
        store.save(&NotificationRequest::new(1).with_at_time(NOW + 1_000)).unwrap();
        store.save(&NotificationRequest::new(2).with_at_time(NOW - 1_000)).unwrap();
        *host.fail_arm.lock().unwrap() = true;

        let report = RestoreCoordinator::new(&engine).restore(NOW).unwrap();

        assert_eq!(report.failed, vec![NotificationId::new(1)]);
        assert_eq!(report.processed, vec![NotificationId::new(2)]);
        assert!(store.get(NotificationId::new(2)).unwrap().is_none());
    }

    #[test]
    fn huge_interval_does_not_stop_restore() {
        let (store, host, engine) = setup();
        let huge = NotificationRequest::new(2)
            .with_at_time(NOW - 10_000)
            .with_repeat_interval(i64::MAX)
            .with_alert_while_idle(true);
        store.save(&NotificationRequest::new(1).with_at_time(NOW + 1_000)).unwrap();
        store.save(&huge).unwrap();
        store.save(&NotificationRequest::new(3).with_at_time(NOW + 3_000)).unwrap();
        store.register_fired(huge.id, NOW - 10).unwrap();

        let report = RestoreCoordinator::new(&engine).restore(NOW).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.processed.len(), 3);
        assert_eq!(host.armed_count(), 3);
        assert!(host.displayed().is_empty());
        assert_eq!(host.armed(huge.id).unwrap().instant, i64::MAX);
    }

    #[test]
    fn unavailable_store_aborts() {
        let (store, _host, engine) = setup();
        store.set_unavailable(true);
        assert!(RestoreCoordinator::new(&engine).restore(NOW).is_err());
    }
}
