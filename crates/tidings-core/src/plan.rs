//! The reconcile decision
//!
//! [`plan`] is pure: it maps a request, the current time and (optionally) the
//! fired history to an ordered list of [`Action`]s. Applying the actions is the
//! engine's job.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use tidings_api::{NotificationRequest, WakeRequest};
use tidings_store::FiredHistory;

use crate::next_idle_trigger_in;

/// Why a notification is shown right away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryReason {
    /// `at_time == 0`
    Immediate,
    /// An idle-capable occurrence passed while nothing was running
    Missed,
}

/// One step of a reconcile plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Register a firing at `now`, then display
    DeliverNow { reason: DeliveryReason },

    /// Remove the request and its fired record
    Expire,

    /// Arm (or re-arm) the wake for the request
    ArmWake(WakeRequest),
}

/// Ordered actions for one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    actions: Vec<Action>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Number of `DeliverNow` actions
    pub fn deliveries(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::DeliverNow { .. }))
            .count()
    }

    pub fn expires(&self) -> bool {
        self.actions.contains(&Action::Expire)
    }

    /// The wake this plan arms, if any
    pub fn wake(&self) -> Option<&WakeRequest> {
        self.actions.iter().find_map(|a| match a {
            Action::ArmWake(wake) => Some(wake),
            _ => None,
        })
    }
}

impl IntoIterator for Plan {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}

/// Decide what to do with `request` at `now` (local time zone)
///
/// `fired` is the fired history to check for missed idle-capable occurrences;
/// `None` means "no history", which counts every passed occurrence as missed.
/// `skip_immediate` suppresses both immediate delivery and the missed check,
/// as used when re-arming after a dismissal.
pub fn plan(
    request: &NotificationRequest,
    now: i64,
    fired: Option<&FiredHistory>,
    skip_immediate: bool,
) -> Plan {
    plan_in(&Local, request, now, fired, skip_immediate)
}

/// [`plan`] with an explicit time zone for the interval math
pub fn plan_in<Tz: TimeZone>(
    tz: &Tz,
    request: &NotificationRequest,
    now: i64,
    fired: Option<&FiredHistory>,
    skip_immediate: bool,
) -> Plan {
    let mut plan = Plan::new();
    let at = request.at_time;
    let interval = request.repeat_interval;

    // Missed while idle
    if request.alert_while_idle && !skip_immediate && at != 0 && at <= now {
        let last_fired = fired
            .and_then(|history| history.get(&request.id).copied())
            .unwrap_or(-1);

        let missed = if request.is_repeating() {
            last_fired < 0 || last_fired.saturating_add(interval) < now
        } else {
            last_fired < 0
        };

        if missed {
            plan.push(Action::DeliverNow {
                reason: DeliveryReason::Missed,
            });
        }
    }

    // Immediate
    if at == 0 && !skip_immediate {
        plan.push(Action::DeliverNow {
            reason: DeliveryReason::Immediate,
        });
        return plan;
    }

    // Expired one-shot
    if interval == 0 && now > at {
        plan.push(Action::Expire);
        return plan;
    }

    let wake = match (request.is_repeating(), request.alert_while_idle) {
        (true, true) => {
            WakeRequest::exact_while_idle(request.id, next_idle_trigger_in(tz, at, interval, now))
        }
        (true, false) => WakeRequest::repeating(request.id, at, interval),
        (false, true) => WakeRequest::exact_while_idle(request.id, at),
        (false, false) => WakeRequest::one_shot(request.id, at),
    };
    plan.push(Action::ArmWake(wake));

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tidings_util::{NotificationId, DAY_MILLIS};

    const NOW: i64 = 1_750_000_000_000;

    fn id() -> NotificationId {
        NotificationId::new(1)
    }

    fn history(last: i64) -> FiredHistory {
        FiredHistory::from([(id(), last)])
    }

    #[test]
    fn immediate_delivers_once_and_never_arms() {
        for idle in [false, true] {
            for interval in [0, 1_000] {
                let request = NotificationRequest::new(1)
                    .with_repeat_interval(interval)
                    .with_alert_while_idle(idle);
                let plan = plan_in(&Utc, &request, NOW, None, false);

                assert_eq!(plan.deliveries(), 1);
                assert!(plan.wake().is_none());
                assert!(!plan.expires());
            }
        }
    }

    #[test]
    fn past_one_shot_expires() {
        let request = NotificationRequest::new(1).with_at_time(NOW - 5_000);
        let plan = plan_in(&Utc, &request, NOW, None, false);
        assert_eq!(plan.actions(), &[Action::Expire]);
    }

    #[test]
    fn one_shot_due_exactly_now_is_armed() {
        let request = NotificationRequest::new(1).with_at_time(NOW);
        let plan = plan_in(&Utc, &request, NOW, None, false);
        assert_eq!(plan.wake(), Some(&WakeRequest::one_shot(id(), NOW)));
    }

    #[test]
    fn future_one_shot_arms_inexact_wake() {
        let request = NotificationRequest::new(1).with_at_time(NOW + 10_000);
        let plan = plan_in(&Utc, &request, NOW, None, false);

        assert_eq!(plan.len(), 1);
        let wake = plan.wake().unwrap();
        assert_eq!(wake.instant, NOW + 10_000);
        assert!(!wake.exact && !wake.idle_capable && !wake.is_repeating());
    }

    #[test]
    fn future_one_shot_idle_arms_exact_wake() {
        let request = NotificationRequest::new(1)
            .with_at_time(NOW + 10_000)
            .with_alert_while_idle(true);
        let plan = plan_in(&Utc, &request, NOW, None, false);
        assert_eq!(plan.actions(), &[Action::ArmWake(WakeRequest::exact_while_idle(id(), NOW + 10_000))]);
    }

    #[test]
    fn repeating_non_idle_uses_platform_repetition() {
        let request = NotificationRequest::new(1)
            .with_at_time(NOW - 5_000)
            .with_repeat_interval(1_000);
        let plan = plan_in(&Utc, &request, NOW, None, false);
        assert_eq!(plan.actions(), &[Action::ArmWake(WakeRequest::repeating(id(), NOW - 5_000, 1_000))]);
    }

    #[test]
    fn missed_repeating_idle_delivers_then_arms_next() {
        let request = NotificationRequest::new(1)
            .with_at_time(NOW - 5_000)
            .with_repeat_interval(1_000)
            .with_alert_while_idle(true);
        let plan = plan_in(&Utc, &request, NOW, None, false);

        assert_eq!(
            plan.actions(),
            &[
                Action::DeliverNow {
                    reason: DeliveryReason::Missed
                },
                Action::ArmWake(WakeRequest::exact_while_idle(id(), NOW + 1_000)),
            ]
        );
    }

    #[test]
    fn repeating_idle_recently_fired_is_not_missed() {
        let request = NotificationRequest::new(1)
            .with_at_time(NOW - 5_000)
            .with_repeat_interval(1_000)
            .with_alert_while_idle(true);

        let plan = plan_in(&Utc, &request, NOW, Some(&history(NOW - 500)), false);
        assert_eq!(plan.deliveries(), 0);
        assert!(plan.wake().is_some());

        // Fired longer than one interval ago
        let plan = plan_in(&Utc, &request, NOW, Some(&history(NOW - 1_001)), false);
        assert_eq!(plan.deliveries(), 1);
    }

    #[test]
    fn history_without_record_counts_as_missed() {
        let request = NotificationRequest::new(1)
            .with_at_time(NOW - 5_000)
            .with_alert_while_idle(true);
        let other = FiredHistory::from([(NotificationId::new(2), NOW)]);

        let plan = plan_in(&Utc, &request, NOW, Some(&other), false);
        assert_eq!(
            plan.actions(),
            &[
                Action::DeliverNow {
                    reason: DeliveryReason::Missed
                },
                Action::Expire,
            ]
        );
    }

    #[test]
    fn fired_one_shot_idle_is_only_expired() {
        let request = NotificationRequest::new(1)
            .with_at_time(NOW - 5_000)
            .with_alert_while_idle(true);
        let plan = plan_in(&Utc, &request, NOW, Some(&history(NOW - 5_000)), false);
        assert_eq!(plan.actions(), &[Action::Expire]);
    }

    #[test]
    fn skip_immediate_rearms_without_delivery() {
        let request = NotificationRequest::new(1)
            .with_at_time(NOW - 90_000_000)
            .with_repeat_interval(DAY_MILLIS)
            .with_alert_while_idle(true);
        let plan = plan_in(&Utc, &request, NOW, None, true);

        assert_eq!(plan.deliveries(), 0);
        assert_eq!(plan.wake().unwrap().instant, NOW - 90_000_000 + 2 * DAY_MILLIS);
        assert!(plan.wake().unwrap().instant > NOW);
    }

    #[test]
    fn skip_immediate_on_immediate_one_shot_expires() {
        let request = NotificationRequest::new(1);
        let plan = plan_in(&Utc, &request, NOW, None, true);
        assert_eq!(plan.actions(), &[Action::Expire]);
    }

    #[test]
    fn huge_interval_recently_fired_is_not_missed() {
        let request = NotificationRequest::new(1)
            .with_at_time(NOW - 10_000)
            .with_repeat_interval(i64::MAX)
            .with_alert_while_idle(true);

        let plan = plan_in(&Utc, &request, NOW, Some(&history(NOW - 10)), false);

        assert_eq!(plan.deliveries(), 0);
        assert_eq!(plan.wake(), Some(&WakeRequest::exact_while_idle(id(), i64::MAX)));
    }

    #[test]
    fn huge_interval_without_history_is_missed_once() {
        let request = NotificationRequest::new(1)
            .with_at_time(NOW - 10_000)
            .with_repeat_interval(i64::MAX)
            .with_alert_while_idle(true);

        let plan = plan_in(&Utc, &request, NOW, None, false);

        assert_eq!(plan.deliveries(), 1);
        assert_eq!(plan.wake().unwrap().instant, i64::MAX);
    }

    #[test]
    fn far_future_trigger_is_armed_as_is() {
        let request = NotificationRequest::new(1)
            .with_at_time(i64::MAX)
            .with_repeat_interval(DAY_MILLIS)
            .with_alert_while_idle(true);
        let plan = plan_in(&Utc, &request, NOW, None, false);
        assert_eq!(plan.actions(), &[Action::ArmWake(WakeRequest::exact_while_idle(id(), i64::MAX))]);

        let repeating = NotificationRequest::new(1)
            .with_at_time(i64::MAX - 1)
            .with_repeat_interval(i64::MAX);
        let plan = plan_in(&Utc, &repeating, NOW, None, false);
        assert_eq!(plan.wake(), Some(&WakeRequest::repeating(id(), i64::MAX - 1, i64::MAX)));
    }

    #[test]
    fn action_serializes_tagged() {
        let json = serde_json::to_value(Action::Expire).unwrap();
        assert_eq!(json["action"], "expire");
    }
}
