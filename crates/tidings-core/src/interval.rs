//! Next-occurrence math for repeating idle-capable notifications
//!
//! The platform has no exact, idle-capable *repeating* wake, so these
//! notifications are armed one occurrence at a time.

use chrono::{Local, TimeZone};
use tidings_util::add_calendar_interval;

/// Next trigger after `now` for a schedule anchored at `trigger` repeating every `interval` ms.
///
/// A future `trigger` is returned unchanged. Otherwise the last occurrence at or
/// before `now` is advanced by one interval, using calendar days in `tz` for
/// intervals of a day or more so the wall-clock time of day is kept across DST.
/// A non-positive `interval` returns `trigger` unchanged.
pub fn next_idle_trigger_in<Tz: TimeZone>(tz: &Tz, trigger: i64, interval: i64, now: i64) -> i64 {
    if trigger > now || interval <= 0 {
        return trigger;
    }

    let missed = now.saturating_sub(trigger) / interval;
    let base = trigger.saturating_add(missed.saturating_mul(interval));
    add_calendar_interval(tz, base, interval)
}

/// [`next_idle_trigger_in`] in the local time zone
pub fn next_idle_trigger(trigger: i64, interval: i64, now: i64) -> i64 {
    next_idle_trigger_in(&Local, trigger, interval, now)
}
