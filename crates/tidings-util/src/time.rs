//! Time utilities for tidings
//!
//! All persisted instants are epoch milliseconds (`i64`). Calendar-aware
//! arithmetic converts to a time zone only where wall-clock days matter.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `TIDINGS_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. This is useful
//! for exercising restore passes against notifications that "should have fired".
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)
//!
//! Example:
//! ```bash
//! TIDINGS_MOCK_TIME="2025-12-25 14:30:00" tidingsd restore
//! ```

use chrono::{DateTime, Days, Local, LocalResult, NaiveDateTime, TimeZone};
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "TIDINGS_MOCK_TIME";

pub const SECOND_MILLIS: i64 = 1_000;
pub const MINUTE_MILLIS: i64 = 60 * SECOND_MILLIS;
pub const HOUR_MILLIS: i64 = 60 * MINUTE_MILLIS;
/// One nominal day. Wall-clock days can be shorter or longer across DST changes.
pub const DAY_MILLIS: i64 = 24 * HOUR_MILLIS;

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                if let Ok(naive_dt) =
                    NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S")
                {
                    if let Some(mock_dt) = Local.from_local_datetime(&naive_dt).single() {
                        let real_now = chrono::Local::now();
                        let offset = mock_dt.signed_duration_since(real_now);
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    } else {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            "Failed to convert mock time to local timezone"
                        );
                    }
                } else {
                    tracing::warn!(
                        mock_time = %mock_time_str,
                        expected_format = "%Y-%m-%d %H:%M:%S",
                        "Invalid mock time format"
                    );
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}

/// Current wall-clock time as epoch milliseconds
pub fn now_millis() -> i64 {
    now().timestamp_millis()
}

/// Convert epoch milliseconds to a date-time in `tz`
pub fn from_epoch_millis<Tz: TimeZone>(tz: &Tz, millis: i64) -> Option<DateTime<Tz>> {
    tz.timestamp_millis_opt(millis).single()
}

/// Add whole calendar days, keeping the wall-clock time of day in the zone of `dt`.
///
/// An ambiguous local result (clocks set back) resolves to the earlier instant.
/// A local time that does not exist (clocks set forward) falls back to adding
/// `days * 24h` of absolute time.
pub fn add_calendar_days<Tz: TimeZone>(dt: &DateTime<Tz>, days: u64) -> Option<DateTime<Tz>> {
    let naive = dt.naive_local().checked_add_days(Days::new(days))?;

    match dt.timezone().from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let span = chrono::Duration::try_days(i64::try_from(days).ok()?)?;
            dt.clone().checked_add_signed(span)
        }
    }
}

/// Advance `instant` (epoch ms) by `interval` ms.
///
/// Intervals shorter than a day are added as plain milliseconds. Longer ones are
/// split into whole days, added as calendar days in `tz`, and the remainder is
/// then added as milliseconds.
pub fn add_calendar_interval<Tz: TimeZone>(tz: &Tz, instant: i64, interval: i64) -> i64 {
    if interval < DAY_MILLIS {
        return instant.saturating_add(interval);
    }

    let days = (interval / DAY_MILLIS) as u64;
    let rest = interval % DAY_MILLIS;

    let advanced = from_epoch_millis(tz, instant)
        .and_then(|start| add_calendar_days(&start, days))
        .and_then(|dt| {
            chrono::Duration::try_milliseconds(rest).and_then(|d| dt.checked_add_signed(d))
        });

    match advanced {
        Some(dt) => dt.timestamp_millis(),
        None => {
            tracing::warn!(instant, interval, "Calendar addition out of range, using raw milliseconds");
            instant.saturating_add(interval)
        }
    }
}

/// Format epoch milliseconds in local time for logs and listings
pub fn format_millis(millis: i64) -> String {
    match from_epoch_millis(&Local, millis) {
        Some(dt) => format_datetime_full(&dt),
        None => format!("<invalid {millis}>"),
    }
}

/// Format a DateTime for display with full date and time.
pub fn format_datetime_full<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}
