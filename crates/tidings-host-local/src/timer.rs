//! Wake timer arithmetic

use std::time::Duration;
use tidings_api::WakeRequest;

/// Epoch ms at which `wake` should first fire, given `now`
///
/// One-shot wakes in the past fire immediately. Repeating wakes whose anchor
/// has passed start at their next occurrence after `now`, or `i64::MAX` when
/// that occurrence is out of range.
pub fn first_fire_at(wake: &WakeRequest, now: i64) -> i64 {
    match wake.repeat_period {
        Some(period) if period > 0 && wake.instant <= now => {
            let elapsed = now.saturating_sub(wake.instant);
            (elapsed / period + 1)
                .checked_mul(period)
                .and_then(|step| wake.instant.checked_add(step))
                .unwrap_or(i64::MAX)
        }
        _ => wake.instant,
    }
}

/// Time to sleep until `at`, zero if already due
pub fn delay_until(at: i64, now: i64) -> Duration {
    Duration::from_millis(u64::try_from(at.saturating_sub(now)).unwrap_or(0))
}
