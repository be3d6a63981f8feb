//! Wake requests handed to the platform timer

use serde::{Deserialize, Serialize};
use std::fmt;
use tidings_util::NotificationId;

/// A future callback the engine asks the host to register.
///
/// Arming a wake for an id that already has one replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeRequest {
    pub id: NotificationId,

    /// Epoch milliseconds of the (first) firing
    pub instant: i64,

    /// Must fire at `instant` rather than inside a platform batching window
    pub exact: bool,

    /// Must fire even while the device is idle
    pub idle_capable: bool,

    /// Platform-native repetition period in milliseconds
    pub repeat_period: Option<i64>,
}

impl WakeRequest {
    /// Ordinary inexact one-shot wake
    pub fn one_shot(id: NotificationId, instant: i64) -> Self {
        Self {
            id,
            instant,
            exact: false,
            idle_capable: false,
            repeat_period: None,
        }
    }

    /// Exact one-shot wake that also fires while idle
    pub fn exact_while_idle(id: NotificationId, instant: i64) -> Self {
        Self {
            id,
            instant,
            exact: true,
            idle_capable: true,
            repeat_period: None,
        }
    }

    /// Inexact platform-repeating wake anchored at `anchor`
    pub fn repeating(id: NotificationId, anchor: i64, period: i64) -> Self {
        Self {
            id,
            instant: anchor,
            exact: false,
            idle_capable: false,
            repeat_period: Some(period),
        }
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat_period.is_some()
    }
}

impl fmt::Display for WakeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match (self.exact, self.idle_capable) {
            (true, true) => "exact-idle",
            (true, false) => "exact",
            (false, true) => "idle",
            (false, false) => "inexact",
        };
        match self.repeat_period {
            Some(period) => write!(f, "{kind} wake for {} at {} every {period}ms", self.id, self.instant),
            None => write!(f, "{kind} wake for {} at {}", self.id, self.instant),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_flags() {
        let id = NotificationId::new(1);

        let plain = WakeRequest::one_shot(id, 10);
        assert!(!plain.exact && !plain.idle_capable && !plain.is_repeating());

        let idle = WakeRequest::exact_while_idle(id, 10);
        assert!(idle.exact && idle.idle_capable && !idle.is_repeating());

        let repeating = WakeRequest::repeating(id, 10, 500);
        assert_eq!(repeating.repeat_period, Some(500));
        assert!(!repeating.exact);
    }

    #[test]
    fn display_names_the_kind() {
        let wake = WakeRequest::exact_while_idle(NotificationId::new(4), 99);
        assert_eq!(wake.to_string(), "exact-idle wake for 4 at 99");
    }
}
