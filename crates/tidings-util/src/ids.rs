//! Strongly-typed identifiers for tidings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller-assigned identifier of a notification request.
///
/// The same id keys the persisted request, its fired record and any armed wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(i32);

impl NotificationId {
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i32> for NotificationId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<NotificationId> for i64 {
    fn from(id: NotificationId) -> Self {
        id.0 as i64
    }
}

impl FromStr for NotificationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}
