//! Shared utilities for tidings
//!
//! This crate provides:
//! - ID types (NotificationId)
//! - Time utilities (epoch milliseconds, calendar-safe interval addition, mock time)
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
