//! Scheduling and reconciliation engine for tidings
//!
//! This crate decides what happens to a notification request:
//! - Interval math for repeating idle-capable schedules
//! - The reconcile decision (deliver now, expire, arm a wake, catch up a missed firing)
//! - Coordinators reacting to restore, wake-fired and dismissal triggers
//!
//! It owns no thread or timer. Store and host are injected.

mod clear;
mod engine;
mod fire;
mod interval;
mod plan;
mod restore;

pub use clear::*;
pub use engine::*;
pub use fire::*;
pub use interval::*;
pub use plan::*;
pub use restore::*;
