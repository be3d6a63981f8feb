//! Local host adapter for tidingsd
//!
//! Provides:
//! - Wake timers as tokio tasks, replaced per notification id
//! - Platform-style repeating wakes
//! - Display through the log and an optional external command
//!   (e.g. `notify-send --wait`), whose successful exit counts as a dismissal

mod adapter;
mod display;
mod timer;

pub use adapter::*;
pub use display::*;
pub use timer::*;
