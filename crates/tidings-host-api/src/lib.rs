//! Host adapter trait interfaces for tidings
//!
//! This crate defines the capability-based interface between the scheduling
//! engine and platform-specific implementations: arming wakes, rendering
//! notifications and reporting dismissals. It contains no platform code itself.

mod clock;
mod handle;
mod mock;
mod traits;

pub use clock::*;
pub use handle::*;
pub use mock::*;
pub use traits::*;
