//! Shared types for tidings
//!
//! This crate defines the data passed between the engine, the store and host
//! adapters:
//! - Notification requests (persisted wire format)
//! - Wake requests (what the engine asks the platform timer to do)

mod types;
mod wake;

pub use types::*;
pub use wake::*;
