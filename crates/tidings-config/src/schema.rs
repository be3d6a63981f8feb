//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// How notifications are shown
    #[serde(default)]
    pub display: RawDisplayConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the store
    pub data_dir: Option<PathBuf>,

    /// Default log filter (overridden by RUST_LOG)
    pub log_level: Option<String>,
}

/// Display settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDisplayConfig {
    /// Command spawned per notification, e.g. `notify-send`. Absent means log-only.
    pub command: Option<String>,

    /// Extra arguments placed before the title and body
    #[serde(default)]
    pub args: Vec<String>,
}
