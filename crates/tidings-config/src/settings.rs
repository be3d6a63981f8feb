//! Validated settings consumed by the daemon

use std::path::PathBuf;
use tidings_util::default_data_dir;

use crate::schema::{RawConfig, RawDisplayConfig, RawServiceConfig};

/// Validated configuration
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub service: ServiceSettings,
    pub display: DisplaySettings,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceSettings::from_raw(raw.service),
            display: DisplaySettings::from_raw(raw.display),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub data_dir: PathBuf,
    pub log_level: String,
}

impl ServiceSettings {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            log_level: raw
                .log_level
                .map(|l| l.to_ascii_lowercase())
                .unwrap_or_else(|| "info".into()),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_raw(RawServiceConfig::default())
    }
}

/// External display command. `None` means notifications are only logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplaySettings {
    pub command: Option<DisplayCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl DisplaySettings {
    fn from_raw(raw: RawDisplayConfig) -> Self {
        Self {
            command: raw.command.map(|program| DisplayCommand {
                program,
                args: raw.args,
            }),
        }
    }
}
