//! Configuration parsing and validation for tidingsd
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Service settings (data directory, log level)
//! - An optional external display command

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tidings_util::TidingsError;
use tracing::debug;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for TidingsError {
    fn from(e: ConfigError) -> Self {
        TidingsError::config(e.to_string())
    }
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Like [`load_config`], but a missing file yields default settings
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(Settings::default());
    }
    load_config(path)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Settings> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Settings::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let settings = parse_config("config_version = 1").unwrap();
        assert_eq!(settings.service.log_level, "info");
        assert!(settings.display.command.is_none());
    }

    #[test]
    fn parse_full_config() {
        let config = r#"
            config_version = 1

            [service]
            data_dir = "/var/lib/tidings"
            log_level = "Debug"

            [display]
            command = "notify-send"
            args = ["--wait", "--app-name=tidings"]
        "#;

        let settings = parse_config(config).unwrap();
        assert_eq!(settings.service.data_dir, Path::new("/var/lib/tidings"));
        assert_eq!(settings.service.log_level, "debug");

        let command = settings.display.command.unwrap();
        assert_eq!(command.program, "notify-send");
        assert_eq!(command.args, vec!["--wait", "--app-name=tidings"]);
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let config = r#"
            config_version = 1

            [display]
            command = ""
        "#;

        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { errors }) if errors.len() == 1));
    }

    #[test]
    fn converts_into_tidings_error() {
        let err: TidingsError = ConfigError::UnsupportedVersion(2).into();
        assert!(matches!(err, TidingsError::ConfigError(msg) if msg.contains('2')));
    }

    #[test]
    fn reject_bad_toml() {
        assert!(matches!(
            parse_config("config_version = "),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_config_or_default(dir.path().join("absent.toml")).unwrap();
        assert!(settings.display.command.is_none());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "config_version = 1\n[service]\nlog_level = \"warn\"\n").unwrap();

        let settings = load_config(&path).unwrap();
        assert_eq!(settings.service.log_level, "warn");
    }
}
