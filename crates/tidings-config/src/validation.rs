//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Log levels accepted in `service.log_level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("display.command must not be empty")]
    EmptyDisplayCommand,

    #[error("Unknown log level '{0}'")]
    UnknownLogLevel(String),

    #[error("service.data_dir must not be empty")]
    EmptyDataDir,
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(command) = &config.display.command
        && command.trim().is_empty()
    {
        errors.push(ValidationError::EmptyDisplayCommand);
    }

    if let Some(level) = &config.service.log_level
        && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
    {
        errors.push(ValidationError::UnknownLogLevel(level.clone()));
    }

    if let Some(dir) = &config.service.data_dir
        && dir.as_os_str().is_empty()
    {
        errors.push(ValidationError::EmptyDataDir);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawDisplayConfig, RawServiceConfig};

    fn raw(service: RawServiceConfig, display: RawDisplayConfig) -> RawConfig {
        RawConfig {
            config_version: 1,
            service,
            display,
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = raw(RawServiceConfig::default(), RawDisplayConfig::default());
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn collects_every_error() {
        let config = raw(
            RawServiceConfig {
                data_dir: Some("".into()),
                log_level: Some("loud".into()),
            },
            RawDisplayConfig {
                command: Some("  ".into()),
                args: vec![],
            },
        );

        let errors = validate_config(&config);
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownLogLevel(l) if l == "loud")));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let config = raw(
            RawServiceConfig {
                data_dir: None,
                log_level: Some("DEBUG".into()),
            },
            RawDisplayConfig::default(),
        );
        assert!(validate_config(&config).is_empty());
    }
}
