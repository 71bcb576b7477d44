// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Every check runs and all violations are reported together.

use std::collections::HashMap;

use crate::{AciConfig, ConfigError, ConfigResult};

/// Lowest SPI clock the peer is specified for
pub const SPI_CLOCK_MIN_HZ: u32 = 125_000;

/// Highest SPI clock the peer is specified for
pub const SPI_CLOCK_MAX_HZ: u32 = 3_000_000;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "compact"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    PinConflict { pin1: String, pin2: String, pin: u8 },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PinConflict { pin1, pin2, pin } => {
                write!(f, "Pin conflict: {} and {} both use pin {}", pin1, pin2, pin)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Pin conflicts (no two signals on the same pin)
/// - SPI clock within what the peer supports
/// - Non-zero setup bounds
/// - Known log level and format
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &AciConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// Every violation found in `config`, in check order
pub fn collect_errors(config: &AciConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_pin_conflicts(config, &mut errors);
    validate_link(config, &mut errors);
    validate_setup(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn validate_pin_conflicts(config: &AciConfig, errors: &mut Vec<ConfigValidationError>) {
    let mut seen: HashMap<u8, &'static str> = HashMap::new();
    for (name, pin) in config.pins.all_pins() {
        if let Some(first) = seen.get(&pin) {
            errors.push(ConfigValidationError::PinConflict {
                pin1: format!("pins.{}", first),
                pin2: format!("pins.{}", name),
                pin,
            });
        } else {
            seen.insert(pin, name);
        }
    }
}

fn validate_link(config: &AciConfig, errors: &mut Vec<ConfigValidationError>) {
    let clock = config.link.spi_clock_hz;
    if !(SPI_CLOCK_MIN_HZ..=SPI_CLOCK_MAX_HZ).contains(&clock) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "link.spi_clock_hz".to_string(),
            reason: format!(
                "{} is outside {}..={} Hz",
                clock, SPI_CLOCK_MIN_HZ, SPI_CLOCK_MAX_HZ
            ),
        });
    }
}

fn validate_setup(config: &AciConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.setup.max_rounds == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "setup.max_rounds".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if config.setup.timeout_ms == Some(0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "setup.timeout_ms".to_string(),
            reason: "must be positive when set".to_string(),
        });
    }
}

fn validate_logging(config: &AciConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("must be one of {}", LOG_LEVELS.join(", ")),
        });
    }
    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.format".to_string(),
            reason: "must be 'text' or 'compact'".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AciConfig::default();
        let result = validate_config(&config);
        if let Err(e) = &result {
            eprintln!("Validation error: {}", e);
        }
        assert!(result.is_ok());
    }

    #[test]
    fn test_pin_conflict() {
        let mut config = AciConfig::default();
        config.pins.reset = Some(config.pins.reqn);

        let result = validate_config(&config);
        assert!(result.is_err());

        if let Err(ConfigError::ValidationError(msg)) = result {
            assert!(msg.contains("Pin conflict"));
            assert!(msg.contains("pins.reqn"));
            assert!(msg.contains("pins.reset"));
        }
    }

    #[test]
    fn test_spi_clock_range() {
        let mut config = AciConfig::default();
        config.link.spi_clock_hz = 8_000_000;

        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("link.spi_clock_hz"));
    }

    #[test]
    fn test_all_violations_reported() {
        let mut config = AciConfig::default();
        config.setup.max_rounds = 0;
        config.setup.timeout_ms = Some(0);
        config.logging.level = "verbose".to_string();
        config.logging.format = "json".to_string();

        let errors = collect_errors(&config);
        assert_eq!(errors.len(), 4);

        if let Err(ConfigError::ValidationError(msg)) = validate_config(&config) {
            assert!(msg.contains("setup.max_rounds"));
            assert!(msg.contains("setup.timeout_ms"));
            assert!(msg.contains("logging.level"));
            assert!(msg.contains("logging.format"));
        } else {
            panic!("expected a validation error");
        }
    }
}
