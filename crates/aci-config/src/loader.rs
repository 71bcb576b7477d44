// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones winning:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{AciConfig, ConfigError, ConfigResult};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no path is given
pub const CONFIG_FILE_NAME: &str = "aci_configuration.toml";

/// Find the configuration file
///
/// Search order:
/// 1. `ACI_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to five parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("ACI_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by ACI_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            let Some(parent) = current.parent() else {
                break;
            };
            search_paths.push(parent.join(CONFIG_FILE_NAME));
            current = parent;
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet ACI_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<AciConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: AciConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `ACI_LINK_MODE` -> `link.mode`
/// - `ACI_LSB_FIRST` -> `link.lsb_first`
/// - `ACI_SPI_CLOCK_HZ` -> `link.spi_clock_hz`
/// - `ACI_BOARD` -> `link.board`
/// - `ACI_DEBUG_FRAMES` -> `link.debug_frames`
/// - `ACI_PIN_REQN`, `ACI_PIN_RDYN`, `ACI_PIN_RESET` -> `pins.*`
/// - `ACI_SETUP_MAX_ROUNDS` -> `setup.max_rounds`
/// - `ACI_SETUP_TIMEOUT_MS` -> `setup.timeout_ms`
/// - `ACI_LOG_LEVEL` -> `logging.level`
///
/// Values that do not parse are ignored.
pub fn apply_environment_overrides(config: &mut AciConfig) {
    let vars: HashMap<String, String> = [
        ("ACI_LINK_MODE", "mode"),
        ("ACI_LSB_FIRST", "lsb_first"),
        ("ACI_SPI_CLOCK_HZ", "spi_clock_hz"),
        ("ACI_BOARD", "board"),
        ("ACI_DEBUG_FRAMES", "debug_frames"),
        ("ACI_PIN_REQN", "reqn"),
        ("ACI_PIN_RDYN", "rdyn"),
        ("ACI_PIN_RESET", "reset"),
        ("ACI_SETUP_MAX_ROUNDS", "max_rounds"),
        ("ACI_SETUP_TIMEOUT_MS", "timeout_ms"),
        ("ACI_LOG_LEVEL", "log_level"),
    ]
    .into_iter()
    .filter_map(|(var, key)| env::var(var).ok().map(|value| (key.to_string(), value)))
    .collect();
    apply_cli_overrides(config, &vars);
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of CLI arguments (e.g., `{"mode": "event_driven", "reqn": "10"}`)
pub fn apply_cli_overrides(config: &mut AciConfig, cli_args: &HashMap<String, String>) {
    // Link settings
    if let Some(mode) = cli_args.get("mode").and_then(|v| v.parse().ok()) {
        config.link.mode = mode;
    }
    if let Some(value) = cli_args.get("lsb_first") {
        config.link.lsb_first = parse_flag(value);
    }
    if let Some(hz) = cli_args.get("spi_clock_hz").and_then(|v| v.parse().ok()) {
        config.link.spi_clock_hz = hz;
    }
    if let Some(board) = cli_args.get("board").and_then(|v| v.parse().ok()) {
        config.link.board = board;
    }
    if let Some(value) = cli_args.get("debug_frames") {
        config.link.debug_frames = parse_flag(value);
    }

    // Pins
    if let Some(pin) = cli_args.get("reqn").and_then(|v| v.parse().ok()) {
        config.pins.reqn = pin;
    }
    if let Some(pin) = cli_args.get("rdyn").and_then(|v| v.parse().ok()) {
        config.pins.rdyn = pin;
    }
    if let Some(pin) = cli_args.get("reset").and_then(|v| v.parse().ok()) {
        config.pins.reset = Some(pin);
    }

    // Setup bounds
    if let Some(rounds) = cli_args.get("max_rounds").and_then(|v| v.parse().ok()) {
        config.setup.max_rounds = rounds;
    }
    if let Some(ms) = cli_args.get("timeout_ms").and_then(|v| v.parse().ok()) {
        config.setup.timeout_ms = Some(ms);
    }

    // Logging
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("log_format") {
        config.logging.format = value.clone();
    }
}
