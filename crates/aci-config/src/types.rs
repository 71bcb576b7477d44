// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines the configuration structs that map to sections in
//! `aci_configuration.toml`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default number of empty polls tolerated per setup response
pub const DEFAULT_SETUP_MAX_ROUNDS: u32 = 0xF_FFFE;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AciConfig {
    pub link: LinkConfig,
    pub pins: PinsConfig,
    pub setup: SetupConfig,
    pub logging: LoggingConfig,
}

/// Who drives the transfer cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    #[default]
    Polled,
    EventDriven,
}

/// Carrier board of the peer module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum BoardKind {
    #[default]
    #[serde(rename = "standard")]
    Standard,
    #[serde(rename = "redbearlab_v1_1")]
    RedBearLabV1_1,
    #[serde(rename = "redbearlab_v2012_07")]
    RedBearLabV2012_07,
}

/// Error for string forms that name no variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl FromStr for LinkMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polled" => Ok(LinkMode::Polled),
            "event_driven" | "event-driven" => Ok(LinkMode::EventDriven),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl FromStr for BoardKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(BoardKind::Standard),
            "redbearlab_v1_1" => Ok(BoardKind::RedBearLabV1_1),
            "redbearlab_v2012_07" => Ok(BoardKind::RedBearLabV2012_07),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Link settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LinkConfig {
    pub mode: LinkMode,
    /// Wrap the bus in the LSB-first adapter
    pub lsb_first: bool,
    pub spi_clock_hz: u32,
    pub board: BoardKind,
    /// Log every frame handed to the application
    pub debug_frames: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            mode: LinkMode::Polled,
            lsb_first: true,
            spi_clock_hz: 2_000_000,
            board: BoardKind::Standard,
            debug_frames: false,
        }
    }
}

/// Pin numbers on the host
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PinsConfig {
    pub reqn: u8,
    pub rdyn: u8,
    pub reset: Option<u8>,
    pub active: Option<u8>,
}

impl Default for PinsConfig {
    fn default() -> Self {
        Self {
            reqn: 9,
            rdyn: 8,
            reset: Some(4),
            active: None,
        }
    }
}

impl PinsConfig {
    /// Every configured pin with its key
    pub fn all_pins(&self) -> Vec<(&'static str, u8)> {
        let mut pins = vec![("reqn", self.reqn), ("rdyn", self.rdyn)];
        if let Some(reset) = self.reset {
            pins.push(("reset", reset));
        }
        if let Some(active) = self.active {
            pins.push(("active", active));
        }
        pins
    }
}

/// Setup bootstrap bounds
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SetupConfig {
    pub max_rounds: u32,
    /// Wall-clock bound used instead of `max_rounds` when set
    pub timeout_ms: Option<u32>,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_SETUP_MAX_ROUNDS,
            timeout_ms: None,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_string_forms() {
        assert_eq!("event_driven".parse::<LinkMode>(), Ok(LinkMode::EventDriven));
        assert_eq!("POLLED".parse::<LinkMode>(), Ok(LinkMode::Polled));
        assert_eq!(
            "redbearlab_v1_1".parse::<BoardKind>(),
            Ok(BoardKind::RedBearLabV1_1)
        );
        assert!("uno".parse::<BoardKind>().is_err());
    }

    #[test]
    fn test_optional_pins_listed() {
        let mut pins = PinsConfig::default();
        pins.active = Some(2);
        let names: Vec<_> = pins.all_pins().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["reqn", "rdyn", "reset", "active"]);
    }
}
