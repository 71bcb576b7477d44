// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # aci-observability
//!
//! Logging setup for host tools and tests that drive an ACI link.
//!
//! The link crates are `no_std` and log through the `log` facade. This crate
//! installs a `tracing` subscriber that also receives those records, with
//! per-crate debug flags from the command line or `ACI_DEBUG`.
//!
//! ## Features
//! - `file-logging`: second, non-blocking output to a timestamped log file

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Crates that accept a debug flag, by tracing target
pub const KNOWN_CRATES: &[&str] = &[
    "aci_hal",
    "aci_transport",
    "aci_protocol",
    "aci_session",
    "aci_config",
    "nrf_aci",
];
