// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

#![no_std]
#![warn(missing_docs)]

//! # ACI HAL
//!
//! Platform abstraction for the physical side of an ACI link: one synchronous
//! byte exchange, the host-driven request line (REQN), the peer-driven ready
//! line (RDYN) and the peer reset line.
//!
//! This crate provides:
//! - **HAL traits** (`hal` module) - `AciPhysical`, `TimeProvider`, `ResetLine`
//! - **Bit order** (`bit_order` module) - LSB-first adapter for MSB-only buses
//! - **Platform bridges** (`platforms` module) - `embedded-hal` 1.0 implementation
//! - **Simulator** (`sim` module, feature `sim`) - scripted peer for host tests
//!
//! ## Usage
//!
//! ```no_run
//! use aci_hal::prelude::*;
//! # fn demo<P: AciPhysical>(phy: P) {
//! // The nRF8001 shifts bytes LSB first
//! let mut phy = LsbFirst::new(phy);
//! let _ = phy.set_request_line(true);
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `embedded-hal` - `EmbeddedHalPhysical` over `SpiBus` + GPIO pins
//! - `sim` - `ScriptedPeer` test double
//! - `defmt` - `defmt::Format` derives on public enums

/// Hardware abstraction traits shared by all platforms.
pub mod hal;

/// Bit-order conversion for LSB-first links.
pub mod bit_order;

/// Concrete platform bridges.
pub mod platforms;

/// Deterministic scripted peer for host-side testing.
#[cfg(feature = "sim")]
pub mod sim;

// Re-export commonly used types
pub use bit_order::{reverse_bits, LsbFirst};
pub use hal::{pulse_reset, AciPhysical, ResetLine, ResetProfile, TimeProvider};

#[cfg(feature = "embedded-hal")]
pub use platforms::{EmbeddedHalError, EmbeddedHalPhysical};

/// Convenience prelude
pub mod prelude {
    pub use crate::bit_order::{reverse_bits, LsbFirst};
    pub use crate::hal::{pulse_reset, AciPhysical, ResetLine, ResetProfile, TimeProvider};
}

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
