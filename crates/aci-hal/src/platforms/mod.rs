// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Concrete `AciPhysical` implementations.

/// `embedded-hal` 1.0 bridge (SPI bus + GPIO pins + delay).
#[cfg(feature = "embedded-hal")]
pub mod embedded;

#[cfg(feature = "embedded-hal")]
pub use embedded::{EmbeddedHalError, EmbeddedHalPhysical};
