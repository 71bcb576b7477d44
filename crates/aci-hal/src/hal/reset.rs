// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Peer reset line and pulse timing.
//!
//! Most modules reset on a short low pulse. The RedBearLab shields v1.1 and
//! v2012.07 have an inverted reset with a power-on-reset circuit that needs
//! about 100 ms to trigger.

/// Output pin wired to the peer reset input
pub trait ResetLine {
    /// Platform-specific error type
    type Error: core::fmt::Debug;

    /// Drive the line high
    fn set_high(&mut self) -> Result<(), Self::Error>;

    /// Drive the line low
    fn set_low(&mut self) -> Result<(), Self::Error>;
}

/// Reset pulse shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetProfile {
    /// High, low, high with no delays
    Standard,
    /// High, hold for `hold_ms`, then low
    DelayedRelease {
        /// Milliseconds to hold the line high
        hold_ms: u32,
    },
}

impl ResetProfile {
    /// Profile for the RedBearLab shields
    pub const REDBEARLAB: ResetProfile = ResetProfile::DelayedRelease { hold_ms: 100 };
}

impl Default for ResetProfile {
    fn default() -> Self {
        ResetProfile::Standard
    }
}

/// Apply `profile` to a reset line
///
/// `delay_ms` is only called by profiles that hold the line.
pub fn pulse_reset<R, F>(line: &mut R, profile: ResetProfile, mut delay_ms: F) -> Result<(), R::Error>
where
    R: ResetLine,
    F: FnMut(u32),
{
    match profile {
        ResetProfile::Standard => {
            line.set_high()?;
            line.set_low()?;
            line.set_high()
        }
        ResetProfile::DelayedRelease { hold_ms } => {
            line.set_high()?;
            delay_ms(hold_ms);
            line.set_low()
        }
    }
}
