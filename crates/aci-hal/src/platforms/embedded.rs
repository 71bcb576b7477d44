// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! `AciPhysical` over `embedded-hal` 1.0 traits.
//!
//! The SPI bus must be configured for mode 0. Controllers that cannot shift
//! LSB first should be wrapped in [`crate::LsbFirst`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::hal::{pulse_reset, AciPhysical, ResetLine, ResetProfile};

/// Which side of the bridge failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EmbeddedHalError {
    /// SPI bus transfer failed
    Spi,
    /// REQN pin write failed
    RequestPin,
    /// RDYN pin read failed
    ReadyPin,
    /// Reset pin write failed
    ResetPin,
}

struct ResetPin<'a, P>(&'a mut P);

impl<P: OutputPin> ResetLine for ResetPin<'_, P> {
    type Error = EmbeddedHalError;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high().map_err(|_| EmbeddedHalError::ResetPin)
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low().map_err(|_| EmbeddedHalError::ResetPin)
    }
}

/// SPI bus + REQN/RDYN/RESET pins + delay
pub struct EmbeddedHalPhysical<SPI, REQ, RDY, RST, D> {
    spi: SPI,
    reqn: REQ,
    rdyn: RDY,
    reset: Option<RST>,
    delay: D,
    profile: ResetProfile,
}

impl<SPI, REQ, RDY, RST, D> EmbeddedHalPhysical<SPI, REQ, RDY, RST, D>
where
    SPI: SpiBus<u8>,
    REQ: OutputPin,
    RDY: InputPin,
    RST: OutputPin,
    D: DelayNs,
{
    /// Assemble the bridge. `reset` may be `None` when the reset input is
    /// not wired, in which case `reset_peer` is a no-op.
    pub fn new(spi: SPI, reqn: REQ, rdyn: RDY, reset: Option<RST>, delay: D, profile: ResetProfile) -> Self {
        Self {
            spi,
            reqn,
            rdyn,
            reset,
            delay,
            profile,
        }
    }

    /// Release the owned peripherals
    pub fn release(self) -> (SPI, REQ, RDY, Option<RST>, D) {
        (self.spi, self.reqn, self.rdyn, self.reset, self.delay)
    }
}

impl<SPI, REQ, RDY, RST, D> AciPhysical for EmbeddedHalPhysical<SPI, REQ, RDY, RST, D>
where
    SPI: SpiBus<u8>,
    REQ: OutputPin,
    RDY: InputPin,
    RST: OutputPin,
    D: DelayNs,
{
    type Error = EmbeddedHalError;

    fn transfer_byte(&mut self, byte: u8) -> Result<u8, Self::Error> {
        let mut word = [byte];
        self.spi
            .transfer_in_place(&mut word)
            .map_err(|_| EmbeddedHalError::Spi)?;
        Ok(word[0])
    }

    fn set_request_line(&mut self, active: bool) -> Result<(), Self::Error> {
        // REQN is active-low
        let result = if active {
            self.reqn.set_low()
        } else {
            self.reqn.set_high()
        };
        result.map_err(|_| EmbeddedHalError::RequestPin)
    }

    fn read_ready_line(&mut self) -> Result<bool, Self::Error> {
        self.rdyn.is_high().map_err(|_| EmbeddedHalError::ReadyPin)
    }

    fn reset_peer(&mut self) -> Result<(), Self::Error> {
        let Some(reset) = self.reset.as_mut() else {
            return Ok(());
        };
        let delay = &mut self.delay;
        pulse_reset(&mut ResetPin(reset), self.profile, |ms| delay.delay_ms(ms))
    }
}
