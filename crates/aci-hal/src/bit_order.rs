// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The nRF8001 clocks bytes LSB first. SPI controllers that can only shift
//! MSB first get wrapped in [`LsbFirst`], which mirrors every byte on the way
//! out and on the way back in.

use crate::hal::AciPhysical;

const NIBBLE_REVERSED: [u8; 16] = [
    0x0, 0x8, 0x4, 0xC, 0x2, 0xA, 0x6, 0xE, 0x1, 0x9, 0x5, 0xD, 0x3, 0xB, 0x7, 0xF,
];

/// Mirror the bit order of one byte (bit 0 <-> bit 7, bit 1 <-> bit 6, ...)
#[inline]
pub const fn reverse_bits(byte: u8) -> u8 {
    (NIBBLE_REVERSED[(byte & 0x0F) as usize] << 4) | NIBBLE_REVERSED[(byte >> 4) as usize]
}

/// Bit-order adapter around an MSB-first link
#[derive(Debug)]
pub struct LsbFirst<P> {
    inner: P,
}

impl<P> LsbFirst<P> {
    /// Wrap an MSB-first link
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    /// Borrow the wrapped link
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Mutably borrow the wrapped link
    pub fn inner_mut(&mut self) -> &mut P {
        &mut self.inner
    }

    /// Unwrap
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: AciPhysical> AciPhysical for LsbFirst<P> {
    type Error = P::Error;

    fn transfer_byte(&mut self, byte: u8) -> Result<u8, Self::Error> {
        let received = self.inner.transfer_byte(reverse_bits(byte))?;
        Ok(reverse_bits(received))
    }

    fn set_request_line(&mut self, active: bool) -> Result<(), Self::Error> {
        self.inner.set_request_line(active)
    }

    fn read_ready_line(&mut self) -> Result<bool, Self::Error> {
        self.inner.read_ready_line()
    }

    fn reset_peer(&mut self) -> Result<(), Self::Error> {
        self.inner.reset_peer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Wire {
        last_out: u8,
        reply: u8,
    }

    impl AciPhysical for Wire {
        type Error = core::convert::Infallible;

        fn transfer_byte(&mut self, byte: u8) -> Result<u8, Self::Error> {
            self.last_out = byte;
            Ok(self.reply)
        }

        fn set_request_line(&mut self, _active: bool) -> Result<(), Self::Error> {
            Ok(())
        }

        fn read_ready_line(&mut self) -> Result<bool, Self::Error> {
            Ok(true)
        }

        fn reset_peer(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_reverse_bits_known_values() {
        assert_eq!(reverse_bits(0x00), 0x00);
        assert_eq!(reverse_bits(0x01), 0x80);
        assert_eq!(reverse_bits(0x81), 0x81);
        assert_eq!(reverse_bits(0x0F), 0xF0);
        assert_eq!(reverse_bits(0x12), 0x48);
    }

    #[test]
    fn test_reverse_bits_matches_core() {
        for b in 0..=u8::MAX {
            assert_eq!(reverse_bits(b), b.reverse_bits());
        }
    }

    #[test]
    fn test_adapter_mirrors_both_directions() {
        let mut link = LsbFirst::new(Wire {
            last_out: 0,
            reply: 0x80,
        });
        let got = link.transfer_byte(0x03).unwrap();
        assert_eq!(link.inner().last_out, 0xC0);
        assert_eq!(got, 0x01);
    }
}
