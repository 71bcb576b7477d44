// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Physical exchange Hardware Abstraction Layer
//!
//! This module defines the platform-agnostic trait for the byte link between
//! the host and an ACI peripheral controller. Platform implementations (SPI
//! peripheral + GPIO pins, bit-banged SPI, simulators) implement this trait
//! and hand it to the transport.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Transport (aci-transport)                    │
//! └─────────────────┬────────────────────────────┘
//!                   │ uses
//! ┌─────────────────▼────────────────────────────┐
//! │ AciPhysical trait (THIS FILE)                │
//! │ - transfer_byte()                            │
//! │ - set_request_line() / read_ready_line()     │
//! │ - reset_peer()                               │
//! └─────────────────┬────────────────────────────┘
//!                   │ implements
//! ┌─────────────────▼────────────────────────────┐
//! │ Platform Implementation                      │
//! │ - EmbeddedHalPhysical (SpiBus + pins)        │
//! │ - LsbFirst<P> (bit-order adapter)            │
//! │ - ScriptedPeer (host tests)                  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Handshake
//!
//! Both handshake lines are active-low on the wire. The trait speaks in
//! logical terms: `set_request_line(true)` pulls REQN low, and
//! `read_ready_line()` returns the raw RDYN level, so `true` means the peer is
//! idle and `false` means the peer is ready to clock a frame.

/// Byte link to an ACI peripheral controller
///
/// ## Design Principles
///
/// 1. **Minimal API**: one byte exchange and two handshake lines
/// 2. **Error transparency**: platform errors are exposed
/// 3. **No callbacks**: the ready-line interrupt is wired up by the platform
///    and calls into the transport
///
/// ## Thread Safety
///
/// Implementations do NOT need to be `Send` or `Sync`. The transport owns the
/// physical link and is the only caller.
pub trait AciPhysical {
    /// Platform-specific error type
    type Error: core::fmt::Debug;

    /// Full-duplex exchange of one byte
    ///
    /// Shifts `byte` out to the peer and returns the byte shifted in during
    /// the same clock cycles.
    fn transfer_byte(&mut self, byte: u8) -> Result<u8, Self::Error>;

    /// Drive the host request line (REQN)
    ///
    /// `active == true` asserts the request (line driven low).
    fn set_request_line(&mut self, active: bool) -> Result<(), Self::Error>;

    /// Sample the peer ready line (RDYN)
    ///
    /// Returns `true` while the peer is NOT ready (line idle-high) and `false`
    /// once the peer has asserted readiness.
    fn read_ready_line(&mut self) -> Result<bool, Self::Error>;

    /// Pulse the hardware reset line with device-specific timing
    fn reset_peer(&mut self) -> Result<(), Self::Error>;

    /// Convenience inverse of `read_ready_line`
    fn peer_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.read_ready_line()?)
    }
}

impl<T: AciPhysical + ?Sized> AciPhysical for &mut T {
    type Error = T::Error;

    fn transfer_byte(&mut self, byte: u8) -> Result<u8, Self::Error> {
        (**self).transfer_byte(byte)
    }

    fn set_request_line(&mut self, active: bool) -> Result<(), Self::Error> {
        (**self).set_request_line(active)
    }

    fn read_ready_line(&mut self) -> Result<bool, Self::Error> {
        (**self).read_ready_line()
    }

    fn reset_peer(&mut self) -> Result<(), Self::Error> {
        (**self).reset_peer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Loopback link: echoes every byte back, ready whenever requested
    struct MockLink {
        request: bool,
        resets: u8,
        shifted: heapless::Vec<u8, 64>,
    }

    impl MockLink {
        fn new() -> Self {
            Self {
                request: false,
                resets: 0,
                shifted: heapless::Vec::new(),
            }
        }
    }

    impl AciPhysical for MockLink {
        type Error = &'static str;

        fn transfer_byte(&mut self, byte: u8) -> Result<u8, Self::Error> {
            if !self.request {
                return Err("Request line not asserted");
            }
            self.shifted.push(byte).map_err(|_| "Shift buffer full")?;
            Ok(byte)
        }

        fn set_request_line(&mut self, active: bool) -> Result<(), Self::Error> {
            self.request = active;
            Ok(())
        }

        fn read_ready_line(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.request)
        }

        fn reset_peer(&mut self) -> Result<(), Self::Error> {
            self.resets += 1;
            Ok(())
        }
    }

    #[test]
    fn test_transfer_requires_request() {
        let mut link = MockLink::new();
        assert!(link.transfer_byte(0x42).is_err());
    }

    #[test]
    fn test_ready_follows_request() {
        let mut link = MockLink::new();
        assert!(!link.peer_ready().unwrap());
        link.set_request_line(true).unwrap();
        assert!(link.peer_ready().unwrap());
        assert!(!link.read_ready_line().unwrap());
    }

    #[test]
    fn test_forwarding_through_mut_ref() {
        let mut link = MockLink::new();
        {
            let mut by_ref = &mut link;
            by_ref.set_request_line(true).unwrap();
            assert_eq!(by_ref.transfer_byte(0x10).unwrap(), 0x10);
            by_ref.reset_peer().unwrap();
        }
        assert_eq!(link.shifted.as_slice(), &[0x10]);
        assert_eq!(link.resets, 1);
    }
}
