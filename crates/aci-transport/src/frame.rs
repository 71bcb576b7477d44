// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Frame layout
//!
//! ```text
//! byte 0: status   (meaningful peer -> host only)
//! byte 1: length   (N = count of meaningful bytes that follow, opcode included)
//! byte 2: opcode
//! byte 3..: opcode-specific parameters
//! ```
//!
//! On the wire the host clocks its `length` byte in the slot where the peer
//! answers with `status`, so an outbound frame's `status` is never sent.

use core::fmt;

use crate::error::{TransportError, TransportResult};

/// Largest `length` value the link carries
pub const MAX_FRAME_PAYLOAD: usize = 31;

/// Length byte plus payload
pub const PACKET_MAX_LEN: usize = MAX_FRAME_PAYLOAD + 1;

/// One unit exchanged over the link
///
/// Frames are plain values: queues copy them in and out, nothing is shared.
#[derive(Clone, Copy)]
pub struct Frame {
    status: u8,
    // [length, opcode, params...]
    bytes: [u8; PACKET_MAX_LEN],
}

impl Frame {
    /// Zero-length frame, sent when the peer clocks an exchange and the host
    /// has nothing queued
    pub const EMPTY: Frame = Frame {
        status: 0,
        bytes: [0; PACKET_MAX_LEN],
    };

    /// Build an outbound frame from `[opcode, params...]`
    pub fn from_payload(payload: &[u8]) -> TransportResult<Frame> {
        if payload.len() > MAX_FRAME_PAYLOAD {
            return Err(TransportError::FrameTooLong {
                length: payload.len(),
                max_length: MAX_FRAME_PAYLOAD,
            });
        }
        let mut frame = Frame::EMPTY;
        frame.bytes[1..=payload.len()].copy_from_slice(payload);
        frame.bytes[0] = payload.len() as u8;
        Ok(frame)
    }

    /// Build a frame from `[length, opcode, params...]`
    ///
    /// Bytes past the declared length are ignored; fewer bytes than declared
    /// is rejected.
    pub fn from_wire(bytes: &[u8]) -> TransportResult<Frame> {
        let Some((&length, rest)) = bytes.split_first() else {
            return Ok(Frame::EMPTY);
        };
        let length = length as usize;
        if length > rest.len() {
            return Err(TransportError::Truncated {
                declared: length,
                available: rest.len(),
            });
        }
        Frame::from_payload(&rest[..length])
    }

    /// Same frame carrying a peer status byte
    pub fn with_status(mut self, status: u8) -> Frame {
        self.status = status;
        self
    }

    pub(crate) fn set_received(&mut self, status: u8, length: u8) {
        self.status = status;
        self.bytes[0] = length.min(MAX_FRAME_PAYLOAD as u8);
    }

    pub(crate) fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[1..]
    }

    /// Status byte clocked in with an inbound frame
    pub fn status(&self) -> u8 {
        self.status
    }

    /// Count of meaningful payload bytes, opcode included
    pub fn len(&self) -> usize {
        self.bytes[0] as usize
    }

    /// True for the zero-length frame
    pub fn is_empty(&self) -> bool {
        self.bytes[0] == 0
    }

    /// `[opcode, params...]`
    pub fn payload(&self) -> &[u8] {
        &self.bytes[1..=self.len()]
    }

    /// `[length, opcode, params...]`, the layout clocked onto the link
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..=self.len()]
    }

    /// Opcode byte, if the frame carries one
    pub fn opcode(&self) -> Option<u8> {
        self.payload().first().copied()
    }

    /// Payload byte at `index`, zero past the end of the buffer
    pub(crate) fn wire_byte(&self, index: usize) -> u8 {
        self.bytes.get(index + 1).copied().unwrap_or(0)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Frame::EMPTY
    }
}

// Bytes past `length` may hold whatever the last exchange clocked in
impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Frame {}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("status", &self.status)
            .field("length", &self.bytes[0])
            .field("payload", &self.payload())
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Frame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Frame status={=u8:x} payload={=[u8]:x}", self.status, self.payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_payload() {
        let frame = Frame::from_payload(&[0x02, 0xAA, 0xBB]).unwrap();
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.opcode(), Some(0x02));
        assert_eq!(frame.payload(), &[0x02, 0xAA, 0xBB]);
        assert_eq!(frame.status(), 0);
    }

    #[test]
    fn test_from_payload_rejects_oversize() {
        let bytes = [0u8; MAX_FRAME_PAYLOAD + 1];
        assert_eq!(
            Frame::from_payload(&bytes),
            Err(TransportError::FrameTooLong {
                length: 32,
                max_length: 31
            })
        );
        assert!(Frame::from_payload(&bytes[..MAX_FRAME_PAYLOAD]).is_ok());
    }

    #[test]
    fn test_from_wire() {
        let frame = Frame::from_wire(&[2, 0x8A, 0x01, 0xFF]).unwrap();
        assert_eq!(frame.payload(), &[0x8A, 0x01]);
        assert_eq!(
            Frame::from_wire(&[3, 0x8A]),
            Err(TransportError::Truncated {
                declared: 3,
                available: 1
            })
        );
        assert!(Frame::from_wire(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_as_bytes_includes_length() {
        let frame = Frame::from_payload(&[0x0C]).unwrap();
        assert_eq!(frame.as_bytes(), &[1, 0x0C]);
        assert_eq!(Frame::EMPTY.as_bytes(), &[0]);
    }

    #[test]
    fn test_empty_frame() {
        let frame = Frame::default();
        assert!(frame.is_empty());
        assert_eq!(frame.opcode(), None);
        assert_eq!(frame.wire_byte(0), 0);
        assert_eq!(frame.wire_byte(MAX_FRAME_PAYLOAD), 0);
    }

    #[test]
    fn test_received_length_is_capped() {
        let mut frame = Frame::EMPTY;
        frame.set_received(0x01, 0xFF);
        assert_eq!(frame.len(), MAX_FRAME_PAYLOAD);
        assert_eq!(frame.status(), 1);
    }
}
