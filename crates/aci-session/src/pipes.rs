// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pipe bitmaps and the caller-supplied pipe type map.

use core::ops::BitOr;

use aci_protocol::{PipeBitmap, PIPE_BITMAP_LEN, PIPE_NUMBER_MAX};
use heapless::Vec;

use crate::error::{SessionError, SessionResult};

/// Where a pipe's characteristic lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PipeStore {
    /// Unused slot
    #[default]
    Invalid = 0x00,
    /// Hosted by this device
    Local = 0x01,
    /// Hosted by the connected central
    Remote = 0x02,
}

/// Pipe type flags as produced by the setup generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipeType(u16);

impl PipeType {
    /// Broadcast in advertising packets
    pub const TX_BROADCAST: PipeType = PipeType(0x0001);
    /// Notify
    pub const TX: PipeType = PipeType(0x0002);
    /// Indicate
    pub const TX_ACK: PipeType = PipeType(0x0004);
    /// Write without response
    pub const RX: PipeType = PipeType(0x0008);
    /// Write with response, acknowledged by the application
    pub const RX_ACK: PipeType = PipeType(0x0010);
    /// Read by the central
    pub const TX_REQ: PipeType = PipeType(0x0020);
    /// Read from the central
    pub const RX_REQ: PipeType = PipeType(0x0040);
    /// Local value set by `SetLocalData`
    pub const SET: PipeType = PipeType(0x0080);
    /// Signed write out
    pub const TX_SIGN: PipeType = PipeType(0x0100);
    /// Signed write in
    pub const RX_SIGN: PipeType = PipeType(0x0200);
    /// Write with response, acknowledged by the peer
    pub const RX_ACK_AUTO: PipeType = PipeType(0x0400);

    /// Wrap raw flags
    pub const fn from_bits(bits: u16) -> Self {
        PipeType(bits)
    }

    /// Raw flags
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// True when every flag of `other` is set
    pub const fn contains(self, other: PipeType) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PipeType {
    type Output = PipeType;

    fn bitor(self, rhs: PipeType) -> PipeType {
        PipeType(self.0 | rhs.0)
    }
}

/// One pipe's map entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipeInfo {
    /// Where the characteristic lives
    pub location: PipeStore,
    /// Pipe type flags
    pub pipe_type: PipeType,
}

impl PipeInfo {
    /// Map entry
    pub const fn new(location: PipeStore, pipe_type: PipeType) -> Self {
        Self { location, pipe_type }
    }
}

/// Per-pipe location and type, entry `n - 1` describing pipe `n`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipeMap {
    entries: Vec<PipeInfo, { PIPE_NUMBER_MAX as usize }>,
}

impl PipeMap {
    /// Empty map; every pipe lookup fails
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Copy a generated table
    pub fn from_slice(entries: &[PipeInfo]) -> SessionResult<Self> {
        let entries = Vec::from_slice(entries).map_err(|_| SessionError::OutOfRange {
            field: "pipe map entries",
            value: entries.len() as u32,
        })?;
        Ok(Self { entries })
    }

    /// Entry for `pipe`
    pub fn get(&self, pipe: u8) -> SessionResult<PipeInfo> {
        if pipe == 0 || pipe > PIPE_NUMBER_MAX {
            return Err(SessionError::InvalidPipe(pipe));
        }
        self.entries
            .get(pipe as usize - 1)
            .copied()
            .ok_or(SessionError::PipeNotMapped(pipe))
    }

    /// Entries in the map
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no pipes are mapped
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Test the bit for `pipe` in a bitmap
pub fn bitmap_test(bitmap: &PipeBitmap, pipe: u8) -> bool {
    let byte = pipe as usize / 8;
    byte < PIPE_BITMAP_LEN && bitmap[byte] & (1 << (pipe % 8)) != 0
}

/// Set the bit for `pipe` in a bitmap
pub fn bitmap_set(bitmap: &mut PipeBitmap, pipe: u8) {
    let byte = pipe as usize / 8;
    if byte < PIPE_BITMAP_LEN {
        bitmap[byte] |= 1 << (pipe % 8);
    }
}

/// Open and closed pipe bitmaps as last reported by the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipeState {
    /// Pipes available for traffic
    pub open: PipeBitmap,
    /// Pipes that must be opened first
    pub closed: PipeBitmap,
}

impl PipeState {
    /// Both bitmaps zero
    pub const CLEARED: PipeState = PipeState {
        open: [0; PIPE_BITMAP_LEN],
        closed: [0; PIPE_BITMAP_LEN],
    };

    /// Pipe `n` is open
    pub fn is_open(&self, pipe: u8) -> bool {
        bitmap_test(&self.open, pipe)
    }

    /// Pipe `n` is closed
    pub fn is_closed(&self, pipe: u8) -> bool {
        bitmap_test(&self.closed, pipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_indexing() {
        let mut bitmap = [0u8; PIPE_BITMAP_LEN];
        bitmap_set(&mut bitmap, 0);
        bitmap_set(&mut bitmap, 9);
        bitmap_set(&mut bitmap, 61);
        assert_eq!(bitmap, [0x01, 0x02, 0, 0, 0, 0, 0, 0x20]);
        assert!(bitmap_test(&bitmap, 9));
        assert!(!bitmap_test(&bitmap, 10));
        assert!(!bitmap_test(&bitmap, 200));
    }

    #[test]
    fn test_pipe_map_is_one_based() {
        let map = PipeMap::from_slice(&[
            PipeInfo::new(PipeStore::Local, PipeType::SET),
            PipeInfo::new(PipeStore::Local, PipeType::TX),
        ])
        .unwrap();
        assert_eq!(map.get(2).unwrap().pipe_type, PipeType::TX);
        assert_eq!(map.get(0), Err(SessionError::InvalidPipe(0)));
        assert_eq!(map.get(3), Err(SessionError::PipeNotMapped(3)));
        assert_eq!(map.get(63), Err(SessionError::InvalidPipe(63)));
    }

    #[test]
    fn test_pipe_map_upper_bound() {
        let tx = PipeInfo::new(PipeStore::Local, PipeType::TX);
        let map = PipeMap::from_slice(&[tx; PIPE_NUMBER_MAX as usize]).unwrap();
        assert_eq!(map.get(61).unwrap().pipe_type, PipeType::TX);
        assert_eq!(map.get(62), Err(SessionError::InvalidPipe(62)));

        // No entry can describe a pipe past the last bitmap bit
        assert!(PipeMap::from_slice(&[tx; PIPE_NUMBER_MAX as usize + 1]).is_err());
    }

    #[test]
    fn test_pipe_type_flags() {
        let both = PipeType::TX | PipeType::TX_ACK;
        assert_eq!(both.bits(), 0x0006);
        assert!(both.contains(PipeType::TX));
        assert!(!PipeType::TX.contains(both));
    }
}
