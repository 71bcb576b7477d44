// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Scripted ACI peer for host-side tests.
//!
//! `ScriptedPeer` implements [`AciPhysical`] the way an nRF8001 behaves at the
//! pins:
//! - RDYN is pulled low whenever the host requests a transfer or the peer has
//!   an event waiting
//! - the first byte clocked returns the status byte, the second returns the
//!   peer's frame length, and every following byte returns the next payload
//!   byte (zero once the peer frame is exhausted)
//! - releasing REQN ends the exchange; the bytes the host shifted out are
//!   recorded as a host frame and handed to the responder
//!
//! Frames are written as `[length, opcode, params...]`, the same layout the
//! codec produces without the leading status byte.

use heapless::{Deque, Vec};

use crate::hal::AciPhysical;

/// Largest `[length, payload...]` block the link can carry
pub const SIM_FRAME_CAPACITY: usize = 32;

/// Peer frames waiting to be clocked out
pub const SIM_OUTBOX_DEPTH: usize = 16;

/// Host frames kept for inspection
pub const SIM_HISTORY_DEPTH: usize = 64;

/// One `[length, payload...]` block
pub type SimFrame = Vec<u8, SIM_FRAME_CAPACITY>;

/// Errors raised by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// A byte was clocked while REQN was released and the peer had nothing to say
    ClockWithoutHandshake,
    /// An exchange ran past the link MTU
    Overrun,
}

/// Peer frames queued for transmission
#[derive(Debug, Default)]
pub struct Outbox {
    frames: Deque<SimFrame, SIM_OUTBOX_DEPTH>,
}

impl Outbox {
    /// Queue `[length, opcode, params...]`; returns `false` when full or oversize
    pub fn push(&mut self, bytes: &[u8]) -> bool {
        let Ok(frame) = SimFrame::from_slice(bytes) else {
            return false;
        };
        self.frames.push_back(frame).is_ok()
    }

    /// Frames still waiting
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Reaction to a completed host frame
pub trait Responder {
    /// Called once per non-empty host frame, in arrival order
    fn respond(&mut self, host_frame: &[u8], outbox: &mut Outbox);
}

impl<F> Responder for F
where
    F: FnMut(&[u8], &mut Outbox),
{
    fn respond(&mut self, host_frame: &[u8], outbox: &mut Outbox) {
        self(host_frame, outbox)
    }
}

/// Responder that never replies
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Responder for Silent {
    fn respond(&mut self, _host_frame: &[u8], _outbox: &mut Outbox) {}
}

#[derive(Debug, Default)]
struct Exchange {
    outgoing: SimFrame,
    captured: Vec<u8, { SIM_FRAME_CAPACITY + 1 }>,
}

/// Deterministic stand-in for the peer controller
#[derive(Debug)]
pub struct ScriptedPeer<R = Silent> {
    responder: R,
    outbox: Outbox,
    history: Vec<SimFrame, SIM_HISTORY_DEPTH>,
    exchange: Option<Exchange>,
    request_active: bool,
    status_byte: u8,
    exchanges: u32,
    resets: u32,
}

impl ScriptedPeer<Silent> {
    /// Peer that only sends what the test queues
    pub fn new() -> Self {
        Self::with_responder(Silent)
    }
}

impl Default for ScriptedPeer<Silent> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Responder> ScriptedPeer<R> {
    /// Peer that reacts to every host frame through `responder`
    pub fn with_responder(responder: R) -> Self {
        Self {
            responder,
            outbox: Outbox::default(),
            history: Vec::new(),
            exchange: None,
            request_active: false,
            status_byte: 0,
            exchanges: 0,
            resets: 0,
        }
    }

    /// Queue a peer frame `[length, opcode, params...]`
    pub fn push_event(&mut self, bytes: &[u8]) -> bool {
        self.outbox.push(bytes)
    }

    /// Byte returned in the status slot of every exchange
    pub fn set_status_byte(&mut self, status: u8) {
        self.status_byte = status;
    }

    /// Host frames received so far, oldest first
    pub fn host_frames(&self) -> &[SimFrame] {
        &self.history
    }

    /// Peer frames not yet clocked out
    pub fn pending_events(&self) -> usize {
        self.outbox.len()
    }

    /// Completed exchanges, including empty ones
    pub fn exchanges(&self) -> u32 {
        self.exchanges
    }

    /// Number of `reset_peer` calls
    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Current REQN state as driven by the host
    pub fn request_active(&self) -> bool {
        self.request_active
    }

    fn begin_exchange(&mut self) -> Exchange {
        Exchange {
            outgoing: self.outbox.frames.pop_front().unwrap_or_default(),
            captured: Vec::new(),
        }
    }

    fn finish_exchange(&mut self, exchange: Exchange) {
        self.exchanges += 1;
        let captured = exchange.captured;
        let Some(&host_len) = captured.first() else {
            return;
        };
        if host_len == 0 {
            return;
        }
        let end = (host_len as usize + 1).min(captured.len());
        let Ok(frame) = SimFrame::from_slice(&captured[..end]) else {
            return;
        };
        self.responder.respond(&frame, &mut self.outbox);
        // Oldest entries are kept; a test that overflows the history has
        // already seen what it needs.
        let _ = self.history.push(frame);
    }
}

impl<R: Responder> AciPhysical for ScriptedPeer<R> {
    type Error = SimError;

    fn transfer_byte(&mut self, byte: u8) -> Result<u8, Self::Error> {
        if self.exchange.is_none() {
            if !self.request_active && self.outbox.is_empty() {
                return Err(SimError::ClockWithoutHandshake);
            }
            self.exchange = Some(self.begin_exchange());
        }
        let status = self.status_byte;
        let Some(exchange) = self.exchange.as_mut() else {
            return Err(SimError::ClockWithoutHandshake);
        };
        let position = exchange.captured.len();
        exchange
            .captured
            .push(byte)
            .map_err(|_| SimError::Overrun)?;
        if position == 0 {
            return Ok(status);
        }
        // Slot 1 carries the peer length, slot n carries payload byte n-2
        Ok(exchange.outgoing.get(position - 1).copied().unwrap_or(0))
    }

    fn set_request_line(&mut self, active: bool) -> Result<(), Self::Error> {
        self.request_active = active;
        if !active {
            if let Some(exchange) = self.exchange.take() {
                self.finish_exchange(exchange);
            }
        }
        Ok(())
    }

    fn read_ready_line(&mut self) -> Result<bool, Self::Error> {
        let ready = self.request_active || !self.outbox.is_empty();
        Ok(!ready)
    }

    fn reset_peer(&mut self) -> Result<(), Self::Error> {
        self.resets += 1;
        self.exchange = None;
        self.outbox.frames.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(peer: &mut ScriptedPeer<impl Responder>, bytes: &[u8]) -> Vec<u8, 40> {
        let mut got = Vec::new();
        for &b in bytes {
            got.push(peer.transfer_byte(b).unwrap()).unwrap();
        }
        got
    }

    #[test]
    fn test_idle_peer_is_not_ready() {
        let mut peer = ScriptedPeer::new();
        assert!(peer.read_ready_line().unwrap());
        assert_eq!(peer.transfer_byte(0), Err(SimError::ClockWithoutHandshake));
    }

    #[test]
    fn test_pending_event_pulls_ready_low() {
        let mut peer = ScriptedPeer::new();
        assert!(peer.push_event(&[2, 0x8A, 0x01]));
        assert!(!peer.read_ready_line().unwrap());
    }

    #[test]
    fn test_exchange_layout() {
        let mut peer = ScriptedPeer::new();
        peer.set_status_byte(0x55);
        peer.push_event(&[2, 0x8A, 0x03]);
        peer.set_request_line(true).unwrap();
        let got = clock(&mut peer, &[2, 0x02, 0xAA, 0x00]);
        peer.set_request_line(false).unwrap();
        assert_eq!(got.as_slice(), &[0x55, 2, 0x8A, 0x03]);
        assert_eq!(peer.host_frames().len(), 1);
        assert_eq!(peer.host_frames()[0].as_slice(), &[2, 0x02, 0xAA]);
        assert_eq!(peer.exchanges(), 1);
    }

    #[test]
    fn test_responder_replies() {
        let mut peer = ScriptedPeer::with_responder(|frame: &[u8], out: &mut Outbox| {
            out.push(&[3, 0x84, frame[1], 0x00]);
        });
        peer.set_request_line(true).unwrap();
        clock(&mut peer, &[1, 0x0C]);
        peer.set_request_line(false).unwrap();
        assert_eq!(peer.pending_events(), 1);
        peer.set_request_line(true).unwrap();
        let got = clock(&mut peer, &[0, 0, 0, 0]);
        peer.set_request_line(false).unwrap();
        assert_eq!(got.as_slice(), &[0, 3, 0x84, 0x0C]);
    }

    #[test]
    fn test_reset_drops_script() {
        let mut peer = ScriptedPeer::new();
        peer.push_event(&[1, 0x81]);
        peer.reset_peer().unwrap();
        assert_eq!(peer.pending_events(), 0);
        assert_eq!(peer.resets(), 1);
    }
}
