// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transfer cycle and request-line policy.
//!
//! ## One cycle
//!
//! ```text
//! inbound full? ──yes──> backpressure (request line left alone)
//!      │no
//! peer idle (RDYN high)? ──yes──> assert REQN if outbound non-empty
//!      │no
//! dequeue outbound (or EMPTY) ─> exchange ─> release REQN
//!      │
//! received length > 0 ─> enqueue inbound (overflow here is fatal)
//!      │
//! inbound has room and outbound non-empty ─> assert REQN again
//! ```
//!
//! ## Length negotiation
//!
//! The first clocked byte carries the host length out and the peer status in.
//! The second carries the host opcode out and the peer length in. The number
//! of remaining bytes is the larger of the two lengths (the host's minus the
//! opcode already sent), capped at [`MAX_FRAME_PAYLOAD`].

use aci_hal::{AciPhysical, TimeProvider};
use log::{debug, error, trace, warn};

use crate::error::{TransportError, TransportResult};
use crate::frame::{Frame, MAX_FRAME_PAYLOAD};
use crate::queue::FrameQueue;

/// Queue slots used when no capacity is named (3 usable frames per direction)
pub const DEFAULT_QUEUE_CAPACITY: usize = 4;

/// Settle time after the reset pulse before the peer drives its lines
const POST_RESET_SETTLE_MS: u32 = 30;

/// Who drives the transfer cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// The application calls into the transport often enough
    #[default]
    Polled,
    /// The ready-line interrupt calls [`Transport::on_ready`]
    EventDriven,
}

/// Transport settings fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportConfig {
    /// Cycle driver
    pub mode: Mode,
    /// Log every frame handed to the application at debug level
    pub debug_frames: bool,
}

impl TransportConfig {
    /// Settings for `mode` with frame tracing off
    pub const fn new(mode: Mode) -> Self {
        Self {
            mode,
            debug_frames: false,
        }
    }
}

/// What one transfer cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    /// Inbound queue full; nothing touched
    Backpressure,
    /// Peer idle; request line asserted because frames are waiting
    Requested,
    /// Peer idle and nothing to send
    Idle,
    /// One exchange ran
    Exchanged {
        /// Bytes of the outbound frame (0 for the synthesized empty frame)
        sent: usize,
        /// Bytes of the inbound frame (0 when the peer had nothing)
        received: usize,
    },
}

/// Link context: both queues plus the physical exchange
///
/// There is no global state. In event-driven mode the platform shares the
/// transport with its ready-line interrupt (for example through a
/// `critical_section::Mutex<RefCell<Transport<..>>>`) and calls
/// [`Transport::on_ready`] from the handler.
pub struct Transport<P, const N: usize = DEFAULT_QUEUE_CAPACITY> {
    phy: P,
    outbound: FrameQueue<N>,
    inbound: FrameQueue<N>,
    config: TransportConfig,
}

impl<P: AciPhysical, const N: usize> Transport<P, N> {
    /// Wrap a physical link; call [`Transport::init`] before use
    pub fn new(phy: P, config: TransportConfig) -> Self {
        Self {
            phy,
            outbound: FrameQueue::new(),
            inbound: FrameQueue::new(),
            config,
        }
    }

    /// Bring the link to a known state
    ///
    /// Flushes both queues, pulses the peer reset, drives the request line
    /// active as the peer expects after reset and waits for its lines to settle.
    pub fn init<T: TimeProvider>(&mut self, time: &mut T) -> TransportResult<()> {
        self.flush();
        self.reset_peer()?;
        self.set_request(true)?;
        time.delay_ms(POST_RESET_SETTLE_MS);
        debug!("ACI transport initialised ({:?}, {} slots)", self.config.mode, N);
        Ok(())
    }

    /// Operating mode
    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    /// Queue a command frame
    ///
    /// `Ok(false)` is backpressure: the outbound queue is full and the caller
    /// retries later.
    pub fn send(&mut self, frame: &Frame) -> TransportResult<bool> {
        if frame.len() > MAX_FRAME_PAYLOAD {
            return Err(TransportError::FrameTooLong {
                length: frame.len(),
                max_length: MAX_FRAME_PAYLOAD,
            });
        }
        if !self.outbound.enqueue(frame) {
            return Ok(false);
        }
        if self.config.debug_frames {
            debug!("C {:02X?}", frame.payload());
        }
        if !self.inbound.is_full() {
            self.set_request(true)?;
        }
        Ok(true)
    }

    /// Next inbound frame without removing it
    ///
    /// In polled mode this first runs one transfer cycle.
    pub fn event_peek(&mut self) -> TransportResult<Option<Frame>> {
        if self.config.mode == Mode::Polled {
            self.run_cycle()?;
        }
        Ok(self.inbound.peek())
    }

    /// Remove and return the next inbound frame
    ///
    /// In polled mode this first runs one transfer cycle when the inbound
    /// queue has room.
    pub fn event_get(&mut self) -> TransportResult<Option<Frame>> {
        if self.config.mode == Mode::Polled && !self.inbound.is_full() {
            self.run_cycle()?;
        }
        let Some(frame) = self.inbound.dequeue() else {
            return Ok(None);
        };
        if self.config.debug_frames {
            debug!("E {:02X?}", frame.payload());
        }
        // Room was just made; restart a stalled outbound queue
        if !self.inbound.is_full() && !self.outbound.is_empty() {
            self.set_request(true)?;
        }
        Ok(Some(frame))
    }

    /// Polled-mode entry point: one transfer cycle
    pub fn poll(&mut self) -> TransportResult<CycleOutcome> {
        self.run_cycle()
    }

    /// Ready-line handler entry point: one transfer cycle
    ///
    /// Does not block beyond a single exchange.
    pub fn on_ready(&mut self) -> TransportResult<CycleOutcome> {
        self.run_cycle()
    }

    /// Discard everything queued in both directions
    pub fn flush(&self) {
        self.outbound.init();
        self.inbound.init();
    }

    /// Pulse the peer reset line
    pub fn reset_peer(&mut self) -> TransportResult<()> {
        self.phy.reset_peer().map_err(|e| {
            error!("ACI peer reset failed: {:?}", e);
            TransportError::Physical
        })
    }

    /// Place a locally built frame on the inbound queue
    ///
    /// Returns `false` when the inbound queue is full.
    pub fn inject_event(&self, frame: &Frame) -> bool {
        self.inbound.enqueue(frame)
    }

    /// True when no command is waiting
    pub fn command_queue_empty(&self) -> bool {
        self.outbound.is_empty()
    }

    /// True when the outbound queue cannot take another command
    pub fn command_queue_full(&self) -> bool {
        self.outbound.is_full()
    }

    /// True when no event is waiting
    pub fn event_queue_empty(&self) -> bool {
        self.inbound.is_empty()
    }

    /// True when the inbound queue cannot take another event
    pub fn event_queue_full(&self) -> bool {
        self.inbound.is_full()
    }

    /// Borrow the physical link
    pub fn physical(&self) -> &P {
        &self.phy
    }

    /// Mutably borrow the physical link
    pub fn physical_mut(&mut self) -> &mut P {
        &mut self.phy
    }

    /// Give back the physical link
    pub fn into_physical(self) -> P {
        self.phy
    }

    fn run_cycle(&mut self) -> TransportResult<CycleOutcome> {
        if self.inbound.is_full() {
            trace!("inbound queue full, holding request line");
            return Ok(CycleOutcome::Backpressure);
        }

        let peer_idle = self.phy.read_ready_line().map_err(|e| {
            error!("ACI ready line read failed: {:?}", e);
            TransportError::Physical
        })?;
        if peer_idle {
            if self.outbound.is_empty() {
                return Ok(CycleOutcome::Idle);
            }
            self.set_request(true)?;
            return Ok(CycleOutcome::Requested);
        }

        let outgoing = self.outbound.dequeue().unwrap_or(Frame::EMPTY);
        let received = match self.exchange(&outgoing) {
            Ok(frame) => frame,
            Err(e) => {
                error!("ACI exchange failed: {:?}", e);
                // Best effort: leave the peer with REQN released
                if let Err(e) = self.phy.set_request_line(false) {
                    warn!("ACI request line release failed: {:?}", e);
                }
                return Err(TransportError::Physical);
            }
        };

        if !received.is_empty() {
            self.store_received(&received);
        }

        if !self.inbound.is_full() && !self.outbound.is_empty() {
            self.set_request(true)?;
        }

        Ok(CycleOutcome::Exchanged {
            sent: outgoing.len(),
            received: received.len(),
        })
    }

    fn exchange(&mut self, outgoing: &Frame) -> Result<Frame, P::Error> {
        let mut received = Frame::EMPTY;
        let tx_len = outgoing.len();

        self.phy.set_request_line(true)?;
        let status = self.phy.transfer_byte(tx_len as u8)?;
        let rx_len = self.phy.transfer_byte(outgoing.wire_byte(0))? as usize;

        let max_bytes = if tx_len == 0 {
            rx_len
        } else {
            rx_len.max(tx_len - 1)
        }
        .min(MAX_FRAME_PAYLOAD);

        let payload = received.payload_mut();
        for (i, slot) in payload.iter_mut().enumerate().take(max_bytes) {
            *slot = self.phy.transfer_byte(outgoing.wire_byte(i + 1))?;
        }
        self.phy.set_request_line(false)?;

        if rx_len > MAX_FRAME_PAYLOAD {
            warn!("ACI peer advertised {} bytes, truncated to {}", rx_len, MAX_FRAME_PAYLOAD);
        }
        received.set_received(status, rx_len.min(MAX_FRAME_PAYLOAD) as u8);
        Ok(received)
    }

    fn store_received(&self, received: &Frame) {
        // The full-queue check at the top of the cycle rules this out unless
        // another context filled the queue mid-exchange.
        if !self.inbound.enqueue(received) {
            panic!(
                "ACI inbound queue overflow ({} of {} frames queued), cannot drop {:?}",
                self.inbound.len(),
                N - 1,
                received
            );
        }
    }

    fn set_request(&mut self, active: bool) -> TransportResult<()> {
        self.phy.set_request_line(active).map_err(|e| {
            error!("ACI request line write failed: {:?}", e);
            TransportError::Physical
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aci_hal::sim::{Outbox, ScriptedPeer};

    struct NoDelay(u64);

    impl TimeProvider for NoDelay {
        fn now_us(&self) -> u64 {
            self.0
        }

        fn delay_us(&mut self, us: u32) {
            self.0 += us as u64;
        }
    }

    fn polled<R: aci_hal::sim::Responder>(peer: ScriptedPeer<R>) -> Transport<ScriptedPeer<R>> {
        Transport::new(peer, TransportConfig::new(Mode::Polled))
    }

    fn frame(bytes: &[u8]) -> Frame {
        Frame::from_payload(bytes).unwrap()
    }

    #[test]
    fn test_init_resets_and_settles() {
        let mut link = polled(ScriptedPeer::new());
        let mut clock = NoDelay(0);
        link.init(&mut clock).unwrap();
        assert_eq!(link.physical().resets(), 1);
        assert!(link.physical().request_active());
        assert_eq!(clock.0, 30_000);
    }

    #[test]
    fn test_idle_cycle_does_nothing() {
        let mut link = polled(ScriptedPeer::new());
        assert_eq!(link.poll().unwrap(), CycleOutcome::Idle);
        assert_eq!(link.physical().exchanges(), 0);
    }

    #[test]
    fn test_send_asserts_request_then_exchanges() {
        let mut link = polled(ScriptedPeer::new());
        assert!(link.send(&frame(&[0x02, 0x11, 0x22])).unwrap());
        assert!(link.physical().request_active());

        let outcome = link.poll().unwrap();
        assert_eq!(outcome, CycleOutcome::Exchanged { sent: 3, received: 0 });
        assert!(!link.physical().request_active());
        assert_eq!(link.physical().host_frames()[0].as_slice(), &[3, 0x02, 0x11, 0x22]);
        assert!(link.command_queue_empty());
    }

    #[test]
    fn test_peer_initiated_exchange_uses_empty_frame() {
        let mut link = polled(ScriptedPeer::new());
        link.physical_mut().push_event(&[2, 0x8A, 0x04]);
        let got = link.event_get().unwrap().unwrap();
        assert_eq!(got.payload(), &[0x8A, 0x04]);
        assert!(link.physical().host_frames().is_empty());
        assert_eq!(link.physical().exchanges(), 1);
    }

    #[test]
    fn test_length_negotiation_takes_longer_side() {
        let mut link = polled(ScriptedPeer::with_responder(|_: &[u8], _: &mut Outbox| {}));
        link.physical_mut().push_event(&[5, 0x82, 1, 2, 3, 4]);
        link.send(&frame(&[0x02, 0xAA])).unwrap();
        let got = link.event_get().unwrap().unwrap();
        assert_eq!(got.payload(), &[0x82, 1, 2, 3, 4]);
        assert_eq!(link.physical().host_frames()[0].as_slice(), &[2, 0x02, 0xAA]);
    }

    #[test]
    fn test_status_byte_is_captured() {
        let mut link = polled(ScriptedPeer::new());
        link.physical_mut().set_status_byte(0x3C);
        link.physical_mut().push_event(&[1, 0x81]);
        let got = link.event_get().unwrap().unwrap();
        assert_eq!(got.status(), 0x3C);
    }

    #[test]
    fn test_backpressure_when_inbound_full() {
        let mut link: Transport<ScriptedPeer, 3> =
            Transport::new(ScriptedPeer::new(), TransportConfig::new(Mode::Polled));
        for _ in 0..3 {
            link.physical_mut().push_event(&[2, 0x8A, 0x01]);
        }
        assert!(matches!(link.poll().unwrap(), CycleOutcome::Exchanged { .. }));
        assert!(matches!(link.poll().unwrap(), CycleOutcome::Exchanged { .. }));
        assert!(link.event_queue_full());
        assert_eq!(link.poll().unwrap(), CycleOutcome::Backpressure);
        assert_eq!(link.physical().pending_events(), 1);
    }

    #[test]
    fn test_send_reports_full_outbound_queue() {
        let mut link = polled(ScriptedPeer::new());
        for _ in 0..3 {
            assert!(link.send(&frame(&[0x05])).unwrap());
        }
        assert!(link.command_queue_full());
        assert!(!link.send(&frame(&[0x05])).unwrap());
    }

    #[test]
    fn test_pipelines_next_request() {
        let mut link = polled(ScriptedPeer::new());
        link.send(&frame(&[0x0B])).unwrap();
        link.send(&frame(&[0x0C])).unwrap();
        link.poll().unwrap();
        // Second frame still queued, request re-asserted right after release
        assert!(link.physical().request_active());
        link.poll().unwrap();
        assert!(!link.physical().request_active());
        assert_eq!(link.physical().host_frames().len(), 2);
    }

    #[test]
    fn test_event_driven_mode_does_not_cycle_on_get() {
        let mut link: Transport<ScriptedPeer> =
            Transport::new(ScriptedPeer::new(), TransportConfig::new(Mode::EventDriven));
        link.physical_mut().push_event(&[2, 0x8A, 0x01]);
        assert_eq!(link.event_get().unwrap(), None);
        link.on_ready().unwrap();
        assert_eq!(link.event_get().unwrap().unwrap().payload(), &[0x8A, 0x01]);
    }

    #[test]
    fn test_inject_and_flush() {
        let mut link = polled(ScriptedPeer::new());
        assert!(link.inject_event(&frame(&[0x81, 0x02, 0x00, 0x02])));
        assert_eq!(link.event_peek().unwrap().unwrap().opcode(), Some(0x81));
        link.flush();
        assert!(link.event_queue_empty());
    }

    #[test]
    #[should_panic(expected = "inbound queue overflow")]
    fn test_overflow_is_fatal() {
        let link: Transport<ScriptedPeer, 2> =
            Transport::new(ScriptedPeer::new(), TransportConfig::new(Mode::Polled));
        assert!(link.inject_event(&frame(&[0x8A, 0x01])));
        link.store_received(&frame(&[0x8A, 0x02]));
    }
}
