// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Setup bootstrap: streams a pre-built configuration blob to the peer.
//!
//! ## States
//!
//! ```text
//! Idle ──preconditions──> Filling ──queue full or blob sent──> AwaitingResponse
//!                            ^                                     │
//!                            └──────────── continue ───────────────┤
//!                                                     complete ──> Done
//!                         anything else, or deadline expired ──> Failed
//! ```
//!
//! Every [`SetupBootstrap::step`] call performs one transition and never
//! blocks. While awaiting a response, only empty polls count against the
//! [`SetupDeadline`].

use aci_hal::{AciPhysical, TimeProvider};
use aci_protocol::{Event, StatusCode};
use aci_transport::{Frame, Mode, Transport, TransportResult};
use log::{debug, trace, warn};

use crate::error::SetupError;

/// Default number of empty polls tolerated while awaiting a response
pub const DEFAULT_SETUP_ROUNDS: u32 = 0xF_FFFE;

/// Queue operations the bootstrap needs from the link
pub trait SetupLink {
    /// True when no command is waiting to go out
    fn outbound_is_empty(&self) -> bool;

    /// Queue one frame; `Ok(false)` when the outbound queue is full
    fn submit(&mut self, frame: &Frame) -> TransportResult<bool>;

    /// Next inbound frame, left in place
    fn peek_inbound(&mut self) -> TransportResult<Option<Frame>>;

    /// Remove the next inbound frame
    fn consume_inbound(&mut self) -> TransportResult<Option<Frame>>;
}

impl<P: AciPhysical, const N: usize> SetupLink for Transport<P, N> {
    fn outbound_is_empty(&self) -> bool {
        self.command_queue_empty()
    }

    fn submit(&mut self, frame: &Frame) -> TransportResult<bool> {
        self.send(frame)
    }

    fn peek_inbound(&mut self) -> TransportResult<Option<Frame>> {
        self.event_peek()
    }

    fn consume_inbound(&mut self) -> TransportResult<Option<Frame>> {
        self.event_get()
    }
}

/// Transport held for the whole of a blocking run
///
/// While borrowed here the ready-line handler cannot reach the transport,
/// so in event-driven mode every inbound check runs a cycle first. In
/// polled mode the transport already does this on its own.
pub struct DrivenLink<'t, P, const N: usize>(pub &'t mut Transport<P, N>);

impl<P: AciPhysical, const N: usize> SetupLink for DrivenLink<'_, P, N> {
    fn outbound_is_empty(&self) -> bool {
        self.0.command_queue_empty()
    }

    fn submit(&mut self, frame: &Frame) -> TransportResult<bool> {
        self.0.send(frame)
    }

    fn peek_inbound(&mut self) -> TransportResult<Option<Frame>> {
        if self.0.mode() == Mode::EventDriven {
            self.0.on_ready()?;
        }
        self.0.event_peek()
    }

    fn consume_inbound(&mut self) -> TransportResult<Option<Frame>> {
        self.0.event_get()
    }
}

/// Bound on how long the bootstrap waits for a response
///
/// `restart` is called when a run starts and on every continue status.
/// `expired` is called once per poll that found nothing.
pub trait SetupDeadline {
    /// Start a fresh waiting period
    fn restart(&mut self);

    /// True once the waiting period is over
    fn expired(&mut self) -> bool;
}

/// Counts empty polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundBudget {
    limit: u32,
    count: u32,
}

impl RoundBudget {
    /// Expire after `limit` empty polls
    pub const fn new(limit: u32) -> Self {
        Self { limit, count: 0 }
    }

    /// Empty polls since the last restart
    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Default for RoundBudget {
    fn default() -> Self {
        Self::new(DEFAULT_SETUP_ROUNDS)
    }
}

impl SetupDeadline for RoundBudget {
    fn restart(&mut self) {
        self.count = 0;
    }

    fn expired(&mut self) -> bool {
        let over = self.count > self.limit;
        self.count = self.count.saturating_add(1);
        over
    }
}

/// Expires a fixed time after the last restart
pub struct WallClockDeadline<T> {
    time: T,
    timeout_us: u64,
    started_us: u64,
}

impl<T: TimeProvider> WallClockDeadline<T> {
    /// Deadline of `timeout_ms` measured on `time`
    pub fn new(time: T, timeout_ms: u32) -> Self {
        let started_us = time.now_us();
        Self {
            time,
            timeout_us: timeout_ms as u64 * 1000,
            started_us,
        }
    }

    /// Give back the time source
    pub fn into_inner(self) -> T {
        self.time
    }
}

impl<T: TimeProvider> SetupDeadline for WallClockDeadline<T> {
    fn restart(&mut self) {
        self.started_us = self.time.now_us();
    }

    fn expired(&mut self) -> bool {
        self.time.now_us().saturating_sub(self.started_us) > self.timeout_us
    }
}

/// Bootstrap position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupState {
    /// Preconditions not yet checked
    Idle,
    /// Submitting frames until the queue is full or the blob is sent
    Filling,
    /// Polling for the next command response
    AwaitingResponse,
    /// Peer reported completion after the whole blob
    Done,
    /// Stopped; a new run must start from the first frame
    Failed(SetupError),
}

impl SetupState {
    /// `Done` or `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, SetupState::Done | SetupState::Failed(_))
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupReport {
    /// Fill phases executed
    pub rounds: u32,
    /// Frames submitted
    pub frames_sent: usize,
}

/// Setup run over a borrowed blob
pub struct SetupBootstrap<'m, D = RoundBudget> {
    messages: &'m [Frame],
    cursor: usize,
    state: SetupState,
    deadline: D,
    rounds: u32,
}

impl<'m, D: SetupDeadline> SetupBootstrap<'m, D> {
    /// Bootstrap for `messages`, waiting at most `deadline` per response
    pub fn new(messages: &'m [Frame], deadline: D) -> Self {
        Self {
            messages,
            cursor: 0,
            state: SetupState::Idle,
            deadline,
            rounds: 0,
        }
    }

    /// Frames submitted so far
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current state
    pub fn state(&self) -> SetupState {
        self.state
    }

    /// Fill phases executed so far
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Rewind to the first frame for another attempt
    pub fn rewind(&mut self) {
        self.cursor = 0;
        self.rounds = 0;
        self.state = SetupState::Idle;
    }

    /// Perform one transition
    pub fn step<L: SetupLink>(&mut self, link: &mut L) -> SetupState {
        let next = match self.state {
            SetupState::Idle => self.start(link),
            SetupState::Filling => self.fill(link),
            SetupState::AwaitingResponse => self.await_response(link),
            terminal => return terminal,
        };
        if let SetupState::Failed(reason) = next {
            warn!("{} (frame {} of {})", reason, self.cursor, self.messages.len());
        }
        self.state = next;
        next
    }

    /// Step until `Done` or `Failed`
    pub fn run<L: SetupLink>(&mut self, link: &mut L) -> Result<SetupReport, SetupError> {
        loop {
            match self.step(link) {
                SetupState::Done => {
                    debug!("setup complete: {} frames in {} rounds", self.cursor, self.rounds);
                    return Ok(SetupReport {
                        rounds: self.rounds,
                        frames_sent: self.cursor,
                    });
                }
                SetupState::Failed(reason) => return Err(reason),
                _ => {}
            }
        }
    }

    fn start<L: SetupLink>(&mut self, link: &mut L) -> SetupState {
        if !link.outbound_is_empty() {
            return SetupState::Failed(SetupError::CommandQueueNotEmpty);
        }
        match link.peek_inbound() {
            Ok(None) => {}
            Ok(Some(_)) => return SetupState::Failed(SetupError::EventQueueNotEmpty),
            Err(e) => return SetupState::Failed(SetupError::Link(e)),
        }
        self.deadline.restart();
        SetupState::Filling
    }

    fn fill<L: SetupLink>(&mut self, link: &mut L) -> SetupState {
        self.rounds += 1;
        while let Some(frame) = self.messages.get(self.cursor) {
            match link.submit(frame) {
                Ok(true) => self.cursor += 1,
                Ok(false) => break,
                Err(e) => return SetupState::Failed(SetupError::Link(e)),
            }
        }
        trace!("setup round {}: {}/{} frames queued", self.rounds, self.cursor, self.messages.len());
        SetupState::AwaitingResponse
    }

    fn await_response<L: SetupLink>(&mut self, link: &mut L) -> SetupState {
        let frame = match link.peek_inbound() {
            Ok(Some(frame)) => frame,
            Ok(None) if self.deadline.expired() => return SetupState::Failed(SetupError::Timeout),
            Ok(None) => return SetupState::AwaitingResponse,
            Err(e) => return SetupState::Failed(SetupError::Link(e)),
        };

        // Anything but continue/complete stays queued for the caller
        let event = match Event::decode(&frame) {
            Ok(event) => event,
            Err(e) => return SetupState::Failed(SetupError::Malformed(e)),
        };
        let status = match event.as_command_response() {
            Some(response) => response.status,
            None => return SetupState::Failed(SetupError::UnexpectedEvent(event.raw_opcode())),
        };
        let next = match status {
            StatusCode::TransactionContinue => {
                self.deadline.restart();
                SetupState::Filling
            }
            StatusCode::TransactionComplete if self.cursor < self.messages.len() => {
                SetupState::Failed(SetupError::PrematureComplete {
                    sent: self.cursor,
                    total: self.messages.len(),
                })
            }
            StatusCode::TransactionComplete => SetupState::Done,
            other => return SetupState::Failed(SetupError::UnexpectedStatus(other)),
        };
        if let Err(e) = link.consume_inbound() {
            return SetupState::Failed(SetupError::Link(e));
        }
        next
    }
}
