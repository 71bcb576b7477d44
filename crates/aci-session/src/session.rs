// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Link state derived from decoded events.
//!
//! [`Session::on_event`] is the only mutator of the pipe bitmaps, the credit
//! counters and the connection timing. Command helpers read them to validate
//! requests before anything is queued.

use aci_protocol::{BondStatusCode, ConnectionTiming, DeviceMode, Event};
use log::{debug, info};

use crate::credit::{CreditEvent, CreditState};
use crate::error::SessionResult;
use crate::pipes::PipeState;

/// Remote pipe operation waiting for a `PipeStatus` answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemotePipeRequest {
    /// `OpenRemotePipe` sent for this pipe
    Open(u8),
    /// `CloseRemotePipe` sent for this pipe
    Close(u8),
}

/// Pipe, credit and timing state for one link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pipes: PipeState,
    credit: CreditState,
    timing: ConnectionTiming,
    device_mode: Option<DeviceMode>,
    connected: bool,
    bonded: bool,
    pending: Option<RemotePipeRequest>,
}

impl Session {
    /// Fresh state: no pipes, no credit, mode unknown
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event in arrival order
    ///
    /// Returns the credit outcome for `DataCredit` events.
    pub fn on_event(&mut self, event: &Event) -> Option<CreditEvent> {
        match event {
            Event::DeviceStarted {
                mode,
                credit_available,
                ..
            } => {
                info!("peer started in {:?} mode with {} credits", mode, credit_available);
                self.device_mode = Some(*mode);
                self.credit = CreditState::new(*credit_available);
            }
            Event::Connected { timing, .. } => {
                self.connected = true;
                self.timing = *timing;
                self.credit.restore();
            }
            Event::Disconnected { aci_status, btle_status } => {
                debug!("disconnected: aci {:?}, btle 0x{:02X}", aci_status, btle_status);
                self.connected = false;
                self.pipes = PipeState::CLEARED;
                self.credit.restore();
                self.pending = None;
            }
            Event::PipeStatus { open, closed } => {
                self.pipes = PipeState {
                    open: *open,
                    closed: *closed,
                };
                self.pending = None;
            }
            Event::Timing(timing) => self.timing = *timing,
            Event::DataCredit(credit) => return Some(self.credit.grant(*credit)),
            Event::BondStatus(status) => self.bonded = status.status_code == BondStatusCode::Success,
            _ => {}
        }
        None
    }

    /// Pipe `n` is open for traffic
    pub fn is_pipe_open(&self, pipe: u8) -> bool {
        self.pipes.is_open(pipe)
    }

    /// Pipe `n` is closed
    pub fn is_pipe_closed(&self, pipe: u8) -> bool {
        self.pipes.is_closed(pipe)
    }

    /// Service discovery done (bit 0 of the open bitmap)
    pub fn is_discovery_finished(&self) -> bool {
        self.pipes.open[0] & 0x01 != 0
    }

    /// Current bitmaps
    pub fn pipes(&self) -> &PipeState {
        &self.pipes
    }

    /// Forget the bitmaps, as after a queued disconnect
    pub fn clear_pipes(&mut self) {
        self.pipes = PipeState::CLEARED;
    }

    /// True when a credit-consuming send must be held back
    pub fn send_would_exceed_credit(&self) -> bool {
        self.credit.is_exhausted()
    }

    /// Spend one credit for an accepted send
    pub fn consume_credit(&mut self) -> SessionResult<()> {
        self.credit.consume()
    }

    /// Credit counters
    pub fn credit(&self) -> &CreditState {
        &self.credit
    }

    /// Connection parameters in force
    pub fn timing(&self) -> &ConnectionTiming {
        &self.timing
    }

    /// Mode from the last `DeviceStarted`
    pub fn device_mode(&self) -> Option<DeviceMode> {
        self.device_mode
    }

    /// A central is connected
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The last bonding attempt succeeded
    pub fn is_bonded(&self) -> bool {
        self.bonded
    }

    /// Remote pipe operation still unanswered
    pub fn pending_remote_pipe(&self) -> Option<RemotePipeRequest> {
        self.pending
    }

    pub(crate) fn set_pending_remote_pipe(&mut self, request: RemotePipeRequest) {
        self.pending = Some(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aci_protocol::{BondStatus, BondStatusSource, HwError, StatusCode};

    fn started(credit: u8) -> Event {
        Event::DeviceStarted {
            mode: DeviceMode::Standby,
            hw_error: HwError::None,
            credit_available: credit,
        }
    }

    fn pipe_status(open0: u8, closed0: u8) -> Event {
        let mut open = [0u8; 8];
        let mut closed = [0u8; 8];
        open[0] = open0;
        closed[0] = closed0;
        Event::PipeStatus { open, closed }
    }

    #[test]
    fn test_credit_scenario() {
        let mut session = Session::new();
        session.on_event(&started(2));
        assert_eq!(session.credit().available(), 2);

        assert!(!session.send_would_exceed_credit());
        session.consume_credit().unwrap();
        session.consume_credit().unwrap();
        assert!(session.send_would_exceed_credit());
        assert!(session.consume_credit().is_err());

        let outcome = session.on_event(&Event::DataCredit(2));
        assert_eq!(outcome, Some(CreditEvent::Granted { available: 2 }));
        assert_eq!(session.credit().available(), 2);
    }

    #[test]
    fn test_pipe_status_overwrites_and_is_idempotent() {
        let mut session = Session::new();
        session.on_event(&pipe_status(0b0000_0110, 0b1000_0000));
        assert!(session.is_pipe_open(1));
        assert!(session.is_pipe_open(2));
        assert!(session.is_pipe_closed(7));

        let once = session.clone();
        session.on_event(&pipe_status(0b0000_0110, 0b1000_0000));
        assert_eq!(session, once);

        session.on_event(&pipe_status(0b0000_1000, 0));
        assert!(!session.is_pipe_open(1));
        assert!(session.is_pipe_open(3));
        assert!(!session.is_pipe_closed(7));
    }

    #[test]
    fn test_disconnect_clears_pipes_and_restores_credit() {
        let mut session = Session::new();
        session.on_event(&started(3));
        session.on_event(&pipe_status(0xFF, 0x00));
        session.consume_credit().unwrap();
        session.set_pending_remote_pipe(RemotePipeRequest::Open(4));

        session.on_event(&Event::Disconnected {
            aci_status: StatusCode::Success,
            btle_status: 0x13,
        });
        assert_eq!(session.pipes(), &PipeState::CLEARED);
        assert_eq!(session.credit().available(), 3);
        assert_eq!(session.pending_remote_pipe(), None);
        assert!(!session.is_connected());
    }

    #[test]
    fn test_timing_and_discovery() {
        let mut session = Session::new();
        let timing = ConnectionTiming {
            interval: 24,
            slave_latency: 0,
            supervision_timeout: 400,
        };
        session.on_event(&Event::Timing(timing));
        assert_eq!(session.timing().interval_ms(), 30);
        assert!(!session.is_discovery_finished());
        session.on_event(&pipe_status(0x01, 0));
        assert!(session.is_discovery_finished());
    }

    #[test]
    fn test_bond_status() {
        let mut session = Session::new();
        let status = |code| {
            Event::BondStatus(BondStatus {
                status_code: code,
                source: BondStatusSource::Local,
                secmode1_bitmap: 0,
                secmode2_bitmap: 0,
                keys_exchanged_slave: 0,
                keys_exchanged_master: 0,
            })
        };
        session.on_event(&status(BondStatusCode::Success));
        assert!(session.is_bonded());
        session.on_event(&status(BondStatusCode::FailedTimedOut));
        assert!(!session.is_bonded());
    }
}
