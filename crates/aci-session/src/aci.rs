// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Application-facing link: validated command helpers and the event pump.
//!
//! Every helper returns `SessionResult<bool>`. `Ok(false)` is outbound
//! backpressure and the caller retries later; `Err` means the request was
//! rejected before anything was queued.

use aci_hal::{AciPhysical, ResetProfile, TimeProvider};
use aci_protocol::{
    AppLatencyMode, Command, ConnectionParams, DeviceMode, DisconnectReason, Event, HwError,
    KeyMaterial, PipeBitmap, StatusCode, TestMode, TimingRequest, TxPower, PIPE_BITMAP_LEN,
    PIPE_NUMBER_MAX,
};
use aci_transport::{Frame, Mode, Transport, DEFAULT_QUEUE_CAPACITY};
use log::{debug, info, trace, warn};

use crate::error::{SessionError, SessionResult, SetupError};
use crate::pipes::{bitmap_set, PipeMap, PipeStore, PipeType};
use crate::session::{RemotePipeRequest, Session};
use crate::setup::{DrivenLink, RoundBudget, SetupBootstrap, SetupDeadline, SetupReport, SetupState};

/// Longest advertising run accepted by `broadcast`, in seconds
pub const BROADCAST_TIMEOUT_MAX: u16 = 16383;

/// Accepted `broadcast` advertising intervals, in 0.625 ms units
pub const BROADCAST_INTERVAL_RANGE: core::ops::RangeInclusive<u16> = 160..=16384;

/// Delay before the RedBearLab v1.1 shield accepts commands after reset
const REDBEARLAB_BOOT_MS: u32 = 100;

/// Carrier board of the peer module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Board {
    /// Plain module (nRF2740, nRF2741 and similar)
    #[default]
    Standard,
    /// RedBearLab shield v1.1
    RedBearLabV1_1,
    /// RedBearLab shield v2012.07
    RedBearLabV2012_07,
}

impl Board {
    /// Reset pulse this board needs
    pub fn reset_profile(self) -> ResetProfile {
        match self {
            Board::Standard => ResetProfile::Standard,
            Board::RedBearLabV1_1 | Board::RedBearLabV2012_07 => ResetProfile::REDBEARLAB,
        }
    }
}

/// Result of one [`Aci::board_init_step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardInitStep {
    /// Nothing received yet
    Waiting,
    /// An unrelated event arrived and was dropped
    Discarded,
    /// The response arrived and `DeviceStarted` is queued
    Started,
}

/// Transport plus the session state it feeds
pub struct Aci<P, const N: usize = DEFAULT_QUEUE_CAPACITY> {
    transport: Transport<P, N>,
    session: Session,
    pipes: PipeMap,
    adv_pipes: PipeBitmap,
}

impl<P: AciPhysical, const N: usize> Aci<P, N> {
    /// Wrap a transport; `pipes` describes the pipes of the loaded setup
    pub fn new(transport: Transport<P, N>, pipes: PipeMap) -> Self {
        Self {
            transport,
            session: Session::new(),
            pipes,
            adv_pipes: [0; PIPE_BITMAP_LEN],
        }
    }

    /// Reset local state and the link, then run the board start-up sequence
    pub fn init<T: TimeProvider>(&mut self, time: &mut T, board: Board) -> SessionResult<()> {
        self.session = Session::new();
        self.adv_pipes = [0; PIPE_BITMAP_LEN];
        self.transport.init(time)?;
        self.board_init(time, board, RoundBudget::default())
    }

    /// Board-specific start-up
    ///
    /// The RedBearLab v1.1 shield does not report `DeviceStarted` after a pin
    /// reset. A radio reset is issued instead and the mode implied by its
    /// response is queued as a synthetic `DeviceStarted`. Other events seen
    /// while waiting are discarded.
    ///
    /// The link is held for the whole wait, so in event-driven mode this runs
    /// the transfer cycle itself. When the ready-line handler must keep
    /// servicing the link, use [`board_init_start`](Self::board_init_start)
    /// and [`board_init_step`](Self::board_init_step) instead.
    pub fn board_init<T, D>(&mut self, time: &mut T, board: Board, mut deadline: D) -> SessionResult<()>
    where
        T: TimeProvider,
        D: SetupDeadline,
    {
        if !self.board_init_start(time, board)? {
            return Ok(());
        }
        deadline.restart();

        loop {
            if self.transport.mode() == Mode::EventDriven {
                self.transport.on_ready()?;
            }
            match self.board_init_step()? {
                BoardInitStep::Started => return Ok(()),
                BoardInitStep::Waiting if deadline.expired() => {
                    return Err(SessionError::BoardInitTimeout)
                }
                BoardInitStep::Waiting | BoardInitStep::Discarded => {}
            }
        }
    }

    /// Begin the board start-up without waiting for the peer
    ///
    /// Returns `true` when [`board_init_step`](Self::board_init_step) must be
    /// called until it reports `Started`.
    pub fn board_init_start<T: TimeProvider>(
        &mut self,
        time: &mut T,
        board: Board,
    ) -> SessionResult<bool> {
        if board != Board::RedBearLabV1_1 {
            return Ok(false);
        }
        time.delay_ms(REDBEARLAB_BOOT_MS);
        self.radio_reset()?;
        Ok(true)
    }

    /// Check once for the radio reset response
    ///
    /// Never clocks the bus in event-driven mode; cycles come from the
    /// ready-line handler between calls.
    pub fn board_init_step(&mut self) -> SessionResult<BoardInitStep> {
        match self.event_get()? {
            Some(Event::CommandResponse(response)) => {
                self.report_started(response.status)?;
                Ok(BoardInitStep::Started)
            }
            Some(other) => {
                trace!("board init: discarding {:?}", other.opcode());
                Ok(BoardInitStep::Discarded)
            }
            None => Ok(BoardInitStep::Waiting),
        }
    }

    /// Queue the `DeviceStarted` implied by a radio reset status
    fn report_started(&mut self, status: StatusCode) -> SessionResult<()> {
        let (mode, credit_available) = match status {
            StatusCode::ErrorDeviceStateInvalid => (DeviceMode::Setup, 2),
            StatusCode::Success => (DeviceMode::Standby, 2),
            StatusCode::ErrorCmdUnknown => (DeviceMode::Test, 0),
            other => {
                debug!("board init: radio reset answered {:?}", other);
                return Ok(());
            }
        };
        info!("board init: peer in {:?} mode after radio reset", mode);
        let frame = Event::DeviceStarted {
            mode,
            hw_error: HwError::None,
            credit_available,
        }
        .encode()?;
        if !self.transport.inject_event(&frame) {
            warn!("board init: inbound queue full, DeviceStarted dropped");
            return Err(SessionError::EventQueueFull);
        }
        Ok(())
    }

    /// Pull one event, apply it to the session and return it
    pub fn event_get(&mut self) -> SessionResult<Option<Event>> {
        let Some(frame) = self.transport.event_get()? else {
            return Ok(None);
        };
        let event = Event::decode(&frame)?;
        self.session.on_event(&event);
        Ok(Some(event))
    }

    /// Decode the next event without consuming or applying it
    pub fn event_peek(&mut self) -> SessionResult<Option<Event>> {
        match self.transport.event_peek()? {
            Some(frame) => Ok(Some(Event::decode(&frame)?)),
            None => Ok(None),
        }
    }

    /// Stream a setup blob with the link otherwise idle
    ///
    /// Like [`board_init`](Self::board_init) this holds the link until the
    /// run ends and clocks the bus itself in event-driven mode. Drive a
    /// [`SetupBootstrap`] through [`setup_step`](Self::setup_step) to leave
    /// cycles to the ready-line handler.
    pub fn run_setup<D: SetupDeadline>(
        &mut self,
        messages: &[Frame],
        deadline: D,
    ) -> Result<SetupReport, SetupError> {
        SetupBootstrap::new(messages, deadline).run(&mut DrivenLink(&mut self.transport))
    }

    /// Advance a setup run by one non-blocking step
    pub fn setup_step<D: SetupDeadline>(
        &mut self,
        setup: &mut SetupBootstrap<'_, D>,
    ) -> SetupState {
        setup.step(&mut self.transport)
    }

    /// Session state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Underlying transport
    pub fn transport(&self) -> &Transport<P, N> {
        &self.transport
    }

    /// Underlying transport, for cycle calls from the ready-line handler
    pub fn transport_mut(&mut self) -> &mut Transport<P, N> {
        &mut self.transport
    }

    /// Pipe type map in use
    pub fn pipe_map(&self) -> &PipeMap {
        &self.pipes
    }

    /// Pipes currently selected for advertising
    pub fn adv_pipes(&self) -> &PipeBitmap {
        &self.adv_pipes
    }

    /// Discard everything queued in both directions
    pub fn flush(&self) {
        self.transport.flush();
    }

    /// True when no command is waiting
    pub fn command_queue_empty(&self) -> bool {
        self.transport.command_queue_empty()
    }

    /// True when no more commands fit
    pub fn command_queue_full(&self) -> bool {
        self.transport.command_queue_full()
    }

    /// True when no event is waiting
    pub fn event_queue_empty(&self) -> bool {
        self.transport.event_queue_empty()
    }

    /// True when no more events fit
    pub fn event_queue_full(&self) -> bool {
        self.transport.event_queue_full()
    }

    // Device and radio control

    /// Enter or leave test mode
    pub fn test_mode(&mut self, mode: TestMode) -> SessionResult<bool> {
        self.submit(Command::Test(mode))
    }

    /// Put the peer to sleep
    pub fn sleep(&mut self) -> SessionResult<bool> {
        self.submit(Command::Sleep)
    }

    /// Wake the peer
    pub fn wakeup(&mut self) -> SessionResult<bool> {
        self.submit(Command::Wakeup)
    }

    /// Reset the radio
    pub fn radio_reset(&mut self) -> SessionResult<bool> {
        self.submit(Command::RadioReset)
    }

    /// Request firmware and setup identification
    pub fn device_version(&mut self) -> SessionResult<bool> {
        self.submit(Command::GetDeviceVersion)
    }

    /// Request the own device address
    pub fn get_address(&mut self) -> SessionResult<bool> {
        self.submit(Command::GetDeviceAddress)
    }

    /// Request the die temperature
    pub fn get_temperature(&mut self) -> SessionResult<bool> {
        self.submit(Command::GetTemperature)
    }

    /// Request the supply voltage
    pub fn get_battery_level(&mut self) -> SessionResult<bool> {
        self.submit(Command::GetBatteryLevel)
    }

    /// Change radio output power
    pub fn set_tx_power(&mut self, power: TxPower) -> SessionResult<bool> {
        self.submit(Command::SetTxPower(power))
    }

    // Advertising and connections

    /// Advertise as connectable
    pub fn connect(&mut self, timeout: u16, adv_interval: u16) -> SessionResult<bool> {
        self.submit(Command::Connect {
            timeout,
            adv_interval,
        })
    }

    /// Advertise for bonding
    pub fn bond(&mut self, timeout: u16, adv_interval: u16) -> SessionResult<bool> {
        self.submit(Command::Bond {
            timeout,
            adv_interval,
        })
    }

    /// Directed advertising to the bonded central
    pub fn direct_connect(&mut self) -> SessionResult<bool> {
        self.submit(Command::ConnectDirect)
    }

    /// Ask the central to encrypt the link
    pub fn bond_request(&mut self) -> SessionResult<bool> {
        self.submit(Command::BondSecurityRequest)
    }

    /// Advertise as non-connectable
    pub fn broadcast(&mut self, timeout: u16, adv_interval: u16) -> SessionResult<bool> {
        if timeout > BROADCAST_TIMEOUT_MAX {
            return Err(SessionError::OutOfRange {
                field: "broadcast timeout",
                value: timeout as u32,
            });
        }
        if !BROADCAST_INTERVAL_RANGE.contains(&adv_interval) {
            return Err(SessionError::OutOfRange {
                field: "advertising interval",
                value: adv_interval as u32,
            });
        }
        self.submit(Command::Broadcast {
            timeout,
            adv_interval,
        })
    }

    /// Add one pipe to the advertised set and send the whole set
    pub fn open_adv_pipe(&mut self, pipe: u8) -> SessionResult<bool> {
        if pipe > PIPE_NUMBER_MAX {
            return Err(SessionError::InvalidPipe(pipe));
        }
        bitmap_set(&mut self.adv_pipes, pipe);
        self.submit(Command::OpenAdvPipe(self.adv_pipes))
    }

    /// Replace the advertised set
    pub fn open_adv_pipes(&mut self, pipes: &PipeBitmap) -> SessionResult<bool> {
        self.adv_pipes = *pipes;
        self.submit(Command::OpenAdvPipe(self.adv_pipes))
    }

    /// Drop the connection
    ///
    /// Once queued, the pipe bitmaps are cleared so nothing else is sent on
    /// a link that is going away.
    pub fn disconnect(&mut self, reason: DisconnectReason) -> SessionResult<bool> {
        let queued = self.submit(Command::Disconnect(reason))?;
        if queued {
            self.session.clear_pipes();
        }
        Ok(queued)
    }

    /// Request new connection parameters
    pub fn change_timing(&mut self, params: ConnectionParams) -> SessionResult<bool> {
        self.submit(Command::ChangeTiming(TimingRequest::Explicit(params)))
    }

    /// Request the GAP preferred connection parameters from the setup
    pub fn change_timing_gap_ppcp(&mut self) -> SessionResult<bool> {
        self.submit(Command::ChangeTiming(TimingRequest::GapPpcp))
    }

    /// Set application latency
    pub fn set_app_latency(&mut self, mode: AppLatencyMode, latency: u16) -> SessionResult<bool> {
        self.submit(Command::SetApplicationLatency { mode, latency })
    }

    // Data transfer

    /// Send data on a TX or TX_ACK pipe; costs one credit
    pub fn send_data(&mut self, pipe: u8, data: &[u8]) -> SessionResult<bool> {
        let info = self.pipes.get(pipe)?;
        if info.pipe_type != PipeType::TX && info.pipe_type != PipeType::TX_ACK {
            return Err(SessionError::PipeTypeMismatch {
                pipe,
                operation: "send data",
            });
        }
        self.submit_with_credit(Command::SendData { pipe, data })
    }

    /// Ask the central for data on a remote RX_REQ pipe; costs one credit
    pub fn request_data(&mut self, pipe: u8) -> SessionResult<bool> {
        let info = self.pipes.get(pipe)?;
        if info.location != PipeStore::Remote || info.pipe_type != PipeType::RX_REQ {
            return Err(SessionError::PipeTypeMismatch {
                pipe,
                operation: "request data",
            });
        }
        self.submit_with_credit(Command::RequestData(pipe))
    }

    /// Update the value of a local pipe
    pub fn set_local_data(&mut self, pipe: u8, data: &[u8]) -> SessionResult<bool> {
        if self.pipes.get(pipe)?.location != PipeStore::Local {
            return Err(SessionError::PipeTypeMismatch {
                pipe,
                operation: "set local data",
            });
        }
        self.submit(Command::SetLocalData { pipe, data })
    }

    /// Acknowledge data received on a pipe
    pub fn send_ack(&mut self, pipe: u8) -> SessionResult<bool> {
        self.submit(Command::SendDataAck(pipe))
    }

    /// Reject data received on a pipe
    pub fn send_nack(&mut self, pipe: u8, error_code: u8) -> SessionResult<bool> {
        self.submit(Command::SendDataNack { pipe, error_code })
    }

    /// Open a remote RX, RX_ACK or RX_ACK_AUTO pipe
    pub fn open_remote_pipe(&mut self, pipe: u8) -> SessionResult<bool> {
        self.check_remote_rx(pipe, "open remote pipe")?;
        let queued = self.submit(Command::OpenRemotePipe(pipe))?;
        if queued {
            self.session.set_pending_remote_pipe(RemotePipeRequest::Open(pipe));
        }
        Ok(queued)
    }

    /// Close a remote RX, RX_ACK or RX_ACK_AUTO pipe
    pub fn close_remote_pipe(&mut self, pipe: u8) -> SessionResult<bool> {
        self.check_remote_rx(pipe, "close remote pipe")?;
        let queued = self.submit(Command::CloseRemotePipe(pipe))?;
        if queued {
            self.session.set_pending_remote_pipe(RemotePipeRequest::Close(pipe));
        }
        Ok(queued)
    }

    // Other

    /// Answer a key request
    pub fn set_key(&mut self, key: KeyMaterial) -> SessionResult<bool> {
        self.submit(Command::SetKey(key))
    }

    /// Echo `data` back (test mode)
    pub fn echo_msg(&mut self, data: &[u8]) -> SessionResult<bool> {
        self.submit(Command::Echo(data))
    }

    /// Read the next dynamic data block
    pub fn read_dynamic_data(&mut self) -> SessionResult<bool> {
        self.submit(Command::ReadDynamicData)
    }

    /// Write one dynamic data block
    pub fn write_dynamic_data(&mut self, sequence: u8, data: &[u8]) -> SessionResult<bool> {
        self.submit(Command::WriteDynamicData { sequence, data })
    }

    /// Direct test mode command word
    pub fn dtm_command(&mut self, msb: u8, lsb: u8) -> SessionResult<bool> {
        self.submit(Command::DtmCommand { msb, lsb })
    }

    fn check_remote_rx(&self, pipe: u8, operation: &'static str) -> SessionResult<()> {
        let info = self.pipes.get(pipe)?;
        let rx = [PipeType::RX, PipeType::RX_ACK, PipeType::RX_ACK_AUTO];
        if info.location != PipeStore::Remote || !rx.contains(&info.pipe_type) {
            return Err(SessionError::PipeTypeMismatch { pipe, operation });
        }
        Ok(())
    }

    fn submit_with_credit(&mut self, command: Command<'_>) -> SessionResult<bool> {
        let frame = command.encode()?;
        if self.session.send_would_exceed_credit() {
            return Err(SessionError::CreditExhausted);
        }
        let queued = self.transport.send(&frame)?;
        if queued {
            self.session.consume_credit()?;
        }
        Ok(queued)
    }

    fn submit(&mut self, command: Command<'_>) -> SessionResult<bool> {
        let frame = command.encode()?;
        let queued = self.transport.send(&frame)?;
        if !queued {
            debug!("{} held back, command queue full", command.opcode());
        }
        Ok(queued)
    }
}
