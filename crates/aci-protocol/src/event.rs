// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Peer-to-host events.
//!
//! Decoding dispatches on the event opcode. A `CommandResponse` is
//! dispatched a second time on the opcode of the command it answers, since
//! the response payload layout depends on that command and not on the frame
//! length.

use aci_transport::Frame;
use heapless::Vec;

use crate::error::CodecResult;
use crate::opcode::{CommandOpcode, EventOpcode};
use crate::types::{
    BdAddr, BdAddrType, BondStatusCode, BondStatusSource, ClockAccuracy, DeviceMode, HwError,
    KeyType, PipeBitmap, StatusCode, BD_ADDR_LEN, ECHO_DATA_MAX_LEN, PASSKEY_LEN,
    PIPE_RX_DATA_MAX_LEN,
};
use crate::wire::{split, Reader, Writer};

/// Parameter bytes a frame can carry after its opcode
pub const EVENT_PARAMS_MAX_LEN: usize = 30;

/// Source file name bytes in a hardware error report
pub const HW_ERROR_FILE_MAX_LEN: usize = 28;

/// Data bytes after the pipe and error code of a pipe error
pub const PIPE_ERROR_DATA_MAX_LEN: usize = 28;

/// Data bytes after the sequence number of a dynamic data response
pub const DYNAMIC_DATA_RSP_MAX_LEN: usize = 27;

/// Connection parameters in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionTiming {
    /// Connection interval in 1.25 ms units
    pub interval: u16,
    /// Connection events the peripheral may skip
    pub slave_latency: u16,
    /// Supervision timeout in 10 ms units
    pub supervision_timeout: u16,
}

impl ConnectionTiming {
    /// Connection interval in milliseconds, `interval * 125 / 100` in integer math
    pub fn interval_ms(&self) -> u32 {
        self.interval as u32 * 125 / 100
    }

    /// Supervision timeout in milliseconds
    pub fn supervision_timeout_ms(&self) -> u32 {
        self.supervision_timeout as u32 * 10
    }
}

/// `GetDeviceVersion` response data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceVersion {
    /// Firmware configuration
    pub configuration_id: u16,
    /// ACI revision
    pub aci_version: u8,
    /// Setup blob format
    pub setup_format: u8,
    /// Identifier of the loaded setup
    pub setup_id: u32,
    /// Setup status (non-zero when the setup is locked)
    pub setup_status: u8,
}

/// Typed payload of a command response, chosen by the answered command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseData {
    /// Nothing beyond the status, or not enough bytes for the typed form
    None,
    /// `GetDeviceVersion`
    DeviceVersion(DeviceVersion),
    /// `GetDeviceAddress`
    DeviceAddress {
        /// Own address
        address: BdAddr,
        /// Own address type
        address_type: BdAddrType,
    },
    /// `GetBatteryLevel`, in 3.52 mV units
    BatteryLevel(u16),
    /// `GetTemperature`, in 0.25 degC units
    Temperature(i16),
    /// `ReadDynamicData`
    DynamicData {
        /// Block sequence number
        sequence: u8,
        /// Block contents
        data: Vec<u8, DYNAMIC_DATA_RSP_MAX_LEN>,
    },
    /// `DtmCommand` response word
    Dtm {
        /// High byte
        msb: u8,
        /// Low byte
        lsb: u8,
    },
}

/// Generic reply to a command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandResponse {
    /// Command being answered
    pub command: CommandOpcode,
    /// Outcome
    pub status: StatusCode,
    /// Command-specific data
    pub data: ResponseData,
}

/// `BondStatus` parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BondStatus {
    /// Outcome
    pub status_code: BondStatusCode,
    /// Side that ended the procedure
    pub source: BondStatusSource,
    /// Security mode 1 levels reached
    pub secmode1_bitmap: u8,
    /// Security mode 2 levels reached
    pub secmode2_bitmap: u8,
    /// Keys distributed by the peripheral
    pub keys_exchanged_slave: u8,
    /// Keys distributed by the central
    pub keys_exchanged_master: u8,
}

/// One ACI event
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Peer finished reset
    DeviceStarted {
        /// Mode the peer started in
        mode: DeviceMode,
        /// Whether a fatal error caused the restart
        hw_error: HwError,
        /// Data credits this firmware grants
        credit_available: u8,
    },
    /// Echo reply
    Echo(Vec<u8, ECHO_DATA_MAX_LEN>),
    /// Fatal error report
    HwError {
        /// Source line
        line: u16,
        /// Source file name bytes
        file: Vec<u8, HW_ERROR_FILE_MAX_LEN>,
    },
    /// Reply to a command
    CommandResponse(CommandResponse),
    /// Link up
    Connected {
        /// Central address type
        address_type: BdAddrType,
        /// Central address
        address: BdAddr,
        /// Initial connection parameters
        timing: ConnectionTiming,
        /// Central clock accuracy
        clock_accuracy: ClockAccuracy,
    },
    /// Link down
    Disconnected {
        /// ACI-level reason
        aci_status: StatusCode,
        /// Bluetooth controller reason
        btle_status: u8,
    },
    /// Bonding outcome
    BondStatus(BondStatus),
    /// Full open and closed pipe bitmaps
    PipeStatus {
        /// Pipes open for traffic
        open: PipeBitmap,
        /// Pipes that need an explicit open
        closed: PipeBitmap,
    },
    /// Connection parameters changed
    Timing(ConnectionTiming),
    /// Credits returned by the peer
    DataCredit(u8),
    /// Peer acknowledged data on a pipe
    DataAck(u8),
    /// Data arrived on a pipe
    DataReceived {
        /// Pipe number
        pipe: u8,
        /// Data
        data: Vec<u8, PIPE_RX_DATA_MAX_LEN>,
    },
    /// Pipe operation failed
    PipeError {
        /// Pipe number
        pipe: u8,
        /// Error code
        error_code: u8,
        /// Error-specific bytes
        data: Vec<u8, PIPE_ERROR_DATA_MAX_LEN>,
    },
    /// Passkey to show the user
    DisplayPasskey([u8; PASSKEY_LEN]),
    /// Peer asks for a key
    KeyRequest(KeyType),
    /// Opcode outside the known event set, or a response to an unknown command
    Unknown {
        /// Event opcode byte
        opcode: u8,
        /// Bytes after the opcode
        params: Vec<u8, EVENT_PARAMS_MAX_LEN>,
    },
}

impl Event {
    /// Opcode byte this event travels under
    pub fn raw_opcode(&self) -> u8 {
        match self {
            Event::Unknown { opcode, .. } => *opcode,
            other => other.opcode().map(u8::from).unwrap_or(0),
        }
    }

    /// Known opcode, `None` for [`Event::Unknown`]
    pub fn opcode(&self) -> Option<EventOpcode> {
        let op = match self {
            Event::DeviceStarted { .. } => EventOpcode::DeviceStarted,
            Event::Echo(_) => EventOpcode::Echo,
            Event::HwError { .. } => EventOpcode::HwError,
            Event::CommandResponse(_) => EventOpcode::CommandResponse,
            Event::Connected { .. } => EventOpcode::Connected,
            Event::Disconnected { .. } => EventOpcode::Disconnected,
            Event::BondStatus(_) => EventOpcode::BondStatus,
            Event::PipeStatus { .. } => EventOpcode::PipeStatus,
            Event::Timing(_) => EventOpcode::Timing,
            Event::DataCredit(_) => EventOpcode::DataCredit,
            Event::DataAck(_) => EventOpcode::DataAck,
            Event::DataReceived { .. } => EventOpcode::DataReceived,
            Event::PipeError { .. } => EventOpcode::PipeError,
            Event::DisplayPasskey(_) => EventOpcode::DisplayPasskey,
            Event::KeyRequest(_) => EventOpcode::KeyRequest,
            Event::Unknown { .. } => return None,
        };
        Some(op)
    }

    /// Command response carried by this event, if any
    pub fn as_command_response(&self) -> Option<&CommandResponse> {
        match self {
            Event::CommandResponse(rsp) => Some(rsp),
            _ => None,
        }
    }

    /// Parse an inbound frame
    ///
    /// An unrecognised opcode yields `Ok(Event::Unknown { .. })`; only empty,
    /// short or out-of-range frames are errors.
    pub fn decode(frame: &Frame) -> CodecResult<Event> {
        let (raw, params) = split(frame)?;
        let Ok(opcode) = EventOpcode::try_from(raw) else {
            return Event::unknown(raw, params);
        };
        let mut r = Reader::new(raw, params);
        let event = match opcode {
            EventOpcode::DeviceStarted => Event::DeviceStarted {
                mode: DeviceMode::try_from(r.u8()?)?,
                hw_error: HwError::try_from(r.u8()?)?,
                credit_available: r.u8()?,
            },
            EventOpcode::Echo => Event::Echo(r.rest_vec("echo data")?),
            EventOpcode::HwError => Event::HwError {
                line: r.u16_le()?,
                file: r.rest_vec("hardware error file")?,
            },
            EventOpcode::CommandResponse => {
                let command = r.u8()?;
                let status = StatusCode::from(r.u8()?);
                let Ok(command) = CommandOpcode::try_from(command) else {
                    return Event::unknown(raw, params);
                };
                Event::CommandResponse(CommandResponse {
                    command,
                    status,
                    data: decode_response_data(command, &mut r)?,
                })
            }
            EventOpcode::Connected => Event::Connected {
                address_type: BdAddrType::try_from(r.u8()?)?,
                address: r.array::<BD_ADDR_LEN>()?,
                timing: ConnectionTiming {
                    interval: r.u16_le()?,
                    slave_latency: r.u16_le()?,
                    supervision_timeout: r.u16_le()?,
                },
                clock_accuracy: ClockAccuracy::try_from(r.u8()?)?,
            },
            EventOpcode::Disconnected => Event::Disconnected {
                aci_status: StatusCode::from(r.u8()?),
                btle_status: r.u8()?,
            },
            EventOpcode::BondStatus => Event::BondStatus(BondStatus {
                status_code: BondStatusCode::try_from(r.u8()?)?,
                source: BondStatusSource::try_from(r.u8()?)?,
                secmode1_bitmap: r.u8()?,
                secmode2_bitmap: r.u8()?,
                keys_exchanged_slave: r.u8()?,
                keys_exchanged_master: r.u8()?,
            }),
            EventOpcode::PipeStatus => Event::PipeStatus {
                open: r.array()?,
                closed: r.array()?,
            },
            EventOpcode::Timing => Event::Timing(ConnectionTiming {
                interval: r.u16_le()?,
                slave_latency: r.u16_le()?,
                supervision_timeout: r.u16_le()?,
            }),
            EventOpcode::DataCredit => Event::DataCredit(r.u8()?),
            EventOpcode::DataAck => Event::DataAck(r.u8()?),
            EventOpcode::DataReceived => Event::DataReceived {
                pipe: r.u8()?,
                data: r.rest_vec("pipe data")?,
            },
            EventOpcode::PipeError => Event::PipeError {
                pipe: r.u8()?,
                error_code: r.u8()?,
                data: r.rest_vec("pipe error data")?,
            },
            EventOpcode::DisplayPasskey => Event::DisplayPasskey(r.array()?),
            EventOpcode::KeyRequest => Event::KeyRequest(KeyType::try_from(r.u8()?)?),
        };
        Ok(event)
    }

    /// Build the frame a peer would send for this event
    ///
    /// Used by simulators and tests to script peer traffic.
    pub fn encode(&self) -> CodecResult<Frame> {
        let w = Writer::new(self.raw_opcode());
        let w = match self {
            Event::DeviceStarted {
                mode,
                hw_error,
                credit_available,
            } => w.u8((*mode).into())?.u8((*hw_error).into())?.u8(*credit_available)?,
            Event::Echo(data) => w.bytes(data)?,
            Event::HwError { line, file } => w.u16_le(*line)?.bytes(file)?,
            Event::CommandResponse(rsp) => {
                let w = w.u8(rsp.command.into())?.u8(rsp.status.into())?;
                encode_response_data(&rsp.data, w)?
            }
            Event::Connected {
                address_type,
                address,
                timing,
                clock_accuracy,
            } => w
                .u8((*address_type).into())?
                .bytes(address)?
                .u16_le(timing.interval)?
                .u16_le(timing.slave_latency)?
                .u16_le(timing.supervision_timeout)?
                .u8((*clock_accuracy).into())?,
            Event::Disconnected {
                aci_status,
                btle_status,
            } => w.u8((*aci_status).into())?.u8(*btle_status)?,
            Event::BondStatus(b) => w
                .u8(b.status_code.into())?
                .u8(b.source.into())?
                .u8(b.secmode1_bitmap)?
                .u8(b.secmode2_bitmap)?
                .u8(b.keys_exchanged_slave)?
                .u8(b.keys_exchanged_master)?,
            Event::PipeStatus { open, closed } => w.bytes(open)?.bytes(closed)?,
            Event::Timing(t) => w
                .u16_le(t.interval)?
                .u16_le(t.slave_latency)?
                .u16_le(t.supervision_timeout)?,
            Event::DataCredit(credit) => w.u8(*credit)?,
            Event::DataAck(pipe) => w.u8(*pipe)?,
            Event::DataReceived { pipe, data } => w.u8(*pipe)?.bytes(data)?,
            Event::PipeError {
                pipe,
                error_code,
                data,
            } => w.u8(*pipe)?.u8(*error_code)?.bytes(data)?,
            Event::DisplayPasskey(digits) => w.bytes(digits)?,
            Event::KeyRequest(key_type) => w.u8((*key_type).into())?,
            Event::Unknown { params, .. } => w.bytes(params)?,
        };
        w.finish()
    }

    fn unknown(opcode: u8, params: &[u8]) -> CodecResult<Event> {
        let mut r = Reader::new(opcode, params);
        Ok(Event::Unknown {
            opcode,
            params: r.rest_vec("event parameters")?,
        })
    }
}

fn decode_response_data(command: CommandOpcode, r: &mut Reader<'_>) -> CodecResult<ResponseData> {
    // Error responses carry no data; fall back to `None` instead of failing
    let typed_len = match command {
        CommandOpcode::GetDeviceVersion => 9,
        CommandOpcode::GetDeviceAddress => BD_ADDR_LEN + 1,
        CommandOpcode::GetBatteryLevel | CommandOpcode::GetTemperature => 2,
        CommandOpcode::ReadDynamicData => 1,
        CommandOpcode::DtmCommand => 2,
        _ => return Ok(ResponseData::None),
    };
    if r.remaining() < typed_len {
        return Ok(ResponseData::None);
    }
    let data = match command {
        CommandOpcode::GetDeviceVersion => ResponseData::DeviceVersion(DeviceVersion {
            configuration_id: r.u16_le()?,
            aci_version: r.u8()?,
            setup_format: r.u8()?,
            setup_id: r.u32_le()?,
            setup_status: r.u8()?,
        }),
        CommandOpcode::GetDeviceAddress => ResponseData::DeviceAddress {
            address: r.array()?,
            address_type: BdAddrType::try_from(r.u8()?)?,
        },
        CommandOpcode::GetBatteryLevel => ResponseData::BatteryLevel(r.u16_le()?),
        CommandOpcode::GetTemperature => ResponseData::Temperature(r.i16_le()?),
        CommandOpcode::ReadDynamicData => ResponseData::DynamicData {
            sequence: r.u8()?,
            data: r.rest_vec("dynamic data")?,
        },
        CommandOpcode::DtmCommand => ResponseData::Dtm {
            msb: r.u8()?,
            lsb: r.u8()?,
        },
        _ => ResponseData::None,
    };
    Ok(data)
}

fn encode_response_data(data: &ResponseData, w: Writer) -> CodecResult<Writer> {
    match data {
        ResponseData::None => Ok(w),
        ResponseData::DeviceVersion(v) => w
            .u16_le(v.configuration_id)?
            .u8(v.aci_version)?
            .u8(v.setup_format)?
            .u32_le(v.setup_id)?
            .u8(v.setup_status),
        ResponseData::DeviceAddress {
            address,
            address_type,
        } => w.bytes(address)?.u8((*address_type).into()),
        ResponseData::BatteryLevel(level) => w.u16_le(*level),
        ResponseData::Temperature(t) => w.bytes(&t.to_le_bytes()),
        ResponseData::DynamicData { sequence, data } => w.u8(*sequence)?.bytes(data),
        ResponseData::Dtm { msb, lsb } => w.u8(*msb)?.u8(*lsb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    fn frame(bytes: &[u8]) -> Frame {
        Frame::from_payload(bytes).unwrap()
    }

    #[test]
    fn test_device_started() {
        let event = Event::decode(&frame(&[0x81, 0x02, 0x00, 0x02])).unwrap();
        assert_eq!(
            event,
            Event::DeviceStarted {
                mode: DeviceMode::Setup,
                hw_error: HwError::None,
                credit_available: 2
            }
        );
    }

    #[test]
    fn test_unknown_opcode_is_not_an_error() {
        let event = Event::decode(&frame(&[0x70, 0xAA, 0xBB])).unwrap();
        match event {
            Event::Unknown { opcode, params } => {
                assert_eq!(opcode, 0x70);
                assert_eq!(params.as_slice(), &[0xAA, 0xBB]);
            }
            other => panic!("expected Unknown, got {:?}", other),
        }
        assert_eq!(Event::decode(&frame(&[0x80])).unwrap().opcode(), None);
    }

    #[test]
    fn test_empty_frame_is_truncated() {
        assert_eq!(
            Event::decode(&Frame::EMPTY),
            Err(CodecError::Truncated {
                opcode: 0,
                needed: 1,
                available: 0
            })
        );
        assert!(matches!(
            Event::decode(&frame(&[0x85, 0x01, 0x02])),
            Err(CodecError::Truncated { opcode: 0x85, .. })
        ));
    }

    #[test]
    fn test_command_response_dispatches_on_command() {
        let temp = Event::decode(&frame(&[0x84, 0x0C, 0x00, 0x5C, 0x00])).unwrap();
        let rsp = temp.as_command_response().unwrap();
        assert_eq!(rsp.command, CommandOpcode::GetTemperature);
        assert_eq!(rsp.status, StatusCode::Success);
        assert_eq!(rsp.data, ResponseData::Temperature(92));

        // Same bytes, different command: battery level is unsigned
        let batt = Event::decode(&frame(&[0x84, 0x0B, 0x00, 0xFF, 0xFF])).unwrap();
        assert_eq!(
            batt.as_command_response().unwrap().data,
            ResponseData::BatteryLevel(0xFFFF)
        );
    }

    #[test]
    fn test_setup_status_responses() {
        let cont = Event::decode(&frame(&[0x84, 0x06, 0x01])).unwrap();
        let rsp = cont.as_command_response().unwrap();
        assert_eq!(rsp.status, StatusCode::TransactionContinue);
        assert_eq!(rsp.data, ResponseData::None);
    }

    #[test]
    fn test_error_response_without_data() {
        let event = Event::decode(&frame(&[0x84, 0x09, 0x83])).unwrap();
        let rsp = event.as_command_response().unwrap();
        assert_eq!(rsp.status, StatusCode::ErrorDeviceStateInvalid);
        assert_eq!(rsp.data, ResponseData::None);
    }

    #[test]
    fn test_device_version_layout() {
        let bytes = [0x84, 0x09, 0x00, 0x34, 0x12, 0x02, 0x03, 0x78, 0x56, 0x34, 0x12, 0x01];
        let event = Event::decode(&frame(&bytes)).unwrap();
        assert_eq!(
            event.as_command_response().unwrap().data,
            ResponseData::DeviceVersion(DeviceVersion {
                configuration_id: 0x1234,
                aci_version: 2,
                setup_format: 3,
                setup_id: 0x1234_5678,
                setup_status: 1
            })
        );
    }

    #[test]
    fn test_dynamic_data_takes_bytes_after_sequence() {
        let event = Event::decode(&frame(&[0x84, 0x07, 0x01, 0x05, 0xA0, 0xA1, 0xA2])).unwrap();
        match &event.as_command_response().unwrap().data {
            ResponseData::DynamicData { sequence, data } => {
                assert_eq!(*sequence, 5);
                assert_eq!(data.as_slice(), &[0xA0, 0xA1, 0xA2]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dtm_response_is_msb_first() {
        let event = Event::decode(&frame(&[0x84, 0x03, 0x00, 0x80, 0x01])).unwrap();
        assert_eq!(
            event.as_command_response().unwrap().data,
            ResponseData::Dtm { msb: 0x80, lsb: 0x01 }
        );
    }

    #[test]
    fn test_response_to_unknown_command() {
        let event = Event::decode(&frame(&[0x84, 0x42, 0x82])).unwrap();
        assert_eq!(event.raw_opcode(), 0x84);
        assert_eq!(event.opcode(), None);
    }

    #[test]
    fn test_connected_and_timing() {
        let bytes = [
            0x85, 0x01, 1, 2, 3, 4, 5, 6, 0x50, 0x00, 0x00, 0x00, 0xC8, 0x00, 0x07,
        ];
        let event = Event::decode(&frame(&bytes)).unwrap();
        let Event::Connected { timing, clock_accuracy, address, .. } = event else {
            panic!("expected Connected");
        };
        assert_eq!(address, [1, 2, 3, 4, 5, 6]);
        assert_eq!(timing.interval, 80);
        assert_eq!(timing.interval_ms(), 100);
        assert_eq!(timing.supervision_timeout_ms(), 2000);
        assert_eq!(clock_accuracy, ClockAccuracy::Ppm20);
    }

    #[test]
    fn test_data_received_limit() {
        let mut bytes = [0u8; 25];
        bytes[0] = 0x8C;
        bytes[1] = 3;
        assert!(matches!(
            Event::decode(&frame(&bytes)),
            Err(CodecError::PayloadTooLong { max_length: 22, .. })
        ));
        let event = Event::decode(&frame(&bytes[..24])).unwrap();
        let Event::DataReceived { pipe, data } = event else {
            panic!("expected DataReceived");
        };
        assert_eq!(pipe, 3);
        assert_eq!(data.len(), 22);
    }

    #[test]
    fn test_encode_reproduces_peer_frames() {
        let samples: [&[u8]; 8] = [
            &[0x81, 0x03, 0x00, 0x02],
            &[0x82, b'h', b'i'],
            &[0x84, 0x0A, 0x00, 1, 2, 3, 4, 5, 6, 0x01],
            &[0x86, 0x93, 0x13],
            &[0x87, 0x00, 0x02, 0x01, 0x00, 0x03, 0x03],
            &[0x88, 1, 0, 0, 0, 0, 0, 0, 0, 0xFE, 0, 0, 0, 0, 0, 0, 0],
            &[0x8D, 4, 0x90, 0xEE],
            &[0x8F, 0x01],
        ];
        for bytes in samples {
            let event = Event::decode(&frame(bytes)).unwrap();
            assert_eq!(event.encode().unwrap().payload(), bytes);
        }
    }

    #[test]
    fn test_echo_round_trip_through_command() {
        let sent = crate::command::Command::Echo(b"abc").encode().unwrap();
        // The peer answers with the echo event opcode and the same bytes
        let mut echoed = [0u8; 4];
        echoed.copy_from_slice(sent.payload());
        echoed[0] = 0x82;
        let event = Event::decode(&frame(&echoed)).unwrap();
        assert_eq!(event, Event::Echo(Vec::from_slice(b"abc").unwrap()));
    }
}
