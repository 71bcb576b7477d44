// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Host-to-peer commands.
//!
//! Each variant encodes to `[opcode, fixed fields..., variable bytes...]`.
//! Multi-byte integers are little-endian; the DTM command is the exception
//! and carries its two bytes MSB first.

use aci_transport::Frame;

use crate::error::{CodecError, CodecResult};
use crate::opcode::CommandOpcode;
use crate::types::{
    AppLatencyMode, DisconnectReason, KeyType, PipeBitmap, TestMode, TxPower, DYNAMIC_DATA_MAX_LEN,
    ECHO_DATA_MAX_LEN, OOB_KEY_LEN, PASSKEY_LEN, PIPE_BITMAP_LEN, PIPE_TX_DATA_MAX_LEN,
    SETUP_DATA_MAX_LEN,
};
use crate::wire::{check_len, split, Reader, Writer};

/// Connection parameters requested through `ChangeTiming`
///
/// Intervals are in 1.25 ms units, the timeout in 10 ms units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionParams {
    /// Minimum connection interval
    pub min_interval: u16,
    /// Maximum connection interval
    pub max_interval: u16,
    /// Connection events the peripheral may skip
    pub slave_latency: u16,
    /// Supervision timeout
    pub timeout_multiplier: u16,
}

/// `ChangeTiming` argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingRequest {
    /// Use the GAP peripheral preferred parameters from the setup blob
    GapPpcp,
    /// Request these parameters
    Explicit(ConnectionParams),
}

/// `SetKey` argument; the variant selects the frame length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyMaterial {
    /// Decline the key request
    Reject,
    /// Six ASCII digits
    Passkey([u8; PASSKEY_LEN]),
    /// 16-byte out-of-band key
    Oob([u8; OOB_KEY_LEN]),
}

impl KeyMaterial {
    /// Key type byte sent ahead of the key
    pub fn key_type(&self) -> KeyType {
        match self {
            KeyMaterial::Reject => KeyType::Invalid,
            KeyMaterial::Passkey(_) => KeyType::Passkey,
            KeyMaterial::Oob(_) => KeyType::Oob,
        }
    }
}

/// One ACI command
///
/// Variable-length arguments borrow from the caller; a command is encoded
/// right away and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    /// Enter or leave test mode
    Test(TestMode),
    /// Ask the peer to echo `data` back (test mode only)
    Echo(&'a [u8]),
    /// Direct test mode command word
    DtmCommand {
        /// High byte
        msb: u8,
        /// Low byte
        lsb: u8,
    },
    /// Enter sleep
    Sleep,
    /// Leave sleep
    Wakeup,
    /// One pre-encoded setup chunk, without its own length and opcode
    Setup(&'a [u8]),
    /// Read the next dynamic data block
    ReadDynamicData,
    /// Write one dynamic data block
    WriteDynamicData {
        /// Block sequence number
        sequence: u8,
        /// Block contents
        data: &'a [u8],
    },
    /// Firmware and setup identification
    GetDeviceVersion,
    /// Own device address
    GetDeviceAddress,
    /// Supply voltage
    GetBatteryLevel,
    /// Die temperature
    GetTemperature,
    /// Update the value of a local (set) pipe
    SetLocalData {
        /// Pipe number
        pipe: u8,
        /// New value
        data: &'a [u8],
    },
    /// Reset the radio
    RadioReset,
    /// Advertise as connectable
    Connect {
        /// Seconds to advertise, 0 for no timeout
        timeout: u16,
        /// Advertising interval in 0.625 ms units
        adv_interval: u16,
    },
    /// Advertise for bonding
    Bond {
        /// Seconds to advertise
        timeout: u16,
        /// Advertising interval in 0.625 ms units
        adv_interval: u16,
    },
    /// Drop the connection
    Disconnect(DisconnectReason),
    /// Change radio output power
    SetTxPower(TxPower),
    /// Ask the central for new connection parameters
    ChangeTiming(TimingRequest),
    /// Open a remote pipe
    OpenRemotePipe(u8),
    /// Send data on a transmit pipe (consumes one credit)
    SendData {
        /// Pipe number
        pipe: u8,
        /// Data, at most 20 bytes
        data: &'a [u8],
    },
    /// Acknowledge data received on a pipe
    SendDataAck(u8),
    /// Ask the central to send data on a pipe (consumes one credit)
    RequestData(u8),
    /// Reject data received on a pipe
    SendDataNack {
        /// Pipe number
        pipe: u8,
        /// Application error code
        error_code: u8,
    },
    /// Application latency
    SetApplicationLatency {
        /// Enable or disable
        mode: AppLatencyMode,
        /// Connection events to skip
        latency: u16,
    },
    /// Answer a key request
    SetKey(KeyMaterial),
    /// Pipes whose data goes into advertising packets
    OpenAdvPipe(PipeBitmap),
    /// Advertise as non-connectable
    Broadcast {
        /// Seconds to advertise, 0 for no timeout
        timeout: u16,
        /// Advertising interval in 0.625 ms units
        adv_interval: u16,
    },
    /// Ask the central to encrypt the link
    BondSecurityRequest,
    /// Directed advertising
    ConnectDirect,
    /// Close a remote pipe
    CloseRemotePipe(u8),
}

impl<'a> Command<'a> {
    /// Opcode of this variant
    pub fn opcode(&self) -> CommandOpcode {
        match self {
            Command::Test(_) => CommandOpcode::Test,
            Command::Echo(_) => CommandOpcode::Echo,
            Command::DtmCommand { .. } => CommandOpcode::DtmCommand,
            Command::Sleep => CommandOpcode::Sleep,
            Command::Wakeup => CommandOpcode::Wakeup,
            Command::Setup(_) => CommandOpcode::Setup,
            Command::ReadDynamicData => CommandOpcode::ReadDynamicData,
            Command::WriteDynamicData { .. } => CommandOpcode::WriteDynamicData,
            Command::GetDeviceVersion => CommandOpcode::GetDeviceVersion,
            Command::GetDeviceAddress => CommandOpcode::GetDeviceAddress,
            Command::GetBatteryLevel => CommandOpcode::GetBatteryLevel,
            Command::GetTemperature => CommandOpcode::GetTemperature,
            Command::SetLocalData { .. } => CommandOpcode::SetLocalData,
            Command::RadioReset => CommandOpcode::RadioReset,
            Command::Connect { .. } => CommandOpcode::Connect,
            Command::Bond { .. } => CommandOpcode::Bond,
            Command::Disconnect(_) => CommandOpcode::Disconnect,
            Command::SetTxPower(_) => CommandOpcode::SetTxPower,
            Command::ChangeTiming(_) => CommandOpcode::ChangeTiming,
            Command::OpenRemotePipe(_) => CommandOpcode::OpenRemotePipe,
            Command::SendData { .. } => CommandOpcode::SendData,
            Command::SendDataAck(_) => CommandOpcode::SendDataAck,
            Command::RequestData(_) => CommandOpcode::RequestData,
            Command::SendDataNack { .. } => CommandOpcode::SendDataNack,
            Command::SetApplicationLatency { .. } => CommandOpcode::SetApplicationLatency,
            Command::SetKey(_) => CommandOpcode::SetKey,
            Command::OpenAdvPipe(_) => CommandOpcode::OpenAdvPipe,
            Command::Broadcast { .. } => CommandOpcode::Broadcast,
            Command::BondSecurityRequest => CommandOpcode::BondSecurityRequest,
            Command::ConnectDirect => CommandOpcode::ConnectDirect,
            Command::CloseRemotePipe(_) => CommandOpcode::CloseRemotePipe,
        }
    }

    /// True for the commands the peer charges one data credit for
    pub fn consumes_credit(&self) -> bool {
        matches!(self, Command::SendData { .. } | Command::RequestData(_))
    }

    /// Wire frame for this command
    pub fn encode(&self) -> CodecResult<Frame> {
        let w = Writer::new(self.opcode() as u8);
        let w = match *self {
            Command::Test(mode) => w.u8(mode.into())?,
            Command::Echo(data) => {
                check_len("echo data", data, ECHO_DATA_MAX_LEN)?;
                w.bytes(data)?
            }
            Command::DtmCommand { msb, lsb } => w.u8(msb)?.u8(lsb)?,
            Command::Setup(data) => {
                check_len("setup data", data, SETUP_DATA_MAX_LEN)?;
                w.bytes(data)?
            }
            Command::WriteDynamicData { sequence, data } => {
                check_len("dynamic data", data, DYNAMIC_DATA_MAX_LEN)?;
                w.u8(sequence)?.bytes(data)?
            }
            Command::SetLocalData { pipe, data } => {
                check_len("local data", data, PIPE_TX_DATA_MAX_LEN)?;
                w.u8(pipe)?.bytes(data)?
            }
            Command::SendData { pipe, data } => {
                check_len("pipe data", data, PIPE_TX_DATA_MAX_LEN)?;
                w.u8(pipe)?.bytes(data)?
            }
            Command::Connect {
                timeout,
                adv_interval,
            }
            | Command::Bond {
                timeout,
                adv_interval,
            }
            | Command::Broadcast {
                timeout,
                adv_interval,
            } => w.u16_le(timeout)?.u16_le(adv_interval)?,
            Command::Disconnect(reason) => w.u8(reason.into())?,
            Command::SetTxPower(power) => w.u8(power.into())?,
            Command::ChangeTiming(TimingRequest::GapPpcp) => w,
            Command::ChangeTiming(TimingRequest::Explicit(p)) => w
                .u16_le(p.min_interval)?
                .u16_le(p.max_interval)?
                .u16_le(p.slave_latency)?
                .u16_le(p.timeout_multiplier)?,
            Command::OpenRemotePipe(pipe)
            | Command::CloseRemotePipe(pipe)
            | Command::SendDataAck(pipe)
            | Command::RequestData(pipe) => w.u8(pipe)?,
            Command::SendDataNack { pipe, error_code } => w.u8(pipe)?.u8(error_code)?,
            Command::SetApplicationLatency { mode, latency } => w.u8(mode.into())?.u16_le(latency)?,
            Command::SetKey(key) => {
                let w = w.u8(key.key_type().into())?;
                match key {
                    KeyMaterial::Reject => w,
                    KeyMaterial::Passkey(digits) => w.bytes(&digits)?,
                    KeyMaterial::Oob(oob) => w.bytes(&oob)?,
                }
            }
            Command::OpenAdvPipe(pipes) => w.bytes(&pipes)?,
            Command::Sleep
            | Command::Wakeup
            | Command::ReadDynamicData
            | Command::GetDeviceVersion
            | Command::GetDeviceAddress
            | Command::GetBatteryLevel
            | Command::GetTemperature
            | Command::RadioReset
            | Command::BondSecurityRequest
            | Command::ConnectDirect => w,
        };
        w.finish()
    }

    /// Parse a host frame back into a command
    ///
    /// Used to inspect captured traffic. Variable-length fields borrow from
    /// `frame`.
    pub fn decode(frame: &'a Frame) -> CodecResult<Command<'a>> {
        let (raw, params) = split(frame)?;
        let opcode = CommandOpcode::try_from(raw).map_err(CodecError::UnknownCommand)?;
        let mut r = Reader::new(raw, params);
        let command = match opcode {
            CommandOpcode::Test => Command::Test(TestMode::try_from(r.u8()?)?),
            CommandOpcode::Echo => Command::Echo(r.rest()),
            CommandOpcode::DtmCommand => Command::DtmCommand {
                msb: r.u8()?,
                lsb: r.u8()?,
            },
            CommandOpcode::Sleep => Command::Sleep,
            CommandOpcode::Wakeup => Command::Wakeup,
            CommandOpcode::Setup => Command::Setup(r.rest()),
            CommandOpcode::ReadDynamicData => Command::ReadDynamicData,
            CommandOpcode::WriteDynamicData => Command::WriteDynamicData {
                sequence: r.u8()?,
                data: r.rest(),
            },
            CommandOpcode::GetDeviceVersion => Command::GetDeviceVersion,
            CommandOpcode::GetDeviceAddress => Command::GetDeviceAddress,
            CommandOpcode::GetBatteryLevel => Command::GetBatteryLevel,
            CommandOpcode::GetTemperature => Command::GetTemperature,
            CommandOpcode::SetLocalData => Command::SetLocalData {
                pipe: r.u8()?,
                data: r.rest(),
            },
            CommandOpcode::RadioReset => Command::RadioReset,
            CommandOpcode::Connect => Command::Connect {
                timeout: r.u16_le()?,
                adv_interval: r.u16_le()?,
            },
            CommandOpcode::Bond => Command::Bond {
                timeout: r.u16_le()?,
                adv_interval: r.u16_le()?,
            },
            CommandOpcode::Disconnect => Command::Disconnect(DisconnectReason::try_from(r.u8()?)?),
            CommandOpcode::SetTxPower => Command::SetTxPower(TxPower::try_from(r.u8()?)?),
            CommandOpcode::ChangeTiming => {
                if r.remaining() == 0 {
                    Command::ChangeTiming(TimingRequest::GapPpcp)
                } else {
                    Command::ChangeTiming(TimingRequest::Explicit(ConnectionParams {
                        min_interval: r.u16_le()?,
                        max_interval: r.u16_le()?,
                        slave_latency: r.u16_le()?,
                        timeout_multiplier: r.u16_le()?,
                    }))
                }
            }
            CommandOpcode::OpenRemotePipe => Command::OpenRemotePipe(r.u8()?),
            CommandOpcode::SendData => Command::SendData {
                pipe: r.u8()?,
                data: r.rest(),
            },
            CommandOpcode::SendDataAck => Command::SendDataAck(r.u8()?),
            CommandOpcode::RequestData => Command::RequestData(r.u8()?),
            CommandOpcode::SendDataNack => Command::SendDataNack {
                pipe: r.u8()?,
                error_code: r.u8()?,
            },
            CommandOpcode::SetApplicationLatency => Command::SetApplicationLatency {
                mode: AppLatencyMode::try_from(r.u8()?)?,
                latency: r.u16_le()?,
            },
            CommandOpcode::SetKey => {
                let key = match KeyType::try_from(r.u8()?)? {
                    KeyType::Invalid => KeyMaterial::Reject,
                    KeyType::Passkey => KeyMaterial::Passkey(r.array()?),
                    KeyType::Oob => KeyMaterial::Oob(r.array()?),
                };
                Command::SetKey(key)
            }
            CommandOpcode::OpenAdvPipe => Command::OpenAdvPipe(r.array::<PIPE_BITMAP_LEN>()?),
            CommandOpcode::Broadcast => Command::Broadcast {
                timeout: r.u16_le()?,
                adv_interval: r.u16_le()?,
            },
            CommandOpcode::BondSecurityRequest => Command::BondSecurityRequest,
            CommandOpcode::ConnectDirect => Command::ConnectDirect,
            CommandOpcode::CloseRemotePipe => Command::CloseRemotePipe(r.u8()?),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(command: Command<'_>) -> std::vec::Vec<u8> {
        command.encode().unwrap().as_bytes().to_vec()
    }

    #[test]
    fn test_fixed_lengths() {
        assert_eq!(wire(Command::GetTemperature), [1, 0x0C]);
        assert_eq!(wire(Command::Test(TestMode::DtmUart)), [2, 0x01, 0x01]);
        assert_eq!(wire(Command::SendDataNack { pipe: 4, error_code: 0x80 }), [3, 0x18, 4, 0x80]);
        assert_eq!(wire(Command::CloseRemotePipe(9)), [2, 0x1F, 9]);
    }

    #[test]
    fn test_little_endian_fields() {
        let connect = Command::Connect {
            timeout: 0x001E,
            adv_interval: 0x0640,
        };
        assert_eq!(wire(connect), [5, 0x0F, 0x1E, 0x00, 0x40, 0x06]);

        let latency = Command::SetApplicationLatency {
            mode: AppLatencyMode::Enable,
            latency: 0x0102,
        };
        assert_eq!(wire(latency), [4, 0x19, 0x01, 0x02, 0x01]);
    }

    #[test]
    fn test_dtm_command_is_msb_first() {
        assert_eq!(wire(Command::DtmCommand { msb: 0x12, lsb: 0x34 }), [3, 0x03, 0x12, 0x34]);
    }

    #[test]
    fn test_change_timing_forms() {
        assert_eq!(wire(Command::ChangeTiming(TimingRequest::GapPpcp)), [1, 0x13]);
        let params = ConnectionParams {
            min_interval: 6,
            max_interval: 12,
            slave_latency: 0,
            timeout_multiplier: 400,
        };
        let bytes = wire(Command::ChangeTiming(TimingRequest::Explicit(params)));
        assert_eq!(bytes, [9, 0x13, 6, 0, 12, 0, 0, 0, 0x90, 0x01]);
    }

    #[test]
    fn test_set_key_lengths() {
        assert_eq!(wire(Command::SetKey(KeyMaterial::Reject)).len(), 1 + 2);
        assert_eq!(wire(Command::SetKey(KeyMaterial::Passkey(*b"123456"))).len(), 1 + 8);
        assert_eq!(wire(Command::SetKey(KeyMaterial::Oob([7; 16]))).len(), 1 + 18);
    }

    #[test]
    fn test_payload_limits() {
        let data = [0u8; 21];
        assert_eq!(
            Command::SendData { pipe: 1, data: &data }.encode(),
            Err(CodecError::PayloadTooLong {
                field: "pipe data",
                length: 21,
                max_length: 20
            })
        );
        assert!(Command::SendData { pipe: 1, data: &data[..20] }.encode().is_ok());
        assert!(Command::Echo(&[0; 30]).encode().is_err());
        assert_eq!(Command::Echo(&[0; 29]).encode().unwrap().len(), 30);
        assert!(Command::Setup(&[0; 30]).encode().is_ok());
        assert!(Command::WriteDynamicData { sequence: 1, data: &[0; 30] }.encode().is_err());
    }

    #[test]
    fn test_decode_inverts_encode() {
        let echo_max = [0xA5; ECHO_DATA_MAX_LEN];
        let setup_max = [0x5A; SETUP_DATA_MAX_LEN];
        let dynamic_max = [0x3C; DYNAMIC_DATA_MAX_LEN];
        let pipe_max = [0xC3; PIPE_TX_DATA_MAX_LEN];
        let widest = ConnectionParams {
            min_interval: 0xFFFF,
            max_interval: 0xFFFF,
            slave_latency: 0xFFFF,
            timeout_multiplier: 0xFFFF,
        };
        let samples = [
            Command::Test(TestMode::DtmUart),
            Command::Test(TestMode::Exit),
            Command::Echo(&[]),
            Command::Echo(&echo_max),
            Command::DtmCommand { msb: 0xFF, lsb: 0x00 },
            Command::Sleep,
            Command::Wakeup,
            Command::Setup(&[]),
            Command::Setup(&setup_max),
            Command::ReadDynamicData,
            Command::WriteDynamicData { sequence: 0, data: &[] },
            Command::WriteDynamicData { sequence: 0xFF, data: &dynamic_max },
            Command::GetDeviceVersion,
            Command::GetDeviceAddress,
            Command::GetBatteryLevel,
            Command::GetTemperature,
            Command::SetLocalData { pipe: 1, data: &[] },
            Command::SetLocalData { pipe: 61, data: &pipe_max },
            Command::RadioReset,
            Command::Connect { timeout: 0, adv_interval: 0x0020 },
            Command::Connect { timeout: 0xFFFF, adv_interval: 0xFFFF },
            Command::Bond { timeout: 0xFFFF, adv_interval: 0xFFFF },
            Command::Disconnect(DisconnectReason::Terminate),
            Command::Disconnect(DisconnectReason::BadTiming),
            Command::SetTxPower(TxPower::Minus18Dbm),
            Command::SetTxPower(TxPower::Dbm0),
            Command::ChangeTiming(TimingRequest::GapPpcp),
            Command::ChangeTiming(TimingRequest::Explicit(widest)),
            Command::OpenRemotePipe(61),
            Command::SendData { pipe: 1, data: &[] },
            Command::SendData { pipe: 3, data: &pipe_max },
            Command::SendDataAck(2),
            Command::RequestData(4),
            Command::SendDataNack { pipe: 5, error_code: 0xFF },
            Command::SetApplicationLatency { mode: AppLatencyMode::Disable, latency: 0 },
            Command::SetApplicationLatency { mode: AppLatencyMode::Enable, latency: 0xFFFF },
            Command::SetKey(KeyMaterial::Reject),
            Command::SetKey(KeyMaterial::Passkey(*b"999999")),
            Command::SetKey(KeyMaterial::Oob([0xFF; OOB_KEY_LEN])),
            Command::OpenAdvPipe([0; PIPE_BITMAP_LEN]),
            Command::OpenAdvPipe([0xFF, 0, 0, 0, 0, 0, 0, 0x3F]),
            Command::Broadcast { timeout: 0, adv_interval: 0x00A0 },
            Command::Broadcast { timeout: 0xFFFF, adv_interval: 0xFFFF },
            Command::BondSecurityRequest,
            Command::ConnectDirect,
            Command::CloseRemotePipe(0xFF),
        ];

        let mut opcodes = std::vec::Vec::new();
        for command in samples {
            let frame = command.encode().unwrap();
            assert_eq!(Command::decode(&frame).unwrap(), command, "{:?}", command);
            opcodes.push(command.opcode() as u8);
        }
        opcodes.sort_unstable();
        opcodes.dedup();
        assert_eq!(opcodes.len(), CommandOpcode::ALL.len());
    }

    #[test]
    fn test_decode_rejects_non_commands() {
        let frame = Frame::from_payload(&[0x84, 0x02, 0x00]).unwrap();
        assert_eq!(Command::decode(&frame), Err(CodecError::UnknownCommand(0x84)));
        let short = Frame::from_payload(&[0x0F, 0x01]).unwrap();
        assert!(matches!(Command::decode(&short), Err(CodecError::Truncated { .. })));
    }
}
