// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Wire constants and single-byte enumerations.

use crate::error::CodecError;

/// ACI protocol revision these tables describe
pub const ACI_VERSION: u8 = 0x02;

/// Bluetooth device address length
pub const BD_ADDR_LEN: usize = 6;

/// Echo payload limit (link MTU minus length, opcode and status slots)
pub const ECHO_DATA_MAX_LEN: usize = 29;

/// Number of pipes the peer can host
pub const MAX_PIPES: usize = 62;

/// Highest pipe number; pipes run `0..=PIPE_NUMBER_MAX`
pub const PIPE_NUMBER_MAX: u8 = (MAX_PIPES - 1) as u8;

/// Bytes in an open/closed pipe bitmap
pub const PIPE_BITMAP_LEN: usize = 8;

/// Data bytes a host can send on one pipe in one frame
pub const PIPE_TX_DATA_MAX_LEN: usize = 20;

/// Data bytes the peer can deliver on one pipe in one frame
pub const PIPE_RX_DATA_MAX_LEN: usize = 22;

/// Setup blob bytes carried by one setup command
pub const SETUP_DATA_MAX_LEN: usize = 30;

/// Dynamic data bytes carried by one write command
pub const DYNAMIC_DATA_MAX_LEN: usize = 29;

/// Passkey digits carried by `SetKey` and `DisplayPasskey`
pub const PASSKEY_LEN: usize = 6;

/// Out-of-band key length
pub const OOB_KEY_LEN: usize = 16;

/// Open/closed pipe bitmap, bit `n` of byte `n / 8` for pipe `n`
pub type PipeBitmap = [u8; PIPE_BITMAP_LEN];

/// Device address as carried on the wire (least significant byte first)
pub type BdAddr = [u8; BD_ADDR_LEN];

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl TryFrom<u8> for $name {
            type Error = CodecError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $value => Ok($name::$variant), )+
                    _ => Err(CodecError::InvalidValue { field: $field, value }),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }
    };
}

wire_enum! {
    /// Operating mode reported by `DeviceStarted`
    DeviceMode, "device mode" {
        /// No valid mode
        Invalid = 0x00,
        /// Direct test mode
        Test = 0x01,
        /// Waiting for the setup blob
        Setup = 0x02,
        /// Configured and idle
        Standby = 0x03,
        /// Low-power sleep
        Sleep = 0x04,
    }
}

wire_enum! {
    /// Hardware error flag in `DeviceStarted`
    HwError, "hardware error" {
        /// Clean start
        None = 0x00,
        /// Restarted after a fatal error
        Fatal = 0x01,
    }
}

wire_enum! {
    /// Argument of the `Test` command
    TestMode, "test mode" {
        /// DTM over the UART pins
        DtmUart = 0x01,
        /// DTM over ACI
        DtmAci = 0x02,
        /// Leave test mode
        Exit = 0xFF,
    }
}

wire_enum! {
    /// Argument of the `Disconnect` command
    DisconnectReason, "disconnect reason" {
        /// Ordinary terminate request
        Terminate = 0x01,
        /// Link timing unacceptable
        BadTiming = 0x02,
    }
}

wire_enum! {
    /// Radio output power
    TxPower, "tx power" {
        /// -18 dBm
        Minus18Dbm = 0x00,
        /// -12 dBm
        Minus12Dbm = 0x01,
        /// -6 dBm
        Minus6Dbm = 0x02,
        /// 0 dBm
        Dbm0 = 0x03,
    }
}

wire_enum! {
    /// Bluetooth device address type
    BdAddrType, "address type" {
        /// Not set
        Invalid = 0x00,
        /// Public
        Public = 0x01,
        /// Random static
        RandomStatic = 0x02,
        /// Random private resolvable
        RandomPrivateResolvable = 0x03,
        /// Random private non-resolvable
        RandomPrivateUnresolvable = 0x04,
    }
}

wire_enum! {
    /// Sleep clock accuracy of the central
    ClockAccuracy, "clock accuracy" {
        /// 500 ppm
        Ppm500 = 0x00,
        /// 250 ppm
        Ppm250 = 0x01,
        /// 150 ppm
        Ppm150 = 0x02,
        /// 100 ppm
        Ppm100 = 0x03,
        /// 75 ppm
        Ppm75 = 0x04,
        /// 50 ppm
        Ppm50 = 0x05,
        /// 30 ppm
        Ppm30 = 0x06,
        /// 20 ppm
        Ppm20 = 0x07,
    }
}

wire_enum! {
    /// Argument of `SetApplicationLatency`
    AppLatencyMode, "application latency mode" {
        /// Wake on every connection event
        Disable = 0x00,
        /// Skip up to the given number of events
        Enable = 0x01,
    }
}

wire_enum! {
    /// Key type in `SetKey` and `KeyRequest`
    KeyType, "key type" {
        /// No key / reject
        Invalid = 0x00,
        /// Six-digit passkey
        Passkey = 0x01,
        /// 16-byte out-of-band key
        Oob = 0x02,
    }
}

wire_enum! {
    /// Outcome reported by `BondStatus`
    BondStatusCode, "bond status" {
        /// Bonded
        Success = 0x00,
        /// Failed
        Failed = 0x01,
        /// Timed out
        FailedTimedOut = 0x02,
        /// Passkey entry failed
        FailedPasskeyEntry = 0x81,
        /// OOB data unavailable
        FailedOobUnavailable = 0x82,
        /// Authentication requirements not met
        FailedAuthenticationReq = 0x83,
        /// Confirm value mismatch
        FailedConfirmValue = 0x84,
        /// Pairing not supported
        FailedPairingUnsupported = 0x85,
        /// Encryption key size too small
        FailedEncryptionKeySize = 0x86,
        /// SMP command unsupported
        FailedSmpCmdUnsupported = 0x87,
        /// Unspecified
        FailedUnspecified = 0x88,
        /// Too many attempts
        FailedRepeatedAttempts = 0x89,
        /// Invalid parameters
        FailedInvalidParameters = 0x8A,
    }
}

wire_enum! {
    /// Which side ended the bonding procedure
    BondStatusSource, "bond status source" {
        /// Not set
        Invalid = 0x00,
        /// This device
        Local = 0x01,
        /// The peer central
        Remote = 0x02,
    }
}

/// Command status carried by `CommandResponse` and `Disconnected`
///
/// Values outside the documented set are kept as [`StatusCode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusCode {
    /// Command succeeded
    Success,
    /// Setup transaction accepted, send more
    TransactionContinue,
    /// Setup transaction finished
    TransactionComplete,
    /// Extended status follows
    Extended,
    /// Unknown error
    ErrorUnknown,
    /// Internal error
    ErrorInternal,
    /// Opcode not supported in the current mode
    ErrorCmdUnknown,
    /// Command not valid in the current device state
    ErrorDeviceStateInvalid,
    /// Length field wrong
    ErrorInvalidLength,
    /// Parameter out of range
    ErrorInvalidParameter,
    /// Peer busy
    ErrorBusy,
    /// Data invalid
    ErrorInvalidData,
    /// Setup CRC mismatch
    ErrorCrcMismatch,
    /// Setup format not supported
    ErrorUnsupportedSetupFormat,
    /// Sequence number out of order
    ErrorInvalidSeqNo,
    /// Setup locked
    ErrorSetupLocked,
    /// Lock failed
    ErrorLockFailed,
    /// Bond required
    ErrorBondRequired,
    /// Rejected
    ErrorRejected,
    /// Data size wrong for the pipe
    ErrorDataSize,
    /// Pipe number invalid
    ErrorPipeInvalid,
    /// No credit available
    ErrorCreditNotAvailable,
    /// Peer ATT error
    ErrorPeerAttError,
    /// Advertising timed out
    ErrorAdvtTimeout,
    /// Peer SMP error
    ErrorPeerSmpError,
    /// Pipe type does not support the command
    ErrorPipeTypeInvalid,
    /// Pipe state does not allow the command
    ErrorPipeStateInvalid,
    /// Key size invalid
    ErrorInvalidKeySize,
    /// Key data invalid
    ErrorInvalidKeyData,
    /// Any other value
    Other(u8),
}

impl StatusCode {
    /// Table of documented codes
    const KNOWN: [(u8, StatusCode); 29] = [
        (0x00, StatusCode::Success),
        (0x01, StatusCode::TransactionContinue),
        (0x02, StatusCode::TransactionComplete),
        (0x03, StatusCode::Extended),
        (0x80, StatusCode::ErrorUnknown),
        (0x81, StatusCode::ErrorInternal),
        (0x82, StatusCode::ErrorCmdUnknown),
        (0x83, StatusCode::ErrorDeviceStateInvalid),
        (0x84, StatusCode::ErrorInvalidLength),
        (0x85, StatusCode::ErrorInvalidParameter),
        (0x86, StatusCode::ErrorBusy),
        (0x87, StatusCode::ErrorInvalidData),
        (0x88, StatusCode::ErrorCrcMismatch),
        (0x89, StatusCode::ErrorUnsupportedSetupFormat),
        (0x8A, StatusCode::ErrorInvalidSeqNo),
        (0x8B, StatusCode::ErrorSetupLocked),
        (0x8C, StatusCode::ErrorLockFailed),
        (0x8D, StatusCode::ErrorBondRequired),
        (0x8E, StatusCode::ErrorRejected),
        (0x8F, StatusCode::ErrorDataSize),
        (0x90, StatusCode::ErrorPipeInvalid),
        (0x91, StatusCode::ErrorCreditNotAvailable),
        (0x92, StatusCode::ErrorPeerAttError),
        (0x93, StatusCode::ErrorAdvtTimeout),
        (0x94, StatusCode::ErrorPeerSmpError),
        (0x95, StatusCode::ErrorPipeTypeInvalid),
        (0x96, StatusCode::ErrorPipeStateInvalid),
        (0x97, StatusCode::ErrorInvalidKeySize),
        (0x98, StatusCode::ErrorInvalidKeyData),
    ];

    /// Raw status byte
    pub fn as_u8(self) -> u8 {
        if let StatusCode::Other(raw) = self {
            return raw;
        }
        Self::KNOWN
            .iter()
            .find(|(_, code)| *code == self)
            .map(|(raw, _)| *raw)
            .unwrap_or(0xFF)
    }

    /// True for the 0x80.. error range
    pub fn is_error(self) -> bool {
        self.as_u8() >= 0x80
    }
}

impl From<u8> for StatusCode {
    fn from(value: u8) -> Self {
        Self::KNOWN
            .iter()
            .find(|(raw, _)| *raw == value)
            .map(|(_, code)| *code)
            .unwrap_or(StatusCode::Other(value))
    }
}

impl From<StatusCode> for u8 {
    fn from(value: StatusCode) -> u8 {
        value.as_u8()
    }
}
