// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Command (0x01..=0x1F) and event (0x81..=0x8F) opcodes.

use core::fmt;

macro_rules! opcode_table {
    (
        $(#[$meta:meta])*
        $name:ident {
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

        impl $name {
            /// Every opcode in wire order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Variant name
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant), )+
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = u8;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $value => Ok($name::$variant), )+
                    other => Err(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(op: $name) -> u8 {
                op as u8
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(0x{:02X})", self.name(), *self as u8)
            }
        }
    };
}

opcode_table! {
    /// Host-to-peer command opcodes
    CommandOpcode {
        /// Enter or leave test mode
        Test = 0x01,
        /// Echo test payload
        Echo = 0x02,
        /// Direct test mode command
        DtmCommand = 0x03,
        /// Enter sleep
        Sleep = 0x04,
        /// Leave sleep
        Wakeup = 0x05,
        /// One chunk of the setup blob
        Setup = 0x06,
        /// Read persistent dynamic data
        ReadDynamicData = 0x07,
        /// Write persistent dynamic data
        WriteDynamicData = 0x08,
        /// Firmware and setup identification
        GetDeviceVersion = 0x09,
        /// Own device address
        GetDeviceAddress = 0x0A,
        /// Supply voltage
        GetBatteryLevel = 0x0B,
        /// Die temperature
        GetTemperature = 0x0C,
        /// Update a local characteristic
        SetLocalData = 0x0D,
        /// Reset the radio
        RadioReset = 0x0E,
        /// Start connectable advertising
        Connect = 0x0F,
        /// Start bonding advertising
        Bond = 0x10,
        /// Drop the connection
        Disconnect = 0x11,
        /// Change radio output power
        SetTxPower = 0x12,
        /// Request new connection parameters
        ChangeTiming = 0x13,
        /// Open a remote pipe
        OpenRemotePipe = 0x14,
        /// Send pipe data
        SendData = 0x15,
        /// Acknowledge received pipe data
        SendDataAck = 0x16,
        /// Request data from the peer central
        RequestData = 0x17,
        /// Reject received pipe data
        SendDataNack = 0x18,
        /// Set application latency
        SetApplicationLatency = 0x19,
        /// Answer a key request
        SetKey = 0x1A,
        /// Select pipes carried in advertising
        OpenAdvPipe = 0x1B,
        /// Start non-connectable advertising
        Broadcast = 0x1C,
        /// Ask the central to (re)encrypt
        BondSecurityRequest = 0x1D,
        /// Directed advertising to the bonded central
        ConnectDirect = 0x1E,
        /// Close a remote pipe
        CloseRemotePipe = 0x1F,
    }
}

opcode_table! {
    /// Peer-to-host event opcodes
    EventOpcode {
        /// Peer finished reset
        DeviceStarted = 0x81,
        /// Echo reply
        Echo = 0x82,
        /// Fatal error report
        HwError = 0x83,
        /// Reply to a command
        CommandResponse = 0x84,
        /// Link up
        Connected = 0x85,
        /// Link down
        Disconnected = 0x86,
        /// Bonding outcome
        BondStatus = 0x87,
        /// Pipe bitmaps changed
        PipeStatus = 0x88,
        /// Connection parameters changed
        Timing = 0x89,
        /// Credits returned
        DataCredit = 0x8A,
        /// Peer acknowledged data
        DataAck = 0x8B,
        /// Pipe data arrived
        DataReceived = 0x8C,
        /// Pipe operation failed
        PipeError = 0x8D,
        /// Passkey to show the user
        DisplayPasskey = 0x8E,
        /// Peer asks for a key
        KeyRequest = 0x8F,
    }
}
