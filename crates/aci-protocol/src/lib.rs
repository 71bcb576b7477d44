// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

//! # ACI Protocol
//!
//! Pure translation between structured commands/events and transport
//! [`Frame`](aci_transport::Frame)s. Nothing here touches queues or pins.
//!
//! ```text
//! Command ──encode──> Frame ──(transport)──> peer
//! peer ──(transport)──> Frame ──decode──> Event
//! ```
//!
//! ## Usage
//!
//! ```
//! use aci_protocol::{Command, Event, StatusCode};
//! use aci_transport::Frame;
//!
//! let frame = Command::GetTemperature.encode().unwrap();
//! assert_eq!(frame.as_bytes(), &[1, 0x0C]);
//!
//! let reply = Frame::from_payload(&[0x84, 0x0C, 0x00, 0x5C, 0x00]).unwrap();
//! let event = Event::decode(&reply).unwrap();
//! assert_eq!(event.as_command_response().unwrap().status, StatusCode::Success);
//! ```

#[cfg(test)]
extern crate std;

/// Host-to-peer commands
pub mod command;
/// Codec errors
pub mod error;
/// Peer-to-host events
pub mod event;
/// Opcode tables
pub mod opcode;
/// Wire constants and single-byte enums
pub mod types;

mod wire;

pub use command::{Command, ConnectionParams, KeyMaterial, TimingRequest};
pub use error::{CodecError, CodecResult};
pub use event::{BondStatus, CommandResponse, ConnectionTiming, DeviceVersion, Event, ResponseData};
pub use opcode::{CommandOpcode, EventOpcode};
pub use types::*;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
