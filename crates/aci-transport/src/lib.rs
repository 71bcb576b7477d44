// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

//! # ACI Transport
//!
//! Bridges two fixed-capacity frame queues to an [`aci_hal::AciPhysical`]
//! link.
//!
//! - **Frame** (`frame`) - length-prefixed unit exchanged over the link
//! - **Frame Queue** (`queue`) - circular buffer guarded by a critical section
//! - **Transport** (`transport`) - request-line policy, length negotiation and
//!   the single transfer cycle shared by polled and ready-line-driven modes
//!
//! ## Usage
//!
//! ```no_run
//! use aci_transport::{Frame, Mode, Transport, TransportConfig};
//! # fn demo<P: aci_hal::AciPhysical>(phy: P) -> aci_transport::TransportResult<()> {
//! let mut link: Transport<P> = Transport::new(phy, TransportConfig::new(Mode::Polled));
//! let frame = Frame::from_payload(&[0x09])?; // GetDeviceVersion
//! if link.send(&frame)? {
//!     while link.event_get()?.is_none() {}
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Queue operations take `&self` and run inside `critical_section::with`, so
//! the application context and the ready-line handler never observe a torn
//! head/tail update. The platform supplies the critical-section
//! implementation (interrupt masking on Cortex-M, a mutex on hosted targets).

#[cfg(test)]
extern crate std;

/// Error types
pub mod error;
/// Frame layout and limits
pub mod frame;
/// Circular frame queue
pub mod queue;
/// Transfer cycle and request-line policy
pub mod transport;

pub use error::{TransportError, TransportResult};
pub use frame::{Frame, MAX_FRAME_PAYLOAD, PACKET_MAX_LEN};
pub use queue::FrameQueue;
pub use transport::{CycleOutcome, Mode, Transport, TransportConfig, DEFAULT_QUEUE_CAPACITY};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
