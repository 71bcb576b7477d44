// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

//! # ACI Session
//!
//! Link state and procedures layered over [`aci_transport`] and
//! [`aci_protocol`]:
//!
//! - **Session** (`session`) - pipe bitmaps, data credits and connection
//!   timing, updated from decoded events
//! - **Pipes** (`pipes`) - bitmap helpers and the per-pipe type map produced
//!   alongside the setup blob
//! - **Setup** (`setup`) - non-blocking bootstrap that streams the setup blob
//! - **Aci** (`aci`) - validated command helpers and the event pump
//!
//! ## Usage
//!
//! ```no_run
//! use aci_session::{Aci, Board, PipeMap};
//! use aci_transport::{Mode, Transport, TransportConfig};
//! # fn demo<P: aci_hal::AciPhysical, T: aci_hal::TimeProvider>(phy: P, time: &mut T)
//! #     -> aci_session::SessionResult<()> {
//! let transport: Transport<P> = Transport::new(phy, TransportConfig::new(Mode::Polled));
//! let mut aci = Aci::new(transport, PipeMap::new());
//! aci.init(time, Board::Standard)?;
//! while let Some(event) = aci.event_get()? {
//!     // react to the event
//!     let _ = event;
//! }
//! # Ok(())
//! # }
//! ```

#[cfg(test)]
extern crate std;

/// Application-facing link
pub mod aci;
/// Data credit accounting
pub mod credit;
/// Error types
pub mod error;
/// Pipe bitmaps and type map
pub mod pipes;
/// Event-driven link state
pub mod session;
/// Setup bootstrap
pub mod setup;

pub use aci::{Aci, Board, BoardInitStep, BROADCAST_INTERVAL_RANGE, BROADCAST_TIMEOUT_MAX};
pub use credit::{CreditEvent, CreditState};
pub use error::{SessionError, SessionResult, SetupError};
pub use pipes::{bitmap_set, bitmap_test, PipeInfo, PipeMap, PipeState, PipeStore, PipeType};
pub use session::{RemotePipeRequest, Session};
pub use setup::{
    DrivenLink, RoundBudget, SetupBootstrap, SetupDeadline, SetupLink, SetupReport, SetupState,
    WallClockDeadline, DEFAULT_SETUP_ROUNDS,
};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
