// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # nrf-aci - ACI command/event transport for nRF8001-class controllers
//!
//! Host-side driver for BLE peripheral controllers that speak the Application
//! Controller Interface over a half-duplex, LSB-first SPI link gated by a
//! request line (REQN) and a ready line (RDYN).
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! nrf-aci = "0.1"  # Default: std + config + observability
//! ```
//!
//! ## Feature Flags
//!
//! - **`platform-std`** (default): host build with config loading and logging
//! - **`platform-no-std`**: bare-metal build; link layers only
//! - **`config`**: TOML configuration with environment and CLI overrides
//! - **`observability`**: `tracing` subscriber with per-crate debug flags
//! - **`sim`**: scripted controller for host-side tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nrf_aci::prelude::*;
//!
//! # fn demo<P: AciPhysical, T: TimeProvider>(phy: P, time: &mut T, blob: &[Frame])
//! #     -> Result<(), Box<dyn std::error::Error>> {
//! let transport: Transport<P> = Transport::new(phy, TransportConfig::new(Mode::Polled));
//! let mut aci = Aci::new(transport, PipeMap::new());
//! aci.init(time, Board::Standard)?;
//!
//! // Stream the setup blob, then advertise
//! aci.run_setup(blob, RoundBudget::default())?;
//! aci.connect(180, 0x0050)?;
//!
//! while let Some(event) = aci.event_get()? {
//!     if let Event::DataReceived { pipe, data } = event {
//!         aci.send_data(pipe, &data)?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  aci-session: Aci facade, session state, setup          │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  aci-protocol: Command / Event codec                    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  aci-transport: frame queues + transfer cycle           │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  aci-hal: SPI exchange, handshake lines, reset, time    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

#![cfg_attr(not(feature = "std"), no_std)]

// Re-export link layers
pub use aci_hal as hal;
pub use aci_protocol as protocol;
pub use aci_session as session;
pub use aci_transport as transport;

// Re-export infrastructure
#[cfg(feature = "config")]
pub use aci_config as config;

#[cfg(feature = "observability")]
pub use aci_observability as observability;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Link settings built from a loaded [`config::AciConfig`]
#[cfg(feature = "config")]
pub mod configured {
    use crate::config::{BoardKind, LinkConfig, LinkMode, SetupConfig};
    use crate::hal::TimeProvider;
    use crate::session::{Board, RoundBudget, WallClockDeadline};
    use crate::transport::{Mode, TransportConfig};

    /// Transport settings for `link`
    pub fn transport_config(link: &LinkConfig) -> TransportConfig {
        let mode = match link.mode {
            LinkMode::Polled => Mode::Polled,
            LinkMode::EventDriven => Mode::EventDriven,
        };
        TransportConfig {
            mode,
            debug_frames: link.debug_frames,
        }
    }

    /// Start-up sequence for `board`
    pub fn board(board: BoardKind) -> Board {
        match board {
            BoardKind::Standard => Board::Standard,
            BoardKind::RedBearLabV1_1 => Board::RedBearLabV1_1,
            BoardKind::RedBearLabV2012_07 => Board::RedBearLabV2012_07,
        }
    }

    /// Poll budget for the setup bootstrap
    pub fn round_budget(setup: &SetupConfig) -> RoundBudget {
        RoundBudget::new(setup.max_rounds)
    }

    /// Wall-clock setup deadline when `timeout_ms` is configured
    pub fn wall_clock_deadline<T: TimeProvider>(
        setup: &SetupConfig,
        time: T,
    ) -> Option<WallClockDeadline<T>> {
        setup
            .timeout_ms
            .map(|timeout_ms| WallClockDeadline::new(time, timeout_ms))
    }
}

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::hal::{AciPhysical, ResetLine, ResetProfile, TimeProvider};
    pub use crate::protocol::{Command, CommandResponse, Event, StatusCode};
    pub use crate::session::{
        Aci, Board, PipeMap, PipeType, RoundBudget, Session, SessionError, SetupBootstrap,
        SetupError, WallClockDeadline,
    };
    pub use crate::transport::{Frame, Mode, Transport, TransportConfig};

    #[cfg(feature = "config")]
    pub use crate::config::{load_config, AciConfig};

    #[cfg(feature = "observability")]
    pub use crate::observability::{init_logging, parse_debug_flags};
}
