// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Physical exchange trait consumed by the transport.
pub mod physical;
/// Peer reset line and reset pulse profiles.
pub mod reset;
/// Timekeeping abstractions (monotonic timers, delays).
pub mod time;

// Re-export trait types
pub use physical::AciPhysical;
pub use reset::{pulse_reset, ResetLine, ResetProfile};
pub use time::TimeProvider;
