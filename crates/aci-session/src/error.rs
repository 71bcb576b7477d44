// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for session and setup operations

use core::fmt;

use aci_protocol::{CodecError, StatusCode};
use aci_transport::TransportError;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Session and command-helper errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// Link-level failure
    Transport(TransportError),

    /// Encode or decode failure
    Codec(CodecError),

    /// No data credit left for a credit-consuming command
    CreditExhausted,

    /// Pipe number outside the peer's pipe range
    InvalidPipe(u8),

    /// Pipe number has no entry in the pipe type map
    PipeNotMapped(u8),

    /// Pipe type or location does not allow the operation
    PipeTypeMismatch {
        /// Pipe number
        pipe: u8,
        /// Operation attempted
        operation: &'static str,
    },

    /// Argument outside its documented range
    OutOfRange {
        /// Argument name
        field: &'static str,
        /// Supplied value
        value: u32,
    },

    /// The peer never answered during board initialisation
    BoardInitTimeout,

    /// A locally generated event found the inbound queue full
    EventQueueFull,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Transport(e) => write!(f, "Transport error: {}", e),
            SessionError::Codec(e) => write!(f, "Codec error: {}", e),
            SessionError::CreditExhausted => write!(f, "No data credit available"),
            SessionError::InvalidPipe(pipe) => write!(f, "Invalid pipe number {}", pipe),
            SessionError::PipeNotMapped(pipe) => write!(f, "Pipe {} is not in the pipe map", pipe),
            SessionError::PipeTypeMismatch { pipe, operation } => {
                write!(f, "Pipe {} does not support {}", pipe, operation)
            }
            SessionError::OutOfRange { field, value } => {
                write!(f, "{} out of range: {}", field, value)
            }
            SessionError::BoardInitTimeout => write!(f, "Board initialisation timed out"),
            SessionError::EventQueueFull => write!(f, "Inbound queue full, local event dropped"),
        }
    }
}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        SessionError::Transport(e)
    }
}

impl From<CodecError> for SessionError {
    fn from(e: CodecError) -> Self {
        SessionError::Codec(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SessionError {}

/// Why a setup run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupError {
    /// Commands were already queued when setup started
    CommandQueueNotEmpty,

    /// Events were already waiting when setup started
    EventQueueNotEmpty,

    /// No response within the deadline
    Timeout,

    /// A non-response event arrived (raw opcode); it is left queued
    UnexpectedEvent(u8),

    /// A response carried a status other than continue/complete; it is left queued
    UnexpectedStatus(StatusCode),

    /// The peer reported completion before every frame was sent
    PrematureComplete {
        /// Frames submitted
        sent: usize,
        /// Frames in the blob
        total: usize,
    },

    /// An inbound frame did not decode
    Malformed(CodecError),

    /// Link-level failure
    Link(TransportError),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::CommandQueueNotEmpty => write!(f, "Setup failed: command queue not empty"),
            SetupError::EventQueueNotEmpty => write!(f, "Setup failed: event queue not empty"),
            SetupError::Timeout => write!(f, "Setup failed: timeout"),
            SetupError::UnexpectedEvent(op) => {
                write!(f, "Setup failed: unexpected event 0x{:02X}", op)
            }
            SetupError::UnexpectedStatus(status) => {
                write!(f, "Setup failed: unexpected status 0x{:02X}", status.as_u8())
            }
            SetupError::PrematureComplete { sent, total } => {
                write!(f, "Setup failed: complete after {} of {} frames", sent, total)
            }
            SetupError::Malformed(e) => write!(f, "Setup failed: {}", e),
            SetupError::Link(e) => write!(f, "Setup failed: {}", e),
        }
    }
}

impl From<TransportError> for SetupError {
    fn from(e: TransportError) -> Self {
        SetupError::Link(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SetupError {}
