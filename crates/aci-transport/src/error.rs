// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for transport operations

use core::fmt;

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport errors
///
/// A full outbound queue is not an error; `send` reports it as `Ok(false)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Frame length exceeds the link MTU
    FrameTooLong {
        /// Declared length
        length: usize,
        /// Largest accepted length
        max_length: usize,
    },

    /// Fewer bytes supplied than the length byte declares
    Truncated {
        /// Declared length
        declared: usize,
        /// Bytes actually present
        available: usize,
    },

    /// The physical link reported an error (details are logged)
    Physical,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::FrameTooLong { length, max_length } => {
                write!(f, "Frame too long: {} bytes (max {})", length, max_length)
            }
            TransportError::Truncated { declared, available } => {
                write!(f, "Truncated frame: declared {} bytes, got {}", declared, available)
            }
            TransportError::Physical => write!(f, "Physical link error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}
