// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for encode/decode

use core::fmt;

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Codec errors
///
/// An unrecognised event opcode is not an error: it decodes to
/// [`crate::Event::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// A variable-length field exceeds its limit
    PayloadTooLong {
        /// Field name
        field: &'static str,
        /// Supplied length
        length: usize,
        /// Largest accepted length
        max_length: usize,
    },

    /// Frame shorter than its opcode's fixed fields
    Truncated {
        /// Opcode being decoded (0 for an empty frame)
        opcode: u8,
        /// Bytes the fixed fields need, opcode included
        needed: usize,
        /// Bytes present
        available: usize,
    },

    /// A byte does not map to any value of its field
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Offending byte
        value: u8,
    },

    /// Command decode met an opcode outside the command set
    UnknownCommand(u8),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::PayloadTooLong {
                field,
                length,
                max_length,
            } => write!(f, "{} too long: {} bytes (max {})", field, length, max_length),
            CodecError::Truncated {
                opcode,
                needed,
                available,
            } => write!(
                f,
                "Truncated frame for opcode 0x{:02X}: need {} bytes, got {}",
                opcode, needed, available
            ),
            CodecError::InvalidValue { field, value } => {
                write!(f, "Invalid {}: 0x{:02X}", field, value)
            }
            CodecError::UnknownCommand(op) => write!(f, "Unknown command opcode 0x{:02X}", op),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}
