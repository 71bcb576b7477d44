// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Byte cursor helpers shared by the command and event codecs.

use aci_transport::{Frame, MAX_FRAME_PAYLOAD};
use heapless::Vec;

use crate::error::{CodecError, CodecResult};

pub(crate) struct Writer {
    bytes: Vec<u8, MAX_FRAME_PAYLOAD>,
}

impl Writer {
    pub(crate) fn new(opcode: u8) -> Self {
        let mut bytes = Vec::new();
        // Capacity is 31, the first push cannot fail
        let _ = bytes.push(opcode);
        Self { bytes }
    }

    pub(crate) fn u8(mut self, value: u8) -> CodecResult<Self> {
        self.bytes.push(value).map_err(|_| self.overflow(1))?;
        Ok(self)
    }

    pub(crate) fn u16_le(self, value: u16) -> CodecResult<Self> {
        self.bytes(&value.to_le_bytes())
    }

    pub(crate) fn u32_le(self, value: u32) -> CodecResult<Self> {
        self.bytes(&value.to_le_bytes())
    }

    pub(crate) fn bytes(mut self, data: &[u8]) -> CodecResult<Self> {
        self.bytes
            .extend_from_slice(data)
            .map_err(|_| self.overflow(data.len()))?;
        Ok(self)
    }

    pub(crate) fn finish(self) -> CodecResult<Frame> {
        Frame::from_payload(&self.bytes).map_err(|_| self.overflow(0))
    }

    fn overflow(&self, extra: usize) -> CodecError {
        CodecError::PayloadTooLong {
            field: "frame",
            length: self.bytes.len() + extra,
            max_length: MAX_FRAME_PAYLOAD,
        }
    }
}

/// Reads the parameters of one frame, opcode already consumed
pub(crate) struct Reader<'a> {
    opcode: u8,
    params: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(opcode: u8, params: &'a [u8]) -> Self {
        Self {
            opcode,
            params,
            pos: 0,
        }
    }

    /// Fail unless `count` more fixed bytes are present
    pub(crate) fn require(&self, count: usize) -> CodecResult<()> {
        if self.remaining() < count {
            return Err(CodecError::Truncated {
                opcode: self.opcode,
                needed: 1 + self.pos + count,
                available: 1 + self.params.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn remaining(&self) -> usize {
        self.params.len() - self.pos
    }

    pub(crate) fn u8(&mut self) -> CodecResult<u8> {
        self.require(1)?;
        let value = self.params[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub(crate) fn u16_le(&mut self) -> CodecResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub(crate) fn i16_le(&mut self) -> CodecResult<i16> {
        Ok(i16::from_le_bytes(self.array()?))
    }

    pub(crate) fn u32_le(&mut self) -> CodecResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        self.require(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.params[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    /// Everything left in the frame
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let rest = &self.params[self.pos..];
        self.pos = self.params.len();
        rest
    }

    /// Everything left, at most `N` bytes
    pub(crate) fn rest_vec<const N: usize>(&mut self, field: &'static str) -> CodecResult<Vec<u8, N>> {
        let rest = self.rest();
        Vec::from_slice(rest).map_err(|_| CodecError::PayloadTooLong {
            field,
            length: rest.len(),
            max_length: N,
        })
    }
}

/// Split a frame into opcode and parameters
pub(crate) fn split(frame: &Frame) -> CodecResult<(u8, &[u8])> {
    match frame.payload().split_first() {
        Some((&opcode, params)) => Ok((opcode, params)),
        None => Err(CodecError::Truncated {
            opcode: 0,
            needed: 1,
            available: 0,
        }),
    }
}

/// Reject a variable-length field over `max_length`
pub(crate) fn check_len(field: &'static str, data: &[u8], max_length: usize) -> CodecResult<()> {
    if data.len() > max_length {
        return Err(CodecError::PayloadTooLong {
            field,
            length: data.len(),
            max_length,
        });
    }
    Ok(())
}
