//! Command frame encoding
//!
//! Pure encode helpers, no I/O. Frames are fixed-length: one ASCII opcode
//! byte, opcode-specific little-endian fields, zero padding to [`FRAME_LEN`].
//! The firmware reads exactly [`FRAME_LEN`] bytes per command into a packed
//! union, so short payloads must be padded and long ones are impossible.

use byteorder::{ByteOrder, LittleEndian};

use super::commands::Opcode;
use super::ProtocolError;

/// Fixed length of every command frame on the wire.
pub const FRAME_LEN: usize = 9;

/// Device timer input clock.
pub const F_CPU_HZ: u32 = 16_000_000;

/// Prescaler the firmware configures for timer/counter 1.
pub const TIMER_PRESCALER: u32 = 1024;

/// Hardware ticks per millisecond at [`F_CPU_HZ`] / [`TIMER_PRESCALER`].
const TICKS_PER_MS: f64 = F_CPU_HZ as f64 / (TIMER_PRESCALER as f64 * 1000.0);

/// One encoded command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; FRAME_LEN],
}

impl Frame {
    /// Encode an opcode and payload, right-padding with zero bytes.
    ///
    /// Fails with [`ProtocolError::PayloadTooLarge`] if the payload does not
    /// leave room for the opcode byte.
    pub fn encode(opcode: Opcode, payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() > FRAME_LEN - 1 {
            return Err(ProtocolError::PayloadTooLarge { len: payload.len() });
        }
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = opcode.byte();
        bytes[1..=payload.len()].copy_from_slice(payload);
        Ok(Self { bytes })
    }

    /// The raw opcode byte.
    pub fn opcode(&self) -> u8 {
        self.bytes[0]
    }

    /// Payload area including padding.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[1..]
    }

    /// The whole frame as wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Chained builder for frame payloads.
#[derive(Debug)]
pub struct FrameBuilder {
    payload: Vec<u8>,
}

impl FrameBuilder {
    /// Start an empty payload.
    pub fn new() -> Self {
        Self {
            payload: Vec::with_capacity(FRAME_LEN - 1),
        }
    }

    /// Append a single byte.
    pub fn u8(mut self, value: u8) -> Self {
        self.payload.push(value);
        self
    }

    /// Append a 16-bit value, little-endian.
    pub fn u16_le(mut self, value: u16) -> Self {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.payload.extend_from_slice(&buf);
        self
    }

    /// Append a 32-bit value, little-endian.
    pub fn u32_le(mut self, value: u32) -> Self {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.payload.extend_from_slice(&buf);
        self
    }

    /// Append a signed 32-bit value, two's-complement little-endian.
    pub fn i32_le(mut self, value: i32) -> Self {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, value);
        self.payload.extend_from_slice(&buf);
        self
    }

    /// Finish the frame under the given opcode.
    pub fn build(self, opcode: Opcode) -> Result<Frame, ProtocolError> {
        Frame::encode(opcode, &self.payload)
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Narrow a value to 8 bits, failing before any I/O if it does not fit.
pub fn checked_u8(value: u32) -> Result<u8, ProtocolError> {
    u8::try_from(value).map_err(|_| ProtocolError::ValueOutOfRange {
        value: i64::from(value),
        bits: 8,
    })
}

/// Narrow a value to 16 bits, failing before any I/O if it does not fit.
pub fn checked_u16(value: u32) -> Result<u16, ProtocolError> {
    u16::try_from(value).map_err(|_| ProtocolError::ValueOutOfRange {
        value: i64::from(value),
        bits: 16,
    })
}

/// Convert a millisecond duration to 16-bit hardware timer ticks.
///
/// `ticks = floor(ms * F_CPU_HZ / TIMER_PRESCALER / 1000)`; the result must
/// fit the 16-bit timer registers.
pub fn ms_to_ticks(duration_ms: f64) -> Result<u16, ProtocolError> {
    let ticks = (duration_ms * TICKS_PER_MS).floor();
    if (0.0..=f64::from(u16::MAX)).contains(&ticks) {
        Ok(ticks as u16)
    } else {
        Err(ProtocolError::ValueOutOfRange {
            value: ticks as i64,
            bits: 16,
        })
    }
}

/// Convert a millisecond duration to signed 32-bit microseconds.
///
/// Negative durations are valid; the fluidics trigger fires before the
/// imaging start when its delay is negative.
pub fn ms_to_us(duration_ms: f64) -> Result<i32, ProtocolError> {
    let us = (duration_ms * 1000.0).round();
    if (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&us) {
        Ok(us as i32)
    } else {
        Err(ProtocolError::ValueOutOfRange {
            value: us as i64,
            bits: 32,
        })
    }
}

/// Pack a list of bits into one byte, first element ending up in the most
/// significant position. With `reverse` the list is read back-to-front,
/// which yields the least-significant-bit-first order the shutter port
/// expects. At most 8 bits are meaningful.
pub fn pack_bits(bits: &[bool], reverse: bool) -> u8 {
    debug_assert!(bits.len() <= 8);
    let fold = |acc: u8, bit: &bool| (acc << 1) | u8::from(*bit);
    if reverse {
        bits.iter().rev().fold(0, fold)
    } else {
        bits.iter().fold(0, fold)
    }
}
