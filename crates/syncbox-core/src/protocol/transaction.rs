//! Transaction write buffering
//!
//! During a transaction, frames accumulate here instead of going to the
//! wire; the whole buffer is then flushed as one contiguous write followed
//! by a single acknowledgment. The cap matches the device's UART receive
//! buffer, which has to hold a full batch between polls.

use super::frame::Frame;
use super::ProtocolError;

/// Maximum number of bytes one transaction may buffer.
pub const TRANSACTION_CAP: usize = 64;

/// In-memory frame accumulator for one transaction.
#[derive(Debug, Default)]
pub struct TransactionBuffer {
    bytes: Vec<u8>,
}

impl TransactionBuffer {
    /// Empty buffer with the full cap reserved.
    pub fn new() -> Self {
        Self {
            bytes: Vec::with_capacity(TRANSACTION_CAP),
        }
    }

    /// Append one encoded frame.
    ///
    /// The cap is checked before anything is stored: on overflow the buffer
    /// is unchanged, nothing has been sent, and the caller decides how to
    /// recover.
    pub fn push(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        self.push_bytes(frame.as_bytes())
    }

    /// Append a raw chunk of already-framed bytes.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Result<(), ProtocolError> {
        let requested = self.bytes.len() + chunk.len();
        if requested > TRANSACTION_CAP {
            return Err(ProtocolError::BufferOverflow {
                requested,
                cap: TRANSACTION_CAP,
            });
        }
        self.bytes.extend_from_slice(chunk);
        Ok(())
    }

    /// Number of bytes currently buffered.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if nothing has been buffered.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the buffer, yielding the bytes to flush.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{FrameBuilder, Opcode, FRAME_LEN};

    #[test]
    fn accepts_up_to_the_cap_exactly() {
        let mut buffer = TransactionBuffer::new();
        for _ in 0..8 {
            buffer.push_bytes(&[0u8; 8]).unwrap();
        }
        assert_eq!(buffer.len(), TRANSACTION_CAP);
    }

    #[test]
    fn one_byte_past_the_cap_fails_and_leaves_buffer_unchanged() {
        let mut buffer = TransactionBuffer::new();
        buffer.push_bytes(&[0u8; TRANSACTION_CAP - 1]).unwrap();
        match buffer.push_bytes(&[0u8; 2]) {
            Err(ProtocolError::BufferOverflow { requested, cap }) => {
                assert_eq!(requested, TRANSACTION_CAP + 1);
                assert_eq!(cap, TRANSACTION_CAP);
            }
            other => panic!("expected BufferOverflow, got {:?}", other),
        }
        assert_eq!(buffer.len(), TRANSACTION_CAP - 1);
    }

    #[test]
    fn frames_accumulate_in_program_order() {
        let mut buffer = TransactionBuffer::new();
        let first = FrameBuilder::new()
            .u8(0x81)
            .u8(0x12)
            .build(Opcode::WriteRegister)
            .unwrap();
        let second = FrameBuilder::new()
            .u8(0x80)
            .u8(0x34)
            .build(Opcode::WriteRegister)
            .unwrap();
        buffer.push(&first).unwrap();
        buffer.push(&second).unwrap();

        let bytes = buffer.into_bytes();
        assert_eq!(bytes.len(), 2 * FRAME_LEN);
        assert_eq!(&bytes[..FRAME_LEN], first.as_bytes());
        assert_eq!(&bytes[FRAME_LEN..], second.as_bytes());
    }

    #[test]
    fn seven_frames_fit_the_eighth_overflows() {
        let mut buffer = TransactionBuffer::new();
        let frame = FrameBuilder::new()
            .u8(0x24)
            .u8(0xFF)
            .build(Opcode::WriteRegister)
            .unwrap();
        for _ in 0..7 {
            buffer.push(&frame).unwrap();
        }
        assert_eq!(buffer.len(), 7 * FRAME_LEN);
        assert!(matches!(
            buffer.push(&frame),
            Err(ProtocolError::BufferOverflow { .. })
        ));
        assert_eq!(buffer.len(), 7 * FRAME_LEN);
    }
}
