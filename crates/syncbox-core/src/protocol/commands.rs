//! Command opcodes
//!
//! The closed opcode set understood by the firmware event loop, one ASCII
//! letter each. Payload layouts are fixed per opcode; all multi-byte fields
//! are little-endian.

use serde::{Deserialize, Serialize};

/// Command opcodes for the sync device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opcode {
    /// Read one hardware register (`R`); payload `addr: u8`, reply one byte.
    ReadRegister,

    /// Write one hardware register (`W`); payload `addr: u8, value: u8`.
    WriteRegister,

    /// Set the fluidics trigger delay (`F`); payload `delay_us: i32`,
    /// negative delays fire the trigger before the imaging start.
    FluidicsDelay,

    /// Configure and start stroboscopic / ALEX / timelapse acquisition
    /// (`S`); payload `exposure: u16` ticks, `n_frames: u16`,
    /// `interframe: u16` ticks, `timelapse_delay: u16` ms.
    StartStrobe,

    /// Configure and start continuous acquisition (`C`); payload
    /// `exposure: u16` ticks, `n_frames: u16`.
    StartContinuous,

    /// Change the exposure of a running trigger on the fly (`E`); payload
    /// `exposure: u16` ticks.
    SetExposure,

    /// Stop the camera trigger (`Q`); no payload.
    Stop,

    /// Set laser shutter states (`L`); payload `active: u8, idle: u8,
    /// alex: u8` bit masks.
    SetShutters,
}

impl Opcode {
    /// The wire byte for this opcode.
    pub fn byte(self) -> u8 {
        match self {
            Opcode::ReadRegister => b'R',
            Opcode::WriteRegister => b'W',
            Opcode::FluidicsDelay => b'F',
            Opcode::StartStrobe => b'S',
            Opcode::StartContinuous => b'C',
            Opcode::SetExposure => b'E',
            Opcode::Stop => b'Q',
            Opcode::SetShutters => b'L',
        }
    }

    /// Whether the firmware answers this command with an "OK" line.
    /// Register reads reply with a raw byte instead; register writes are
    /// fire-and-forget.
    pub fn expects_ack(self) -> bool {
        !matches!(self, Opcode::ReadRegister | Opcode::WriteRegister)
    }
}

/// Parameters for stroboscopic acquisition (`S`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrobeParams {
    /// Laser flash duration per frame, in milliseconds.
    pub exposure_ms: f64,
    /// Number of frames to acquire; 0 runs until stopped.
    pub n_frames: u16,
    /// Time between frame starts, in milliseconds.
    pub interframe_ms: f64,
    /// Extra delay between timelapse cycles, in milliseconds.
    pub timelapse_delay_ms: u16,
}

impl StrobeParams {
    /// Strobe with the given exposure and everything else at its default.
    pub fn new(exposure_ms: f64) -> Self {
        Self {
            exposure_ms,
            n_frames: 0,
            interframe_ms: 0.0,
            timelapse_delay_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_bytes() {
        assert_eq!(Opcode::ReadRegister.byte(), b'R');
        assert_eq!(Opcode::WriteRegister.byte(), b'W');
        assert_eq!(Opcode::FluidicsDelay.byte(), b'F');
        assert_eq!(Opcode::StartStrobe.byte(), b'S');
        assert_eq!(Opcode::StartContinuous.byte(), b'C');
        assert_eq!(Opcode::SetExposure.byte(), b'E');
        assert_eq!(Opcode::Stop.byte(), b'Q');
        assert_eq!(Opcode::SetShutters.byte(), b'L');
    }

    #[test]
    fn register_access_is_not_acknowledged() {
        assert!(!Opcode::ReadRegister.expects_ack());
        assert!(!Opcode::WriteRegister.expects_ack());
        assert!(Opcode::Stop.expects_ack());
        assert!(Opcode::SetShutters.expects_ack());
    }
}
