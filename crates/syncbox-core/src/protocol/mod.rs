//! Serial protocol for the sync device.
//!
//! Every command is one fixed-length frame: an ASCII opcode byte followed by
//! opcode-specific little-endian fields, zero-padded to [`FRAME_LEN`] bytes.
//! The device speaks back in three shapes only: a one-line boot greeting, a
//! single raw byte per register read, and an `"OK"` line acknowledging
//! device-level commands and transaction flushes.

pub mod commands;
mod error;
pub mod frame;
pub mod serial;
mod transaction;
mod transport;
mod version;

pub use commands::{Opcode, StrobeParams};
pub use error::ProtocolError;
pub use frame::{
    checked_u16, checked_u8, ms_to_ticks, ms_to_us, pack_bits, Frame, FrameBuilder, FRAME_LEN,
};
pub use serial::{list_ports, open_port, PortInfo, SerialLink};
pub use transaction::{TransactionBuffer, TRANSACTION_CAP};
pub use transport::{ConnectionState, Transport, TransportConfig};
pub use version::Version;

use std::time::Duration;

/// Default baud rate for the sync device's USB-serial link.
pub const DEFAULT_BAUD_RATE: u32 = 2_000_000;

/// Text the firmware prints ahead of its version after a reset.
pub const GREETING_PREFIX: &str = "Arduino is ready. Firmware version: ";

/// Acknowledgment line for device commands and transaction flushes.
pub const ACK: &str = "OK";

/// How long to wait for the boot greeting. Opening the port resets the
/// device, so the greeting arrives only after the bootloader finishes.
pub const BOOT_TIMEOUT: Duration = Duration::from_secs(5);

/// Steady-state read timeout once the handshake is done.
pub const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Settle window between the handshake and the first command; registers are
/// not stable immediately after the device's reset.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);
