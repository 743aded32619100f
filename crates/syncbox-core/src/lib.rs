//! # syncbox core library
//!
//! Host-side driver for AVR-based microscopy synchronization boxes.
//!
//! The sync device generates hardware-timed camera triggers, laser shutter
//! patterns and fluidics triggers. This crate owns the serial link to the
//! device and provides:
//! - the fixed-length command frame codec and opcode set
//! - the connection handshake with firmware version negotiation
//! - typed 8/16/32-bit access to the MCU's hardware registers
//! - transactional batching of register writes into a single flush
//! - the device facade with acquisition, shutter and fluidics commands
//!
//! ## Example
//!
//! ```rust,ignore
//! use syncbox_core::prelude::*;
//! use syncbox_core::registers::atmega328p;
//!
//! let mut dev = SyncDevice::open("/dev/ttyACM0", atmega328p::BANK)?;
//! let icr1 = dev.register("ICR1")?;
//! dev.write_register(icr1, 5986)?;
//!
//! let mut txn = dev.transaction();
//! txn.write_named("OCR1A", 817)?;
//! txn.write_named("OCR1B", 1164)?;
//! txn.commit()?;
//! ```

#![warn(missing_docs)]

pub mod device;
pub mod protocol;
pub mod registers;

/// Re-export of the types most callers need.
pub mod prelude {
    pub use crate::device::{SyncDevice, Transaction};
    pub use crate::protocol::{
        ConnectionState, Opcode, ProtocolError, StrobeParams, TransportConfig, Version,
    };
    pub use crate::registers::{Register, RegisterBank, RegisterWidth};
}

/// Driver version; the firmware is expected to report the same major/minor.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
