//! Protocol errors

use thiserror::Error;

use super::Version;

/// Errors that can occur while talking to the sync device.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Serial port layer failure (open, configure, enumerate).
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// The boot greeting was absent or unparseable. The connection is
    /// unusable; reopen the port to retry.
    #[error("Connection failed: expected boot greeting, got {received:?}")]
    ConnectionFailed {
        /// The line actually received (empty if nothing arrived).
        received: String,
    },

    /// The firmware's major/minor version differs from the driver's.
    /// Recoverable: the connection stays usable, the caller decides.
    #[error("Version mismatch: driver {expected}, firmware {actual}")]
    VersionMismatch {
        /// Version this driver was built for.
        expected: Version,
        /// Version the firmware reported.
        actual: Version,
    },

    /// A blocking read did not complete within the configured timeout.
    #[error("Read timed out")]
    Timeout,

    /// The transport has been closed.
    #[error("Serial link is not open")]
    NotConnected,

    /// The device answered something other than "OK".
    #[error("Sync device rejected the command, reply: {reply:?}")]
    SyncDevice {
        /// Verbatim reply line from the device.
        reply: String,
    },

    /// A value does not fit the target field width. Raised before any bytes
    /// are written to the wire.
    #[error("Value {value} does not fit in {bits} bits")]
    ValueOutOfRange {
        /// The offending value.
        value: i64,
        /// Width of the target field.
        bits: u32,
    },

    /// A frame payload exceeds the fixed frame capacity.
    #[error("Payload of {len} bytes exceeds the frame capacity")]
    PayloadTooLarge {
        /// Length of the rejected payload.
        len: usize,
    },

    /// Appending a frame would push the transaction buffer past its cap.
    /// The buffer is left unchanged and nothing is sent.
    #[error("Transaction buffer overflow: {requested} bytes requested, cap is {cap}")]
    BufferOverflow {
        /// Buffered size the append would have produced.
        requested: usize,
        /// The fixed buffer cap.
        cap: usize,
    },

    /// A register table entry declares a width other than 8, 16 or 32 bits.
    #[error("Unknown register width: {0} bits")]
    UnknownRegisterWidth(u8),

    /// The register table has no entry under this name.
    #[error("Unknown register {0:?}")]
    UnknownRegister(String),

    /// Register reads cannot be multiplexed past buffered writes.
    #[error("Register reads are not supported inside a transaction")]
    ReadInTransaction,

    /// I/O error from the underlying link.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
