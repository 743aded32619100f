//! Transport and handshake
//!
//! Owns the serial link exclusively and drives the connection lifecycle:
//! boot greeting, version negotiation, then blocking steady-state I/O.

use serde::{Deserialize, Serialize};
use std::io;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::serial::{open_port, SerialLink};
use super::{
    ProtocolError, Version, ACK, BOOT_TIMEOUT, DEFAULT_BAUD_RATE, GREETING_PREFIX, READ_TIMEOUT,
    SETTLE_DELAY,
};

/// Longest line the device is ever expected to send.
const MAX_LINE_LEN: usize = 256;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No open link.
    Closed,
    /// Link open, waiting for the device's boot greeting.
    AwaitingGreeting,
    /// Handshake complete, commands may be issued.
    Ready,
}

/// Transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Serial port name.
    pub port_name: String,
    /// Baud rate.
    pub baud_rate: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Exclusive owner of the serial link, providing the blocking primitives
/// everything else is built from.
pub struct Transport {
    link: Option<Box<dyn SerialLink>>,
    state: ConnectionState,
    firmware: Option<Version>,
    mismatch: Option<Version>,
}

impl Transport {
    /// Open the configured port and perform the handshake.
    pub fn open(config: &TransportConfig) -> Result<Self, ProtocolError> {
        let port = open_port(&config.port_name, config.baud_rate)?;
        let transport = Self::from_link(Box::new(port))?;
        debug!(port = %config.port_name, baud = config.baud_rate, "connected");
        Ok(transport)
    }

    /// Perform the handshake over an already-open link.
    ///
    /// Opening the port resets the device; the handshake waits out the
    /// reboot, validates the greeting, then drops the read timeout to its
    /// short steady-state value.
    pub fn from_link(link: Box<dyn SerialLink>) -> Result<Self, ProtocolError> {
        let mut transport = Self {
            link: Some(link),
            state: ConnectionState::AwaitingGreeting,
            firmware: None,
            mismatch: None,
        };
        match transport.handshake() {
            Ok(()) => {
                transport.state = ConnectionState::Ready;
                Ok(transport)
            }
            Err(err) => {
                transport.close();
                Err(err)
            }
        }
    }

    fn handshake(&mut self) -> Result<(), ProtocolError> {
        self.set_timeout(BOOT_TIMEOUT)?;
        let greeting = match self.read_line() {
            Ok(line) => line,
            // No greeting at all is a connection failure, not a plain timeout.
            Err(ProtocolError::Timeout) => {
                return Err(ProtocolError::ConnectionFailed {
                    received: String::new(),
                })
            }
            Err(err) => return Err(err),
        };

        let version_text =
            greeting
                .strip_prefix(GREETING_PREFIX)
                .ok_or_else(|| ProtocolError::ConnectionFailed {
                    received: greeting.clone(),
                })?;
        let actual: Version =
            version_text
                .parse()
                .map_err(|_| ProtocolError::ConnectionFailed {
                    received: greeting.clone(),
                })?;

        let expected = Version::driver();
        if expected.is_compatible(actual) {
            debug!(%actual, "handshake complete");
        } else {
            warn!(%expected, %actual, "firmware version mismatch");
            self.mismatch = Some(actual);
        }
        self.firmware = Some(actual);

        // Drop whatever else arrived during the reboot, give the registers
        // their settle window, then switch to the short operating timeout.
        self.clear_input()?;
        thread::sleep(SETTLE_DELAY);
        self.set_timeout(READ_TIMEOUT)?;
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Version the firmware reported in its greeting.
    pub fn firmware_version(&self) -> Option<Version> {
        self.firmware
    }

    /// The version mismatch recorded during the handshake, if any, as the
    /// typed error for callers that want to treat it as fatal.
    pub fn version_mismatch(&self) -> Option<ProtocolError> {
        self.mismatch.map(|actual| ProtocolError::VersionMismatch {
            expected: Version::driver(),
            actual,
        })
    }

    fn link_mut(&mut self) -> Result<&mut Box<dyn SerialLink>, ProtocolError> {
        self.link.as_mut().ok_or(ProtocolError::NotConnected)
    }

    /// Blocking write of the exact byte sequence. Callers pass fully framed
    /// bytes; nothing is added here.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.link_mut()?.write_all(bytes).map_err(map_io)
    }

    /// Blocking read of exactly `buf.len()` bytes.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ProtocolError> {
        self.link_mut()?.read_exact(buf).map_err(map_io)
    }

    /// Blocking read of one line, with the trailing delimiter and
    /// whitespace stripped. Used for the greeting and acknowledgments.
    pub fn read_line(&mut self) -> Result<String, ProtocolError> {
        let link = self.link_mut()?;
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            link.read_exact(&mut byte).map_err(map_io)?;
            if byte[0] == b'\n' {
                break;
            }
            line.push(byte[0]);
            if line.len() > MAX_LINE_LEN {
                return Err(ProtocolError::SerialError(format!(
                    "no line terminator within {} bytes",
                    MAX_LINE_LEN
                )));
            }
        }
        Ok(String::from_utf8_lossy(&line).trim_end().to_string())
    }

    /// Read one acknowledgment line; anything but "OK" is a device error
    /// carrying the reply text.
    pub fn read_ack(&mut self) -> Result<(), ProtocolError> {
        let reply = self.read_line()?;
        if reply == ACK {
            Ok(())
        } else {
            Err(ProtocolError::SyncDevice { reply })
        }
    }

    /// Acknowledged exchange: reset pending input, write the block, then
    /// wait for the "OK" line.
    pub fn send_with_ack(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.clear_input()?;
        self.write_all(bytes)?;
        self.read_ack()
    }

    /// Discard stale input so bytes from a previous exchange are never
    /// misread as the current reply.
    pub fn clear_input(&mut self) -> Result<(), ProtocolError> {
        self.link_mut()?.clear_input().map_err(map_io)
    }

    /// Change the timeout applied to subsequent blocking reads.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), ProtocolError> {
        self.link_mut()?.set_timeout(timeout).map_err(map_io)
    }

    /// Release the serial link. Idempotent; also runs on drop.
    pub fn close(&mut self) {
        if self.link.take().is_some() {
            debug!("serial link closed");
        }
        self.state = ConnectionState::Closed;
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}

fn map_io(err: io::Error) -> ProtocolError {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ProtocolError::Timeout,
        _ => ProtocolError::Io(err),
    }
}
