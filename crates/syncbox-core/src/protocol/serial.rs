//! Serial port handling
//!
//! Low-level serial access behind the [`SerialLink`] seam, so the transport
//! can be driven by a real port or an in-memory double.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::io;
use std::time::Duration;

use super::ProtocolError;

/// Blocking byte link to the device.
///
/// Implemented for [`serialport`] ports; tests substitute a scripted
/// in-memory link. All reads honor the currently configured timeout.
pub trait SerialLink: Send {
    /// Write the exact byte sequence; no framing is added here.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Read exactly `buf.len()` bytes or fail with a timeout error.
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Discard bytes already received but not yet read.
    fn clear_input(&mut self) -> io::Result<()>;

    /// Set the timeout applied to subsequent blocking reads.
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

impl SerialLink for Box<dyn SerialPort> {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        io::Write::write_all(self, buf)?;
        io::Write::flush(self)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        io::Read::read_exact(self, buf)
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::from)
    }

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        SerialPort::set_timeout(self.as_mut(), timeout).map_err(io::Error::from)
    }
}

/// Information about an available serial port.
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyACM0" or "COM3").
    pub name: String,

    /// USB vendor ID (if USB device).
    pub vid: Option<u16>,

    /// USB product ID (if USB device).
    pub pid: Option<u16>,

    /// Product name (if available).
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (vid, pid, product) = match info.port_type {
            SerialPortType::UsbPort(usb) => (Some(usb.vid), Some(usb.pid), usb.product),
            _ => (None, None, None),
        };
        Self {
            name: info.port_name,
            vid,
            pid,
            product,
        }
    }
}

/// Sort key so ttyACM* ports come first (the device enumerates as ACM),
/// then ttyUSB*, then everything else by name.
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    if let Some(rest) = basename.strip_prefix("ttyACM") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (0, num, basename.to_string());
    }
    if let Some(rest) = basename.strip_prefix("ttyUSB") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (1, num, basename.to_string());
    }
    (2, 0, basename.to_string())
}

/// List available serial ports in deterministic order.
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by_key(|p| port_sort_key(&p.name));
    ports
}

/// Open and configure a serial port for the sync device.
///
/// The initial timeout is short; the transport raises it for the boot
/// greeting immediately after.
pub fn open_port(name: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>, ProtocolError> {
    let mut port = serialport::new(name, baud_rate)
        .timeout(Duration::from_millis(100))
        .open()
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    configure_port(port.as_mut())?;
    Ok(port)
}

/// Apply the 8N1 configuration the firmware's UART expects.
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.set_data_bits(serialport::DataBits::Eight)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_parity(serialport::Parity::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_stop_bits(serialport::StopBits::One)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_flow_control(serialport::FlowControl::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;

    // Opening the port toggles DTR, which is what resets the board; keep it
    // asserted afterwards so the bootloader does not retrigger mid-session.
    if let Err(e) = port.write_data_terminal_ready(true) {
        tracing::warn!(error = %e, "failed to assert DTR, continuing");
    }

    Ok(())
}
