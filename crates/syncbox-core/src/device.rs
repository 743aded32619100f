//! Device facade
//!
//! [`SyncDevice`] binds a register table to the transport and exposes the
//! public surface: typed register access, the device-level acquisition and
//! shutter commands, and scoped transactions that batch writes into one
//! flush.

use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::protocol::{
    checked_u16, checked_u8, ms_to_ticks, ms_to_us, pack_bits, ConnectionState, Frame,
    FrameBuilder, Opcode, ProtocolError, SerialLink, StrobeParams, TransactionBuffer, Transport,
    TransportConfig, Version,
};
use crate::registers::{Register, RegisterBank, RegisterWidth};

/// Handle to one sync device.
///
/// Owns the serial transport exclusively; one logical caller per device.
/// Dropping the device closes the port.
pub struct SyncDevice {
    transport: Transport,
    bank: RegisterBank,
    txn: Option<TransactionBuffer>,
}

impl SyncDevice {
    /// Open a port at the default baud rate and perform the handshake.
    pub fn open(port: &str, bank: RegisterBank) -> Result<Self, ProtocolError> {
        Self::open_with(
            &TransportConfig {
                port_name: port.to_string(),
                ..TransportConfig::default()
            },
            bank,
        )
    }

    /// Open with explicit transport configuration.
    pub fn open_with(config: &TransportConfig, bank: RegisterBank) -> Result<Self, ProtocolError> {
        Ok(Self::from_transport(Transport::open(config)?, bank))
    }

    /// Drive the handshake over an already-open link (alternate byte
    /// carriers, test doubles).
    pub fn from_link(link: Box<dyn SerialLink>, bank: RegisterBank) -> Result<Self, ProtocolError> {
        Ok(Self::from_transport(Transport::from_link(link)?, bank))
    }

    fn from_transport(transport: Transport, bank: RegisterBank) -> Self {
        Self {
            transport,
            bank,
            txn: None,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// Version the firmware reported during the handshake.
    pub fn firmware_version(&self) -> Option<Version> {
        self.transport.firmware_version()
    }

    /// The handshake's version mismatch, if one was recorded. The
    /// connection stays usable; callers decide whether to continue.
    pub fn version_mismatch(&self) -> Option<ProtocolError> {
        self.transport.version_mismatch()
    }

    /// The register table this device was built with.
    pub fn registers(&self) -> RegisterBank {
        self.bank
    }

    /// Look up a register by name.
    pub fn register(&self, name: &str) -> Result<Register, ProtocolError> {
        self.bank
            .get(name)
            .ok_or_else(|| ProtocolError::UnknownRegister(name.to_string()))
    }

    // ---- register access ----

    /// Read a register, composing multi-byte values from single-byte reads
    /// (low byte first, then high).
    pub fn read_register(&mut self, register: Register) -> Result<u32, ProtocolError> {
        if self.txn.is_some() {
            return Err(ProtocolError::ReadInTransaction);
        }
        match register.width {
            RegisterWidth::U8 => self.read_byte_at(register.addr).map(u32::from),
            RegisterWidth::U16 => self.read_word_at(register.addr).map(u32::from),
            RegisterWidth::U32 => {
                let low = u32::from(self.read_word_at(register.addr)?);
                let high = u32::from(self.read_word_at(register.addr + 2)?);
                Ok(high << 16 | low)
            }
        }
    }

    /// Read a register looked up by name.
    pub fn read_named(&mut self, name: &str) -> Result<u32, ProtocolError> {
        let register = self.register(name)?;
        self.read_register(register)
    }

    /// Write a register, composing multi-byte values from single-byte
    /// writes. High bytes go first: firmware samples low-then-high, so the
    /// combined value is never observed half-updated.
    ///
    /// Fails with [`ProtocolError::ValueOutOfRange`] before any I/O if the
    /// value does not fit the register's width.
    pub fn write_register(&mut self, register: Register, value: u32) -> Result<(), ProtocolError> {
        match register.width {
            RegisterWidth::U8 => {
                let value = checked_u8(value)?;
                self.write_byte_at(register.addr, value)
            }
            RegisterWidth::U16 => {
                let value = checked_u16(value)?;
                self.write_word_at(register.addr, value)
            }
            RegisterWidth::U32 => {
                self.write_word_at(register.addr + 2, (value >> 16) as u16)?;
                self.write_word_at(register.addr, value as u16)
            }
        }
    }

    /// Write a register looked up by name.
    pub fn write_named(&mut self, name: &str, value: u32) -> Result<(), ProtocolError> {
        let register = self.register(name)?;
        self.write_register(register, value)
    }

    fn read_byte_at(&mut self, addr: u8) -> Result<u8, ProtocolError> {
        // Stale bytes from an earlier exchange must never be taken for this
        // reply, so pending input is reset right before the read cycle.
        self.transport.clear_input()?;
        let frame = FrameBuilder::new().u8(addr).build(Opcode::ReadRegister)?;
        self.transport.write_all(frame.as_bytes())?;
        let mut value = [0u8; 1];
        self.transport.read_exact(&mut value)?;
        Ok(value[0])
    }

    fn read_word_at(&mut self, addr: u8) -> Result<u16, ProtocolError> {
        let low = self.read_byte_at(addr)?;
        let high = self.read_byte_at(addr + 1)?;
        Ok(u16::from(high) << 8 | u16::from(low))
    }

    fn write_byte_at(&mut self, addr: u8, value: u8) -> Result<(), ProtocolError> {
        let frame = FrameBuilder::new()
            .u8(addr)
            .u8(value)
            .build(Opcode::WriteRegister)?;
        self.submit(&frame)
    }

    fn write_word_at(&mut self, addr: u8, value: u16) -> Result<(), ProtocolError> {
        self.write_byte_at(addr + 1, (value >> 8) as u8)?;
        self.write_byte_at(addr, value as u8)
    }

    /// Route a fire-and-forget frame to the wire, or to the open
    /// transaction buffer.
    fn submit(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        match &mut self.txn {
            Some(buffer) => buffer.push(frame),
            None => self.transport.write_all(frame.as_bytes()),
        }
    }

    /// Route an acknowledged command: immediate mode waits for the "OK"
    /// line; inside a transaction the single flush ack covers the batch.
    fn submit_command(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        match &mut self.txn {
            Some(buffer) => buffer.push(frame),
            None => self.transport.send_with_ack(frame.as_bytes()),
        }
    }

    // ---- device commands ----

    /// Set the delay between the fluidics trigger and the start of the
    /// timer. Negative delays fire the trigger before imaging starts.
    pub fn set_fluidics_delay(&mut self, delay_ms: f64) -> Result<(), ProtocolError> {
        let delay_us = ms_to_us(delay_ms)?;
        let frame = FrameBuilder::new()
            .i32_le(delay_us)
            .build(Opcode::FluidicsDelay)?;
        self.submit_command(&frame)
    }

    /// Configure and start the camera trigger in stroboscopic / ALEX /
    /// timelapse mode.
    pub fn start_stroboscopic_acquisition(
        &mut self,
        params: StrobeParams,
    ) -> Result<(), ProtocolError> {
        let exposure = ms_to_ticks(params.exposure_ms)?;
        let interframe = ms_to_ticks(params.interframe_ms)?;
        let frame = FrameBuilder::new()
            .u16_le(exposure)
            .u16_le(params.n_frames)
            .u16_le(interframe)
            .u16_le(params.timelapse_delay_ms)
            .build(Opcode::StartStrobe)?;
        debug!(
            exposure_ticks = exposure,
            n_frames = params.n_frames,
            "starting stroboscopic acquisition"
        );
        self.submit_command(&frame)
    }

    /// Configure and start the camera trigger in continuous mode.
    pub fn start_continuous_acquisition(
        &mut self,
        exposure_ms: f64,
        n_frames: u16,
    ) -> Result<(), ProtocolError> {
        let exposure = ms_to_ticks(exposure_ms)?;
        let frame = FrameBuilder::new()
            .u16_le(exposure)
            .u16_le(n_frames)
            .build(Opcode::StartContinuous)?;
        debug!(
            exposure_ticks = exposure,
            n_frames, "starting continuous acquisition"
        );
        self.submit_command(&frame)
    }

    /// Change the exposure of the camera trigger. Does not start or stop
    /// the trigger; a running trigger picks the new period up on the fly.
    pub fn set_exposure(&mut self, exposure_ms: f64) -> Result<(), ProtocolError> {
        let exposure = ms_to_ticks(exposure_ms)?;
        let frame = FrameBuilder::new()
            .u16_le(exposure)
            .build(Opcode::SetExposure)?;
        self.submit_command(&frame)
    }

    /// Stop a running camera trigger.
    pub fn stop(&mut self) -> Result<(), ProtocolError> {
        let frame = FrameBuilder::new().build(Opcode::Stop)?;
        self.submit_command(&frame)
    }

    /// Set the laser shutter pattern for the active and idle phases.
    ///
    /// Channels are listed in spectral order (cy2, cy3, cy5, cy7) and
    /// packed least-significant-bit first for the shutter port. When `idle`
    /// is omitted it becomes the complement of `active`.
    pub fn set_shutters(
        &mut self,
        active: &[bool],
        idle: Option<&[bool]>,
        alex: bool,
    ) -> Result<(), ProtocolError> {
        let active_mask = pack_bits(active, true);
        let idle_mask = match idle {
            Some(bits) => pack_bits(bits, true),
            None => !active_mask,
        };
        let frame = FrameBuilder::new()
            .u8(active_mask)
            .u8(idle_mask)
            .u8(u8::from(alex))
            .build(Opcode::SetShutters)?;
        self.submit_command(&frame)
    }

    // ---- transactions ----

    /// Begin a transaction: until the guard commits (or drops), writes are
    /// buffered instead of hitting the wire, then flushed as one block with
    /// a single acknowledgment. Transactions do not nest.
    pub fn transaction(&mut self) -> Transaction<'_> {
        if self.txn.is_none() {
            self.txn = Some(TransactionBuffer::new());
        }
        Transaction {
            device: self,
            committed: false,
        }
    }

    /// True while writes are being buffered.
    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    /// Flush the open transaction. The write sink reverts to immediate
    /// mode even if the flush itself fails.
    fn flush_transaction(&mut self) -> Result<(), ProtocolError> {
        let Some(buffer) = self.txn.take() else {
            return Ok(());
        };
        if buffer.is_empty() {
            return Ok(());
        }
        let bytes = buffer.into_bytes();
        debug!(len = bytes.len(), "flushing transaction");
        self.transport.send_with_ack(&bytes)
    }
}

/// Scoped transaction guard returned by [`SyncDevice::transaction`].
///
/// Every exit path flushes: [`commit`](Transaction::commit) surfaces the
/// result, dropping the guard flushes best-effort and logs a failure.
pub struct Transaction<'a> {
    device: &'a mut SyncDevice,
    committed: bool,
}

impl Transaction<'_> {
    /// Flush the buffered frames and wait for the device acknowledgment.
    pub fn commit(mut self) -> Result<(), ProtocolError> {
        self.committed = true;
        self.device.flush_transaction()
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(err) = self.device.flush_transaction() {
                warn!(error = %err, "transaction flush failed during drop");
            }
        }
    }
}

impl Deref for Transaction<'_> {
    type Target = SyncDevice;

    fn deref(&self) -> &SyncDevice {
        self.device
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut SyncDevice {
        self.device
    }
}
