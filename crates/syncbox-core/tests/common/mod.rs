//! Shared scripted serial link for the integration suites.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use syncbox_core::protocol::{SerialLink, Version, GREETING_PREFIX};

#[derive(Default)]
struct Shared {
    /// Bytes the "device" will produce, in order.
    input: Vec<u8>,
    /// Everything the driver wrote, in order.
    written: Vec<u8>,
    /// Number of input resets observed.
    clears: usize,
    /// Every timeout the driver configured, in order.
    timeouts: Vec<Duration>,
}

/// In-memory serial link: replies are queued up front, writes are recorded.
/// Clones share state, so a test can keep a handle after the transport takes
/// ownership of the link.
#[derive(Clone, Default)]
pub struct MockLink {
    shared: Arc<Mutex<Shared>>,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A link whose device already sent a greeting matching the driver.
    pub fn with_greeting() -> Self {
        let link = Self::new();
        link.queue_greeting(&Version::driver().to_string());
        link
    }

    /// Queue the boot greeting for an arbitrary firmware version string.
    pub fn queue_greeting(&self, version: &str) {
        self.queue_line(&format!("{}{}", GREETING_PREFIX, version));
    }

    /// Queue raw reply bytes.
    pub fn queue(&self, bytes: &[u8]) {
        self.shared.lock().unwrap().input.extend_from_slice(bytes);
    }

    /// Queue a newline-terminated reply line.
    pub fn queue_line(&self, line: &str) {
        self.queue(line.as_bytes());
        self.queue(b"\n");
    }

    /// Queue the "OK" acknowledgment line.
    pub fn queue_ok(&self) {
        self.queue_line("OK");
    }

    /// Everything written by the driver so far.
    pub fn written(&self) -> Vec<u8> {
        self.shared.lock().unwrap().written.clone()
    }

    /// Number of input resets the driver performed.
    pub fn clears(&self) -> usize {
        self.shared.lock().unwrap().clears
    }

    /// Timeouts the driver configured, in order.
    pub fn timeouts(&self) -> Vec<Duration> {
        self.shared.lock().unwrap().timeouts.clone()
    }
}

impl SerialLink for MockLink {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.shared.lock().unwrap().written.extend_from_slice(buf);
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut shared = self.shared.lock().unwrap();
        if shared.input.len() < buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "mock input exhausted",
            ));
        }
        let rest = shared.input.split_off(buf.len());
        buf.copy_from_slice(&shared.input);
        shared.input = rest;
        Ok(())
    }

    fn clear_input(&mut self) -> io::Result<()> {
        // Queued replies stand for bytes that arrive after the upcoming
        // request, so a reset only gets counted, not applied to the script.
        self.shared.lock().unwrap().clears += 1;
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.shared.lock().unwrap().timeouts.push(timeout);
        Ok(())
    }
}

/// Route test logs through tracing when RUST_LOG asks for them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Split captured wire bytes into fixed-length frames.
pub fn frames(bytes: &[u8]) -> Vec<&[u8]> {
    assert_eq!(
        bytes.len() % syncbox_core::protocol::FRAME_LEN,
        0,
        "captured bytes are not a whole number of frames"
    );
    bytes.chunks(syncbox_core::protocol::FRAME_LEN).collect()
}
