//! Handshake and version negotiation against a scripted link.

mod common;

use common::{init_tracing, MockLink};
use syncbox_core::prelude::*;
use syncbox_core::protocol::{BOOT_TIMEOUT, READ_TIMEOUT};
use syncbox_core::registers::atmega328p;

fn open(link: &MockLink) -> Result<SyncDevice, ProtocolError> {
    init_tracing();
    SyncDevice::from_link(Box::new(link.clone()), atmega328p::BANK)
}

#[test]
fn valid_greeting_yields_ready_device() {
    let link = MockLink::with_greeting();
    let device = open(&link).unwrap();

    assert_eq!(device.state(), ConnectionState::Ready);
    assert_eq!(device.firmware_version(), Some(Version::driver()));
    assert!(device.version_mismatch().is_none());
    // Nothing is written during the handshake; stale input is dropped once.
    assert!(link.written().is_empty());
    assert!(link.clears() >= 1);
}

#[test]
fn handshake_lowers_the_timeout_after_the_greeting() {
    let link = MockLink::with_greeting();
    let _device = open(&link).unwrap();

    assert_eq!(link.timeouts(), vec![BOOT_TIMEOUT, READ_TIMEOUT]);
}

#[test]
fn patch_difference_is_ignored() {
    let mut expected = Version::driver();
    expected.patch += 7;

    let link = MockLink::new();
    link.queue_greeting(&expected.to_string());
    let device = open(&link).unwrap();

    assert!(device.version_mismatch().is_none());
    assert_eq!(device.firmware_version(), Some(expected));
}

#[test]
fn minor_mismatch_warns_but_stays_connected() {
    let mut reported = Version::driver();
    reported.minor += 1;

    let link = MockLink::new();
    link.queue_greeting(&reported.to_string());
    let device = open(&link).unwrap();

    assert_eq!(device.state(), ConnectionState::Ready);
    match device.version_mismatch() {
        Some(ProtocolError::VersionMismatch { expected, actual }) => {
            assert_eq!(expected, Version::driver());
            assert_eq!(actual, reported);
        }
        other => panic!("expected VersionMismatch, got {:?}", other),
    }
}

#[test]
fn major_mismatch_warns_but_stays_connected() {
    let mut reported = Version::driver();
    reported.major += 1;

    let link = MockLink::new();
    link.queue_greeting(&reported.to_string());
    let device = open(&link).unwrap();

    assert!(matches!(
        device.version_mismatch(),
        Some(ProtocolError::VersionMismatch { .. })
    ));
}

#[test]
fn foreign_greeting_is_a_connection_failure() {
    let link = MockLink::new();
    link.queue_line("Bootloader v2.1");

    match open(&link) {
        Err(ProtocolError::ConnectionFailed { received }) => {
            assert_eq!(received, "Bootloader v2.1");
        }
        other => panic!("expected ConnectionFailed, got {:?}", other.err()),
    }
}

#[test]
fn unparseable_version_is_a_connection_failure() {
    let link = MockLink::new();
    link.queue_greeting("banana");

    assert!(matches!(
        open(&link),
        Err(ProtocolError::ConnectionFailed { .. })
    ));
}

#[test]
fn absent_greeting_is_a_connection_failure() {
    let link = MockLink::new();

    match open(&link) {
        Err(ProtocolError::ConnectionFailed { received }) => assert!(received.is_empty()),
        other => panic!("expected ConnectionFailed, got {:?}", other.err()),
    }
}

#[test]
fn greeting_with_crlf_terminator_is_accepted() {
    let link = MockLink::new();
    link.queue(
        format!(
            "{}{}\r\n",
            syncbox_core::protocol::GREETING_PREFIX,
            Version::driver()
        )
        .as_bytes(),
    );

    let device = open(&link).unwrap();
    assert_eq!(device.firmware_version(), Some(Version::driver()));
}
