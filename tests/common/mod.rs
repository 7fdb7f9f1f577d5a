//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

use std::sync::{Arc, Mutex};

use wmr100d::protocol::frame::compute_checksum;
use wmr100d::sink::{Envelope, Sink};
use wmr100d::{Result, WmrError};

/// Assemble a complete record: flags, type code, payload, valid checksum
pub fn build_record(flags: u8, type_code: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![flags, type_code];
    bytes.extend_from_slice(payload);
    bytes.push(0);
    bytes.push(0);
    let sum = compute_checksum(&bytes);
    let len = bytes.len();
    bytes[len - 2] = (sum & 0xff) as u8;
    bytes[len - 1] = (sum >> 8) as u8;
    bytes
}

/// A 12-byte temperature/humidity record: sensor 0, 5.0 C, 65 %
pub fn temp_record() -> Vec<u8> {
    build_record(
        0xd2,
        0x42,
        &[0x10, 0x32, 0x00, 0x41, 0x28, 0x00, 0x78, 0x78],
    )
}

/// An 8-byte pressure record
pub fn pressure_record() -> Vec<u8> {
    build_record(0x00, 0x46, &[0xf1, 0x23, 0xf5, 0x13])
}

/// An 11-byte wind record, direction N
pub fn wind_record() -> Vec<u8> {
    build_record(0x00, 0x48, &[0x00, 0x00, 0x19, 0xa0, 0x0c, 0x00, 0x00])
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Sink that records every envelope it receives
pub struct RecordingSink(pub Arc<Mutex<Vec<Envelope>>>);

impl RecordingSink {
    pub fn new() -> (Self, Arc<Mutex<Vec<Envelope>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        (Self(Arc::clone(&received)), received)
    }
}

impl Sink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn write(&mut self, envelope: &Envelope) -> Result<()> {
        self.0.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

/// Sink whose writes always fail
pub struct FailingSink;

impl Sink for FailingSink {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn write(&mut self, _: &Envelope) -> Result<()> {
        Err(WmrError::sink("failing", "always fails"))
    }
}
