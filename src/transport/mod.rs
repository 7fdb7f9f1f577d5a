//! Report transport boundary
//!
//! This module defines the seam between the protocol engine and the USB
//! hardware: a [`ReportSource`] yields fixed-size low-level reports from the
//! station console and carries the "ready" acknowledgment back to it.
//! Implementations must be `Send` so the decode loop can run on its own
//! thread.
//!
//! Two implementations exist: [`HidReportSource`] for real hardware and
//! [`MockReportSource`] for scripted byte streams in tests.

pub mod hid;
pub mod mock;

pub use hid::HidReportSource;
pub use mock::MockReportSource;

use crate::error::Result;

/// Size of one raw transport unit from the device
pub const REPORT_SIZE: usize = 8;

/// Maximum usable payload bytes per report
///
/// Byte 0 of the raw unit is the payload length, leaving at most 7 bytes of
/// payload. The declared length is capped here defensively even if the
/// transport reports more.
pub const MAX_PAYLOAD: usize = REPORT_SIZE - 1;

/// One fixed-size low-level report from the device
///
/// Owned exclusively by the byte stream reader while it is being consumed,
/// then discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    buf: [u8; REPORT_SIZE],
}

impl Report {
    /// Wrap a raw 8-byte transport unit
    pub fn from_raw(buf: [u8; REPORT_SIZE]) -> Self {
        Self { buf }
    }

    /// Build a report from a payload slice (test and mock construction)
    ///
    /// Panics if `payload` exceeds [`MAX_PAYLOAD`]; scripted sources chunk
    /// their byte streams before calling this.
    pub fn from_payload(payload: &[u8]) -> Self {
        assert!(payload.len() <= MAX_PAYLOAD);
        let mut buf = [0u8; REPORT_SIZE];
        buf[0] = payload.len() as u8;
        buf[1..1 + payload.len()].copy_from_slice(payload);
        Self { buf }
    }

    /// The length byte as the transport declared it, uncapped
    pub fn declared_len(&self) -> usize {
        self.buf[0] as usize
    }

    /// Usable payload bytes, with the declared length capped at
    /// [`MAX_PAYLOAD`] so a lying length byte can never read past the
    /// fixed-size buffer
    pub fn payload(&self) -> &[u8] {
        let len = self.declared_len().min(MAX_PAYLOAD);
        &self.buf[1..1 + len]
    }
}

/// Source of raw reports from the station console
///
/// `read_report` blocks until the device produces a report; a transport
/// error is fatal and propagates out of the decode loop. `send_ready` is the
/// no-payload acknowledgment that keeps the device streaming; it is sent
/// after every record attempt, success or failure.
pub trait ReportSource: Send {
    /// Read the next fixed-size report, blocking on hardware I/O
    fn read_report(&mut self) -> Result<Report>;

    /// Send the transport-level ready/acknowledgment signal
    fn send_ready(&mut self) -> Result<()>;

    /// Release the underlying handle; further reads are undefined
    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_payload_respects_declared_len() {
        let report = Report::from_raw([3, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x11]);
        assert_eq!(report.payload(), &[0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn test_report_payload_caps_lying_length_byte() {
        let report = Report::from_raw([200, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(report.declared_len(), 200);
        assert_eq!(report.payload(), &[1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_report_zero_length_payload() {
        let report = Report::from_raw([0, 1, 2, 3, 4, 5, 6, 7]);
        assert!(report.payload().is_empty());
    }

    #[test]
    fn test_report_from_payload_roundtrip() {
        let report = Report::from_payload(&[0xff, 0xff, 0xd2]);
        assert_eq!(report.declared_len(), 3);
        assert_eq!(report.payload(), &[0xff, 0xff, 0xd2]);
    }
}
