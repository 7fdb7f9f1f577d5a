//! Byte stream reader over the report transport
//!
//! Exposes a single-byte-at-a-time view of the concatenated report
//! payloads, requesting a new report from the source whenever the current
//! one is exhausted. There is no error recovery at this layer: a transport
//! failure propagates to the decode loop as a fatal error.

use crate::error::Result;
use crate::transport::{Report, ReportSource};

/// Blocking byte reader over a [`ReportSource`]
pub struct ByteStream {
    source: Box<dyn ReportSource>,
    report: Report,
    pos: usize,
    remain: usize,
}

impl ByteStream {
    pub fn new(source: Box<dyn ReportSource>) -> Self {
        Self {
            source,
            report: Report::from_raw([0; 8]),
            pos: 0,
            remain: 0,
        }
    }

    /// Read the next payload byte, blocking on the source as needed
    ///
    /// Zero-length reports are consumed and skipped; the declared payload
    /// length is capped by [`Report::payload`] so a corrupt length byte can
    /// never run past the report buffer.
    pub fn next_byte(&mut self) -> Result<u8> {
        while self.remain == 0 {
            self.report = self.source.read_report()?;
            self.pos = 0;
            self.remain = self.report.payload().len();
        }
        let byte = self.report.payload()[self.pos];
        self.pos += 1;
        self.remain -= 1;
        Ok(byte)
    }

    /// Forward the ready acknowledgment to the underlying source
    pub fn send_ready(&mut self) -> Result<()> {
        self.source.send_ready()
    }

    /// Release the underlying transport handle
    pub fn close(&mut self) {
        self.source.close();
    }
}
