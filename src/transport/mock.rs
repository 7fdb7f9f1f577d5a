//! Mock report source for testing
//!
//! Replays a scripted byte stream as fixed-size reports without real
//! hardware, mirroring how the console chunks record bytes arbitrarily
//! across report boundaries. Ready acknowledgments are counted through a
//! shared handle so tests can observe them after the source has moved into
//! the decode loop.
//!
//! Once the script is exhausted, `read_report` returns an IO error, which
//! the decode loop treats as a fatal transport failure. End-to-end tests
//! rely on this to terminate the loop.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Result, WmrError};
use crate::transport::{Report, ReportSource, MAX_PAYLOAD};

/// Scripted report source
#[derive(Debug, Default)]
pub struct MockReportSource {
    reports: VecDeque<Report>,
    ready_count: Arc<AtomicUsize>,
}

impl MockReportSource {
    /// Create an empty source; push bytes or reports before use
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a byte stream, chunked into maximal reports
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks(MAX_PAYLOAD) {
            self.reports.push_back(Report::from_payload(chunk));
        }
    }

    /// Append one raw report verbatim (for length-prefix edge cases)
    pub fn push_report(&mut self, report: Report) {
        self.reports.push_back(report);
    }

    /// Builder-style variant of [`push_bytes`](Self::push_bytes)
    pub fn with_bytes(mut self, bytes: &[u8]) -> Self {
        self.push_bytes(bytes);
        self
    }

    /// Handle for observing ready acknowledgments from the test side
    pub fn ready_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.ready_count)
    }

    /// Reports left in the script
    pub fn remaining(&self) -> usize {
        self.reports.len()
    }
}

impl ReportSource for MockReportSource {
    fn read_report(&mut self) -> Result<Report> {
        self.reports.pop_front().ok_or_else(|| {
            WmrError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "mock report script exhausted",
            ))
        })
    }

    fn send_ready(&mut self) -> Result<()> {
        self.ready_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
