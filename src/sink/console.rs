//! Console sink: one envelope JSON line per reading on stdout

use std::io::Write;

use crate::error::Result;
use crate::sink::{Envelope, Sink};

/// Line-per-reading stdout sink
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn write(&mut self, envelope: &Envelope) -> Result<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", envelope.to_line())?;
        Ok(())
    }
}
