//! File sink: append-only data log with reopen-if-missing semantics
//!
//! The target file may be rotated or removed externally between writes; the
//! sink checks for that before each write and reopens (creating the file)
//! when the path has gone missing. Each write is flushed so a rotated-away
//! handle never holds buffered lines.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::error::Result;
use crate::sink::{Envelope, Sink};

/// Append-only data log sink
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
}

impl FileSink {
    /// Create the sink; the file itself is opened lazily on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    fn ensure_open(&mut self) -> Result<&mut File> {
        if self.file.is_none() || !self.path.exists() {
            if self.file.take().is_some() {
                tracing::info!(path = %self.path.display(), "data log rotated, reopening");
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.file = Some(file);
        }
        // Just set above when it was None
        Ok(self.file.as_mut().expect("file opened"))
    }
}

impl Sink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn write(&mut self, envelope: &Envelope) -> Result<()> {
        let line = envelope.to_line();
        let file = self.ensure_open()?;
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }
}
