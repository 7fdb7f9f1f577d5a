//! # wmr100d: WMR100 Weather Station Telemetry Daemon
//!
//! Decodes the Oregon Scientific WMR100/200 USB protocol and fans decoded
//! readings out to console, data-log, pub/sub, and database sinks. The
//! architecture separates the hardware transport from the protocol engine
//! behind a [`transport::ReportSource`] trait, so the decode loop runs
//! unchanged against real hardware or scripted test streams.
//!
//! ## Architecture
//!
//! - **Transport**: fixed-size HID reports from the console via hidapi,
//!   with the init/ready handshake and per-record acknowledgment
//! - **Protocol**: byte stream reassembly, 0xFF marker resynchronization,
//!   additive 16-bit checksum, and pure per-type field decoders
//! - **State**: mutex-guarded last-reading table shared with a periodic
//!   snapshot writer
//! - **Sinks**: envelope fan-out with per-sink failure isolation
//!
//! ## Example
//!
//! ```ignore
//! use wmr100d::{
//!     config::Config,
//!     sink::{ConsoleSink, SinkSet},
//!     state::StateStore,
//!     transport::HidReportSource,
//!     worker::DecodeWorker,
//! };
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! fn main() -> wmr100d::Result<()> {
//!     let config = Config::load_or_default("wmr100d.toml")?;
//!     let source = HidReportSource::open(&config.device)?;
//!
//!     let mut sinks = SinkSet::new();
//!     sinks.push(Box::new(ConsoleSink::new()));
//!
//!     let running = Arc::new(AtomicBool::new(true));
//!     let mut worker = DecodeWorker::new(
//!         Box::new(source),
//!         StateStore::new(),
//!         sinks,
//!         config.device.device_id.clone(),
//!         running,
//!     );
//!     worker.run()
//! }
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod sink;
pub mod state;
pub mod transport;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, WmrError};
pub use protocol::{decode, FrameReader, RawRecord, Reading, RecordType, Trend};
pub use sink::{Envelope, Sink, SinkSet};
pub use state::{SharedState, Snapshot, StateStore};
pub use transport::{Report, ReportSource};
pub use worker::{DecodeWorker, SnapshotWorker};
