//! WMR100 protocol engine
//!
//! Turns the raw report stream into typed readings in three layers:
//!
//! - [`stream`] - byte-at-a-time reader over concatenated report payloads
//! - [`frame`] - marker resynchronization, record assembly, checksum
//! - [`decode`] - pure per-type field decoders
//!
//! [`types`] holds the record type table and the [`Reading`] domain model
//! shared with the state store and the sinks.

pub mod decode;
pub mod frame;
pub mod stream;
pub mod types;

pub use decode::decode;
pub use frame::{FrameError, FrameReader, RawRecord, SYNC_MARKER};
pub use stream::ByteStream;
pub use types::{compass_point, DeviceTime, Reading, RecordType, Trend, MAX_SENSORS};
