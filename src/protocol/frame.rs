//! Frame synchronization, record assembly, and checksum verification
//!
//! The report stream carries no explicit record boundaries. The
//! [`FrameReader`] locates records with a two-phase marker scan, reads the
//! type-dependent fixed length, and verifies the trailing 16-bit additive
//! checksum. Corrupted or unknown records are an ordinary streaming
//! condition: they are logged, discarded, and the scan restarts on the next
//! call, which makes the reader self-healing without an explicit error
//! state.
//!
//! The transport ready acknowledgment is sent after every record attempt,
//! success or failure, so the console keeps streaming.

use thiserror::Error;

use crate::error::Result;
use crate::protocol::stream::ByteStream;
use crate::protocol::types::RecordType;

/// Inter-record marker/padding byte
pub const SYNC_MARKER: u8 = 0xff;

/// Non-fatal record-level conditions, recovered by resynchronizing
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Type code not in the record length table
    #[error("unknown record type 0x{0:02x}")]
    UnknownType(u8),

    /// Stored checksum does not match the computed sum
    #[error("bad checksum: stored {stored}, computed {computed}")]
    Checksum { stored: u16, computed: u16 },
}

/// One complete, checksum-verified record
///
/// Layout: `[flags, type, payload…, ck_lo, ck_hi]`. Built by the frame
/// reader and handed to the field decoders for one decode cycle; never
/// retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    record_type: RecordType,
    bytes: Vec<u8>,
}

impl RawRecord {
    /// The decoded type code, already validated against the length table
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// Full record bytes including flags, type, and checksum
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Sum of all bytes before the checksum field, as an unsigned 16-bit value
///
/// The widest record is 17 bytes, so the sum cannot exceed 15 * 255 and
/// never wraps 16 bits.
pub fn compute_checksum(record: &[u8]) -> u16 {
    record[..record.len() - 2]
        .iter()
        .fold(0u16, |sum, &b| sum.wrapping_add(b as u16))
}

/// Verify the little-endian 16-bit checksum in the record's last two bytes
pub fn verify_checksum(record: &[u8]) -> std::result::Result<(), FrameError> {
    let len = record.len();
    let stored = record[len - 2] as u16 | (record[len - 1] as u16) << 8;
    let computed = compute_checksum(record);
    if stored == computed {
        Ok(())
    } else {
        Err(FrameError::Checksum { stored, computed })
    }
}

/// Reads synchronized, verified records from a byte stream
pub struct FrameReader {
    stream: ByteStream,
}

impl FrameReader {
    pub fn new(stream: ByteStream) -> Self {
        Self { stream }
    }

    /// Two-phase scan: skip to the first 0xFF marker, then past the marker
    /// run, returning the first non-marker byte as the record's flags byte
    fn synchronize(&mut self) -> Result<u8> {
        let mut byte = self.stream.next_byte()?;
        while byte != SYNC_MARKER {
            byte = self.stream.next_byte()?;
        }
        while byte == SYNC_MARKER {
            byte = self.stream.next_byte()?;
        }
        Ok(byte)
    }

    /// Read the next record attempt from the stream
    ///
    /// Returns `Ok(Some(record))` for a verified record, `Ok(None)` when a
    /// record was abandoned (unknown type or checksum mismatch, already
    /// logged), and `Err` only for fatal transport failures. The ready
    /// acknowledgment is sent on every non-fatal path.
    pub fn next_record(&mut self) -> Result<Option<RawRecord>> {
        let flags = self.synchronize()?;
        let type_code = self.stream.next_byte()?;

        let Some(record_type) = RecordType::from_code(type_code) else {
            tracing::warn!(
                error = %FrameError::UnknownType(type_code),
                "abandoning record, resynchronizing"
            );
            self.stream.send_ready()?;
            return Ok(None);
        };

        let len = record_type.record_len();
        let mut bytes = Vec::with_capacity(len);
        bytes.push(flags);
        bytes.push(type_code);
        for _ in 2..len {
            bytes.push(self.stream.next_byte()?);
        }

        let outcome = match verify_checksum(&bytes) {
            Ok(()) => Some(RawRecord { record_type, bytes }),
            Err(err) => {
                tracing::warn!(
                    record_type = record_type.topic(),
                    error = %err,
                    "discarding record, resynchronizing"
                );
                None
            }
        };

        self.stream.send_ready()?;
        Ok(outcome)
    }

    /// Release the underlying transport
    pub fn close(&mut self) {
        self.stream.close();
    }
}
