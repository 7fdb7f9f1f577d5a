//! Worker threads
//!
//! Two long-running activities share the aggregate state store:
//!
//! - [`DecodeWorker`] - the single decode loop: synchronize, read a record,
//!   decode it, update the state table, fan the envelope out to the sinks.
//!   It blocks only on the transport read and runs every record attempt to
//!   completion before checking the running flag again.
//! - [`SnapshotWorker`] - wakes on a fixed interval, takes a state
//!   snapshot, and hands it to the snapshot store.
//!
//! Both stop when the shared running flag is cleared. In-flight work is
//! abandoned, not drained; every record is self-contained and idempotent to
//! reprocess after a restart.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use crossbeam_channel::{tick, RecvTimeoutError};

use crate::error::Result;
use crate::protocol::{decode, ByteStream, FrameReader};
use crate::sink::{Envelope, SinkSet, SnapshotStore};
use crate::state::SharedState;
use crate::transport::ReportSource;

/// How often a blocked snapshot worker rechecks the running flag
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// The decode loop
pub struct DecodeWorker {
    frames: FrameReader,
    state: SharedState,
    sinks: SinkSet,
    device_id: String,
    running: Arc<AtomicBool>,
}

impl DecodeWorker {
    pub fn new(
        source: Box<dyn ReportSource>,
        state: SharedState,
        sinks: SinkSet,
        device_id: String,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            frames: FrameReader::new(ByteStream::new(source)),
            state,
            sinks,
            device_id,
            running,
        }
    }

    /// Run until the running flag clears or the transport fails
    ///
    /// Corrupted and unknown-type records are already logged and skipped
    /// inside the frame reader; only transport failures surface here, and
    /// they are fatal.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("decode worker started");

        while self.running.load(Ordering::SeqCst) {
            match self.frames.next_record() {
                Ok(Some(record)) => {
                    let reading = decode(&record);
                    tracing::debug!(
                        topic = reading.record_type().topic(),
                        sensor = reading.sensor_index(),
                        "decoded record"
                    );
                    let envelope = Envelope::new(&self.device_id, &reading, Utc::now());
                    self.state.update(reading);
                    self.sinks.dispatch(&envelope);
                }
                Ok(None) => {
                    // Abandoned record; the next pass resynchronizes
                }
                Err(err) => {
                    tracing::error!(error = %err, "transport failure, stopping decode loop");
                    self.running.store(false, Ordering::SeqCst);
                    self.frames.close();
                    return Err(err);
                }
            }
        }

        self.frames.close();
        tracing::info!("decode worker stopped");
        Ok(())
    }
}

/// The periodic snapshot writer
pub struct SnapshotWorker {
    state: SharedState,
    store: Box<dyn SnapshotStore>,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl SnapshotWorker {
    pub fn new(
        state: SharedState,
        store: Box<dyn SnapshotStore>,
        interval: Duration,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            state,
            store,
            interval,
            running,
        }
    }

    /// Persist a snapshot every interval until the running flag clears
    ///
    /// Store failures are logged and the cycle is retried on the next tick;
    /// an empty table (nothing observed yet) writes nothing.
    pub fn run(&mut self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "snapshot worker started");
        let ticker = tick(self.interval);

        while self.running.load(Ordering::SeqCst) {
            match ticker.recv_timeout(SHUTDOWN_POLL) {
                Ok(_) => {
                    let snapshot = self.state.snapshot();
                    if snapshot.is_empty() {
                        continue;
                    }
                    if let Err(err) = self.store.persist(Utc::now(), &snapshot) {
                        tracing::warn!(error = %err, "snapshot persist failed");
                    } else {
                        tracing::debug!(
                            observed = snapshot.observed_count(),
                            "snapshot persisted"
                        );
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        tracing::info!("snapshot worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Snapshot, StateStore};
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    struct CountingStore(Arc<Mutex<Vec<usize>>>);

    impl SnapshotStore for CountingStore {
        fn persist(&mut self, _: DateTime<Utc>, snapshot: &Snapshot) -> Result<()> {
            self.0.lock().unwrap().push(snapshot.observed_count());
            Ok(())
        }
    }

    #[test]
    fn test_snapshot_worker_persists_on_interval_and_stops() {
        let state = StateStore::new();
        state.update(crate::protocol::Reading::Uv);
        let persisted = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicBool::new(true));

        let mut worker = SnapshotWorker::new(
            Arc::clone(&state),
            Box::new(CountingStore(Arc::clone(&persisted))),
            Duration::from_millis(50),
            Arc::clone(&running),
        );
        let handle = std::thread::spawn(move || worker.run());

        std::thread::sleep(Duration::from_millis(300));
        running.store(false, Ordering::SeqCst);
        handle.join().unwrap();

        let counts = persisted.lock().unwrap();
        assert!(!counts.is_empty(), "should have persisted at least once");
        assert!(counts.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_snapshot_worker_skips_empty_table() {
        let state = StateStore::new();
        let persisted = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicBool::new(true));

        let mut worker = SnapshotWorker::new(
            Arc::clone(&state),
            Box::new(CountingStore(Arc::clone(&persisted))),
            Duration::from_millis(20),
            Arc::clone(&running),
        );
        let handle = std::thread::spawn(move || worker.run());

        std::thread::sleep(Duration::from_millis(150));
        running.store(false, Ordering::SeqCst);
        handle.join().unwrap();

        assert!(persisted.lock().unwrap().is_empty());
    }
}
