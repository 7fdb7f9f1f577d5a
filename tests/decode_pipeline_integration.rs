//! Integration tests for the full decode pipeline
//!
//! These tests drive the decode worker with a scripted report source and
//! validate the complete flow: resynchronization, record assembly, checksum
//! rejection, state updates, and sink fan-out. The worker stops when the
//! script runs out, which surfaces as a transport failure by design.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::{pressure_record, temp_record, wind_record, FailingSink, RecordingSink};
use wmr100d::protocol::SYNC_MARKER;
use wmr100d::sink::SinkSet;
use wmr100d::state::StateStore;
use wmr100d::transport::MockReportSource;
use wmr100d::worker::DecodeWorker;
use wmr100d::{Reading, RecordType};

/// Join records into one stream with marker padding between them
fn stream_of(records: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for record in records {
        bytes.push(SYNC_MARKER);
        bytes.push(SYNC_MARKER);
        bytes.extend_from_slice(record);
    }
    bytes
}

/// Run the decode worker over scripted bytes until the script is exhausted
fn run_pipeline(
    bytes: &[u8],
    sinks: SinkSet,
) -> (wmr100d::SharedState, usize) {
    let source = MockReportSource::new().with_bytes(bytes);
    let readys = source.ready_handle();
    let state = StateStore::new();
    let running = Arc::new(AtomicBool::new(true));

    let mut worker = DecodeWorker::new(
        Box::new(source),
        Arc::clone(&state),
        sinks,
        "wmr100".to_string(),
        running,
    );
    let handle = std::thread::spawn(move || worker.run());
    // The worker exits with a transport error once the script ends
    let result = handle.join().unwrap();
    assert!(result.is_err());

    (state, readys.load(Ordering::SeqCst))
}

#[test]
fn test_valid_records_flow_to_sinks_and_state() {
    let (recording, received) = RecordingSink::new();
    let mut sinks = SinkSet::new();
    sinks.push(Box::new(recording));

    let (state, readys) = run_pipeline(&stream_of(&[temp_record(), pressure_record()]), sinks);

    let envelopes = received.lock().unwrap();
    assert_eq!(envelopes.len(), 2);
    assert_eq!(envelopes[0].topic, "temp");
    assert_eq!(envelopes[0].source, "wmr100.0");
    assert_eq!(envelopes[1].topic, "pressure");
    assert_eq!(envelopes[1].source, "wmr100");
    assert_eq!(readys, 2);

    let snapshot = state.snapshot();
    match snapshot.get(RecordType::TempHumidity, 0) {
        Some(Reading::TempHumidity {
            celsius, humidity, ..
        }) => {
            assert!((celsius - 5.0).abs() < 1e-4);
            assert_eq!(*humidity, 65);
        }
        other => panic!("expected temp reading, got {other:?}"),
    }
    assert!(snapshot.get(RecordType::Pressure, 0).is_some());
}

#[test]
fn test_corrupted_record_is_skipped_without_derailing_stream() {
    let mut corrupted = wind_record();
    // Flip one checksum byte
    let len = corrupted.len();
    corrupted[len - 1] ^= 0xff;

    let (recording, received) = RecordingSink::new();
    let mut sinks = SinkSet::new();
    sinks.push(Box::new(recording));

    let (state, readys) = run_pipeline(
        &stream_of(&[temp_record(), corrupted, pressure_record()]),
        sinks,
    );

    // The corrupt wind record produced no envelope and no state mutation
    let envelopes = received.lock().unwrap();
    let topics: Vec<&str> = envelopes.iter().map(|e| e.topic.as_str()).collect();
    assert_eq!(topics, vec!["temp", "pressure"]);
    assert!(state.snapshot().get(RecordType::Wind, 0).is_none());

    // All three attempts were acknowledged to keep the device streaming
    assert_eq!(readys, 3);
}

#[test]
fn test_unknown_record_type_is_skipped() {
    // Type 0x55 is not in the length table; the reader abandons it at the
    // type byte and resynchronizes on the next marker run
    let unknown = vec![0x00, 0x55];

    let (recording, received) = RecordingSink::new();
    let mut sinks = SinkSet::new();
    sinks.push(Box::new(recording));

    let (_, readys) = run_pipeline(&stream_of(&[unknown, wind_record()]), sinks);

    let envelopes = received.lock().unwrap();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].topic, "wind");
    assert_eq!(readys, 2);
}

#[test]
fn test_records_arbitrarily_split_across_reports() {
    // One byte per report exercises every report boundary
    let mut source = MockReportSource::new();
    for &b in &stream_of(&[temp_record()]) {
        source.push_bytes(&[b]);
    }
    let (recording, received) = RecordingSink::new();
    let mut sinks = SinkSet::new();
    sinks.push(Box::new(recording));

    let state = StateStore::new();
    let running = Arc::new(AtomicBool::new(true));
    let mut worker = DecodeWorker::new(
        Box::new(source),
        Arc::clone(&state),
        sinks,
        "wmr100".to_string(),
        running,
    );
    assert!(std::thread::spawn(move || worker.run()).join().unwrap().is_err());

    assert_eq!(received.lock().unwrap().len(), 1);
}

#[test]
fn test_failing_sink_does_not_block_second_sink() {
    let (recording, received) = RecordingSink::new();
    let mut sinks = SinkSet::new();
    sinks.push(Box::new(FailingSink));
    sinks.push(Box::new(recording));

    run_pipeline(&stream_of(&[temp_record(), pressure_record()]), sinks);

    // Both envelopes still reached the second sink
    assert_eq!(received.lock().unwrap().len(), 2);
}

#[test]
fn test_long_marker_runs_between_records() {
    let mut bytes = vec![SYNC_MARKER; 100];
    bytes.extend_from_slice(&temp_record());
    bytes.push(SYNC_MARKER);
    bytes.extend_from_slice(&pressure_record());

    let (recording, received) = RecordingSink::new();
    let mut sinks = SinkSet::new();
    sinks.push(Box::new(recording));

    run_pipeline(&bytes, sinks);
    assert_eq!(received.lock().unwrap().len(), 2);
}
