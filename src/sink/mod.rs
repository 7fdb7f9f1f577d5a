//! Sink fan-out
//!
//! Every successfully decoded reading is wrapped once in an [`Envelope`]
//! and handed unchanged to each enabled sink. A failing sink is logged and
//! isolated; it never prevents delivery to the other sinks and never stops
//! the decode loop.
//!
//! # Sinks
//!
//! - [`ConsoleSink`] - one JSON line per reading on stdout
//! - [`FileSink`] - append-only data log, tolerates external rotation
//! - [`UdpPublisher`] - pub/sub bus, `topic + NUL + JSON` datagrams
//! - [`database`] - snapshot persistence (interval-driven, not per record)

pub mod console;
pub mod database;
pub mod file;
pub mod pubsub;

pub use console::ConsoleSink;
pub use database::{SnapshotStore, SqliteStore};
pub use file::FileSink;
pub use pubsub::UdpPublisher;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::protocol::types::{compass_point, Reading};

/// Sink-facing wrapper around one decoded reading
///
/// Constructed once per successful decode; the same envelope goes to every
/// enabled sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Record type name, doubles as the pub/sub topic
    pub topic: String,
    /// Decode time, UTC
    pub timestamp: DateTime<Utc>,
    /// Decoded fields in wire order
    pub fields: Map<String, Value>,
    /// `<device-id>` or `<device-id>.<sensorIndex>` for multi-sensor types
    pub source: String,
}

impl Envelope {
    /// Wrap a reading for dispatch
    pub fn new(device_id: &str, reading: &Reading, timestamp: DateTime<Utc>) -> Self {
        let source = if reading.has_sensor_index() {
            format!("{}.{}", device_id, reading.sensor_index())
        } else {
            device_id.to_string()
        };
        Self {
            topic: reading.record_type().topic().to_string(),
            timestamp,
            fields: reading_fields(reading),
            source,
        }
    }

    /// UTC timestamp rendered to second precision plus six microsecond
    /// digits, e.g. `2026-08-29T13:45:07.000123`
    pub fn timestamp_repr(&self) -> String {
        self.timestamp.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }

    /// The full wire object: topic, timestamp, decoded fields, source
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("topic".to_string(), Value::String(self.topic.clone()));
        map.insert(
            "timestamp".to_string(),
            Value::String(self.timestamp_repr()),
        );
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        map.insert("source".to_string(), Value::String(self.source.clone()));
        Value::Object(map)
    }

    /// One-line JSON body for line-oriented sinks
    pub fn to_line(&self) -> String {
        self.to_json().to_string()
    }
}

/// Decoded field map for one reading, in wire order
fn reading_fields(reading: &Reading) -> Map<String, Value> {
    let mut map = Map::new();
    let mut put = |key: &str, value: Value| {
        map.insert(key.to_string(), value);
    };
    match reading {
        Reading::Rain {
            power,
            rate,
            hour_mm,
            day_mm,
            total_mm,
            since,
            ..
        } => {
            put("power", (*power).into());
            put("rate", (*rate).into());
            put("hour_total", f32_value(*hour_mm));
            put("day_total", f32_value(*day_mm));
            put("all_total", f32_value(*total_mm));
            put("since", Value::String(since.to_string()));
        }
        Reading::TempHumidity {
            comfort,
            trend,
            celsius,
            humidity,
            dew_point,
            ..
        } => {
            put("comfort", (*comfort).into());
            put("trend", trend.as_i8().into());
            put("temp", f32_value(*celsius));
            put("humidity", (*humidity).into());
            put("dewpoint", f32_value(*dew_point));
        }
        Reading::Water { celsius, .. } => {
            put("temp", f32_value(*celsius));
        }
        Reading::Pressure {
            pressure,
            forecast,
            alt_pressure,
            alt_forecast,
        } => {
            put("pressure", (*pressure).into());
            put("forecast", (*forecast).into());
            put("altpressure", (*alt_pressure).into());
            put("altforecast", (*alt_forecast).into());
        }
        // No decodable payload in this protocol revision
        Reading::Uv => {}
        Reading::Wind {
            direction,
            power,
            speed,
            avg_speed,
        } => {
            put("power", (*power).into());
            put("dir", Value::String(compass_point(*direction).to_string()));
            put("speed", f32_value(*speed));
            put("avgspeed", f32_value(*avg_speed));
        }
        Reading::Clock {
            powered,
            battery,
            rf,
            level,
            at,
        } => {
            put("at", Value::String(at.to_string()));
            put("powered", (*powered as u8).into());
            put("battery", (*battery as u8).into());
            put("rf", (*rf as u8).into());
            put("level", (*level as u8).into());
        }
    }
    map
}

fn f32_value(value: f32) -> Value {
    serde_json::Number::from_f64(value as f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// One consumer of decoded envelopes
pub trait Sink: Send {
    /// Short name used in failure logs
    fn name(&self) -> &'static str;

    /// Deliver one envelope
    fn write(&mut self, envelope: &Envelope) -> Result<()>;
}

/// The set of enabled sinks
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn Sink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Deliver the envelope to every sink, isolating per-sink failures
    pub fn dispatch(&mut self, envelope: &Envelope) {
        for sink in &mut self.sinks {
            if let Err(err) = sink.write(envelope) {
                tracing::warn!(sink = sink.name(), error = %err, "sink write failed");
            }
        }
    }
}
