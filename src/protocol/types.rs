//! Typed domain model for the WMR100 protocol
//!
//! This module contains the closed set of record types the station emits,
//! the typed readings produced by the field decoders, and the small lookup
//! tables (record lengths, compass points, trend codes) the protocol fixes.
//!
//! # Main Types
//!
//! - [`RecordType`] - The seven known record type codes and their lengths
//! - [`Reading`] - One decoded sensor reading, tagged by record kind
//! - [`Trend`] - Signed tri-state trend indicator (flat/rising/falling)
//! - [`DeviceTime`] - Date/time stamp assembled from record payload bytes

use serde::{Deserialize, Serialize};

/// Maximum number of remote sensors per record type
///
/// Sensor indices come from a 4-bit nibble, so 16 slots cover the full
/// addressable range.
pub const MAX_SENSORS: usize = 16;

/// 16-point compass rose indexed by the wind direction nibble
///
/// Kept byte-for-byte as the station firmware's table, including the
/// final "NWN" point.
pub const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NWN",
];

/// The known record types, tagged with their wire type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// Rain gauge (code 0x41)
    Rain,
    /// Indoor/outdoor temperature and humidity (code 0x42)
    TempHumidity,
    /// Water/pool temperature probe (code 0x44)
    Water,
    /// Barometric pressure and forecast (code 0x46)
    Pressure,
    /// UV index sensor (code 0x47)
    Uv,
    /// Anemometer (code 0x48)
    Wind,
    /// Console clock and radio status (code 0x60)
    Clock,
}

impl RecordType {
    /// All record types, in wire-code order
    pub const ALL: [RecordType; 7] = [
        RecordType::Rain,
        RecordType::TempHumidity,
        RecordType::Water,
        RecordType::Pressure,
        RecordType::Uv,
        RecordType::Wind,
        RecordType::Clock,
    ];

    /// Look up a record type from its wire code
    ///
    /// Unknown codes are a recognized, non-fatal condition; the caller
    /// abandons the record and resynchronizes.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x41 => Some(RecordType::Rain),
            0x42 => Some(RecordType::TempHumidity),
            0x44 => Some(RecordType::Water),
            0x46 => Some(RecordType::Pressure),
            0x47 => Some(RecordType::Uv),
            0x48 => Some(RecordType::Wind),
            0x60 => Some(RecordType::Clock),
            _ => None,
        }
    }

    /// The wire type code for this record type
    pub fn code(self) -> u8 {
        match self {
            RecordType::Rain => 0x41,
            RecordType::TempHumidity => 0x42,
            RecordType::Water => 0x44,
            RecordType::Pressure => 0x46,
            RecordType::Uv => 0x47,
            RecordType::Wind => 0x48,
            RecordType::Clock => 0x60,
        }
    }

    /// Total record length in bytes, including the two leading bytes
    /// (flags + type code) and the trailing two checksum bytes
    pub fn record_len(self) -> usize {
        match self {
            RecordType::Rain => 17,
            RecordType::TempHumidity => 12,
            RecordType::Water => 7,
            RecordType::Pressure => 8,
            RecordType::Uv => 5,
            RecordType::Wind => 11,
            RecordType::Clock => 12,
        }
    }

    /// Topic name used in envelopes and pub/sub messages
    pub fn topic(self) -> &'static str {
        match self {
            RecordType::Rain => "rain",
            RecordType::TempHumidity => "temp",
            RecordType::Water => "water",
            RecordType::Pressure => "pressure",
            RecordType::Uv => "uv",
            RecordType::Wind => "wind",
            RecordType::Clock => "clock",
        }
    }

    /// Dense index for fixed-size per-type tables
    pub fn table_index(self) -> usize {
        match self {
            RecordType::Rain => 0,
            RecordType::TempHumidity => 1,
            RecordType::Water => 2,
            RecordType::Pressure => 3,
            RecordType::Uv => 4,
            RecordType::Wind => 5,
            RecordType::Clock => 6,
        }
    }
}

/// Temperature/dew-point trend indicator
///
/// The wire encodes trend as a 2-bit code (0 = steady, 1 = rising,
/// 2 = falling). Consumers see it as a signed tri-state rather than a raw
/// index; codes outside the table decode as [`Trend::Flat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Trend {
    #[default]
    Flat,
    Rising,
    Falling,
}

impl Trend {
    /// Decode the 2-bit wire code
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Trend::Rising,
            2 => Trend::Falling,
            _ => Trend::Flat,
        }
    }

    /// Signed representation: -1 falling, 0 flat, +1 rising
    pub fn as_i8(self) -> i8 {
        match self {
            Trend::Flat => 0,
            Trend::Rising => 1,
            Trend::Falling => -1,
        }
    }
}

/// Date/time stamp carried inside rain and clock records
///
/// Assembled from five payload bytes (minute, hour, day, month,
/// year offset from 2000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl DeviceTime {
    /// Build from the wire layout: `[minute, hour, day, month, year - 2000]`
    pub fn from_wire(bytes: &[u8]) -> Self {
        Self {
            minute: bytes[0],
            hour: bytes[1],
            day: bytes[2],
            month: bytes[3],
            year: bytes[4] as u16 + 2000,
        }
    }
}

impl std::fmt::Display for DeviceTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}{:02}{:02}{:02}{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

/// One decoded sensor reading
///
/// Produced by the field decoders, stored in the aggregate state table, and
/// wrapped in an [`crate::sink::Envelope`] for sink dispatch. Immutable once
/// built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reading {
    /// Rain gauge: instantaneous rate plus running totals in millimetres
    Rain {
        sensor: u8,
        power: u8,
        /// Instantaneous rate, raw device units (hundredths of an inch/hour)
        rate: u8,
        hour_mm: f32,
        day_mm: f32,
        total_mm: f32,
        /// When the cumulative total was last reset
        since: DeviceTime,
    },
    /// Temperature/humidity sensor with comfort and trend annotations
    TempHumidity {
        sensor: u8,
        /// 2-bit comfort ("smiley") code from the status nibble
        comfort: u8,
        trend: Trend,
        celsius: f32,
        humidity: u8,
        dew_point: f32,
    },
    /// Water temperature probe
    Water { sensor: u8, celsius: f32 },
    /// Barometric pressure, station-level and altitude-adjusted
    Pressure {
        pressure: u16,
        forecast: u8,
        alt_pressure: u16,
        alt_forecast: u8,
    },
    /// UV record; this protocol revision carries no decodable payload, so
    /// the reading is a placeholder with no measurement fields
    Uv,
    /// Anemometer: direction nibble plus instantaneous and average speeds
    Wind {
        /// 4-bit compass index, see [`COMPASS_POINTS`]
        direction: u8,
        power: u8,
        speed: f32,
        avg_speed: f32,
    },
    /// Console clock with power/battery/RF status bits
    Clock {
        powered: bool,
        battery: bool,
        rf: bool,
        level: bool,
        at: DeviceTime,
    },
}

impl Reading {
    /// The record type this reading was decoded from
    pub fn record_type(&self) -> RecordType {
        match self {
            Reading::Rain { .. } => RecordType::Rain,
            Reading::TempHumidity { .. } => RecordType::TempHumidity,
            Reading::Water { .. } => RecordType::Water,
            Reading::Pressure { .. } => RecordType::Pressure,
            Reading::Uv => RecordType::Uv,
            Reading::Wind { .. } => RecordType::Wind,
            Reading::Clock { .. } => RecordType::Clock,
        }
    }

    /// Sensor index for multi-sensor record types, 0 for console-level ones
    pub fn sensor_index(&self) -> u8 {
        match self {
            Reading::Rain { sensor, .. }
            | Reading::TempHumidity { sensor, .. }
            | Reading::Water { sensor, .. } => *sensor,
            _ => 0,
        }
    }

    /// Whether this reading carries a per-sensor index on the wire
    pub fn has_sensor_index(&self) -> bool {
        matches!(
            self,
            Reading::Rain { .. } | Reading::TempHumidity { .. } | Reading::Water { .. }
        )
    }
}

/// Compass label for a 4-bit wind direction index
pub fn compass_point(direction: u8) -> &'static str {
    COMPASS_POINTS[(direction & 0x0f) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_roundtrip() {
        for rt in RecordType::ALL {
            assert_eq!(RecordType::from_code(rt.code()), Some(rt));
        }
    }

    #[test]
    fn test_unknown_code_is_none() {
        assert_eq!(RecordType::from_code(0x00), None);
        assert_eq!(RecordType::from_code(0x43), None);
        assert_eq!(RecordType::from_code(0xff), None);
    }

    #[test]
    fn test_record_lengths_match_protocol_table() {
        assert_eq!(RecordType::Rain.record_len(), 17);
        assert_eq!(RecordType::TempHumidity.record_len(), 12);
        assert_eq!(RecordType::Water.record_len(), 7);
        assert_eq!(RecordType::Pressure.record_len(), 8);
        assert_eq!(RecordType::Uv.record_len(), 5);
        assert_eq!(RecordType::Wind.record_len(), 11);
        assert_eq!(RecordType::Clock.record_len(), 12);
    }

    #[test]
    fn test_trend_tri_state() {
        assert_eq!(Trend::from_code(0).as_i8(), 0);
        assert_eq!(Trend::from_code(1).as_i8(), 1);
        assert_eq!(Trend::from_code(2).as_i8(), -1);
        // Out-of-table code clamps to flat rather than faulting
        assert_eq!(Trend::from_code(3).as_i8(), 0);
    }

    #[test]
    fn test_device_time_display() {
        let t = DeviceTime {
            year: 2026,
            month: 8,
            day: 29,
            hour: 7,
            minute: 5,
        };
        assert_eq!(t.to_string(), "202608290705");
    }

    #[test]
    fn test_compass_full_rose() {
        assert_eq!(compass_point(0), "N");
        assert_eq!(compass_point(4), "E");
        assert_eq!(compass_point(8), "S");
        assert_eq!(compass_point(12), "W");
        // Index is masked, never out of bounds
        assert_eq!(compass_point(16), "N");
    }
}
