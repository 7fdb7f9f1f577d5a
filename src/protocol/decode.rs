//! Field decoders, one per record type
//!
//! Each decoder is a pure function from a checksum-verified [`RawRecord`]
//! to a typed [`Reading`]. Byte offsets and bit-field rules are fixed,
//! device-specific layout, not a parsing DSL. The checksum is the only
//! validity gate: decoders never fail for an accepted record, and
//! out-of-range values are clamped or passed through as decoded.
//!
//! Recurring encodings:
//!
//! - Multi-byte values are little-endian pairs, `low | (high << 8)`,
//!   masked to 12 bits where the high nibble carries flags.
//! - Temperatures (air, dew point, water) are a 12-bit magnitude in tenths
//!   of a degree with an out-of-band sign: high nibble 0x8 negates the
//!   magnitude.
//! - Rain totals are hundredths of an inch, converted to millimetres.

use crate::protocol::frame::RawRecord;
use crate::protocol::types::{DeviceTime, Reading, RecordType, Trend};

/// Decode a verified record into a typed reading
///
/// Total for every record the checksum accepted; the buffer length is
/// guaranteed by the record length table.
pub fn decode(record: &RawRecord) -> Reading {
    let data = record.bytes();
    match record.record_type() {
        RecordType::Rain => decode_rain(data),
        RecordType::TempHumidity => decode_temp_humidity(data),
        RecordType::Water => decode_water(data),
        RecordType::Pressure => decode_pressure(data),
        RecordType::Uv => Reading::Uv,
        RecordType::Wind => decode_wind(data),
        RecordType::Clock => decode_clock(data),
    }
}

/// Little-endian 16-bit field
fn u16_le(low: u8, high: u8) -> u16 {
    low as u16 | (high as u16) << 8
}

/// 12-bit magnitude in tenths with the 0x8 sign nibble in the high byte
///
/// Shared by air temperature, dew point, and water temperature; the sign
/// convention must be applied identically in each.
fn signed_tenths(data: &[u8], index: usize) -> f32 {
    let magnitude = u16_le(data[index], data[index + 1] & 0x0f) as f32 / 10.0;
    if data[index + 1] >> 4 == 0x8 {
        -magnitude
    } else {
        magnitude
    }
}

/// Hundredths of an inch to millimetres
fn inches_hundredths_to_mm(raw: u16) -> f32 {
    raw as f32 * 25.4 / 100.0
}

fn decode_rain(data: &[u8]) -> Reading {
    Reading::Rain {
        sensor: data[2] & 0x0f,
        power: data[2] >> 4,
        rate: data[3],
        hour_mm: inches_hundredths_to_mm(u16_le(data[4], data[5])),
        day_mm: inches_hundredths_to_mm(u16_le(data[6], data[7])),
        total_mm: inches_hundredths_to_mm(u16_le(data[8], data[9])),
        since: DeviceTime::from_wire(&data[10..15]),
    }
}

fn decode_temp_humidity(data: &[u8]) -> Reading {
    // High nibble of byte 2 packs comfort (top 2 bits) over trend (bottom 2)
    let status = data[2] >> 4;
    Reading::TempHumidity {
        sensor: data[2] & 0x0f,
        comfort: status >> 2,
        trend: Trend::from_code(status & 0x03),
        celsius: signed_tenths(data, 3),
        humidity: data[5],
        dew_point: signed_tenths(data, 6),
    }
}

fn decode_water(data: &[u8]) -> Reading {
    Reading::Water {
        sensor: data[2] & 0x0f,
        celsius: signed_tenths(data, 3),
    }
}

fn decode_pressure(data: &[u8]) -> Reading {
    Reading::Pressure {
        pressure: u16_le(data[2], data[3] & 0x0f),
        forecast: data[3] >> 4,
        alt_pressure: u16_le(data[4], data[5] & 0x0f),
        alt_forecast: data[5] >> 4,
    }
}

fn decode_wind(data: &[u8]) -> Reading {
    // Average speed is a packed-nibble composition specific to this device
    // revision: high part from byte 6 shifted up, low part from the high
    // nibble of byte 5. Preserved exactly as observed on hardware.
    let avg_raw = ((data[6] as u16) << 4) + (data[5] >> 4) as u16;
    Reading::Wind {
        direction: data[2] & 0x0f,
        power: data[2] >> 4,
        speed: data[4] as f32 / 10.0,
        avg_speed: avg_raw as f32 / 10.0,
    }
}

fn decode_clock(data: &[u8]) -> Reading {
    // Status bits live in the high nibble of the flags byte
    let status = data[0] >> 4;
    Reading::Clock {
        powered: status >> 3 == 1,
        battery: status & 0x4 != 0,
        rf: status & 0x2 != 0,
        level: status & 0x1 != 0,
        at: DeviceTime::from_wire(&data[4..9]),
    }
}
