//! Snapshot persistence into a relational store
//!
//! Unlike the per-record sinks, the database receives whole aggregate-state
//! snapshots on the periodic writer's interval. Each snapshot becomes one
//! `conditions` row (pressure, wind, rain aggregates) and one
//! `sensor_readings` row per sensor index that has been observed, keyed by
//! the snapshot timestamp. Slots never observed are skipped, not written as
//! NULL rows.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

use crate::error::Result;
use crate::protocol::types::{compass_point, Reading, RecordType, MAX_SENSORS};
use crate::state::Snapshot;

/// Consumer of periodic aggregate-state snapshots
pub trait SnapshotStore: Send {
    /// Persist one snapshot under the given timestamp
    fn persist(&mut self, timestamp: DateTime<Utc>, snapshot: &Snapshot) -> Result<()>;
}

/// SQLite-backed snapshot store
pub struct SqliteStore {
    conn: Connection,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS conditions (
    timestamp     TEXT NOT NULL,
    pressure      INTEGER,
    forecast      INTEGER,
    alt_pressure  INTEGER,
    alt_forecast  INTEGER,
    wind_dir      TEXT,
    wind_speed    REAL,
    wind_avg      REAL,
    rain_rate     INTEGER,
    rain_hour_mm  REAL,
    rain_day_mm   REAL,
    rain_total_mm REAL
);
CREATE TABLE IF NOT EXISTS sensor_readings (
    timestamp    TEXT NOT NULL,
    sensor       INTEGER NOT NULL,
    temp_c       REAL,
    humidity     INTEGER,
    dewpoint_c   REAL,
    trend        INTEGER,
    water_temp_c REAL
);
";

impl SqliteStore {
    /// Open (creating if needed) the database file and its schema
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory store for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Direct access for queries (tests and maintenance tooling)
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn write_conditions(&self, timestamp: &str, snapshot: &Snapshot) -> Result<()> {
        let pressure = snapshot.get(RecordType::Pressure, 0);
        let wind = snapshot.get(RecordType::Wind, 0);
        let rain = (0..MAX_SENSORS as u8)
            .find_map(|sensor| snapshot.get(RecordType::Rain, sensor));
        if pressure.is_none() && wind.is_none() && rain.is_none() {
            return Ok(());
        }

        let (p, f, ap, af) = match pressure {
            Some(Reading::Pressure {
                pressure,
                forecast,
                alt_pressure,
                alt_forecast,
            }) => (
                Some(*pressure),
                Some(*forecast),
                Some(*alt_pressure),
                Some(*alt_forecast),
            ),
            _ => (None, None, None, None),
        };
        let (wd, ws, wa) = match wind {
            Some(Reading::Wind {
                direction,
                speed,
                avg_speed,
                ..
            }) => (
                Some(compass_point(*direction)),
                Some(*speed as f64),
                Some(*avg_speed as f64),
            ),
            _ => (None, None, None),
        };
        let (rr, rh, rd, rt) = match rain {
            Some(Reading::Rain {
                rate,
                hour_mm,
                day_mm,
                total_mm,
                ..
            }) => (
                Some(*rate),
                Some(*hour_mm as f64),
                Some(*day_mm as f64),
                Some(*total_mm as f64),
            ),
            _ => (None, None, None, None),
        };

        self.conn.execute(
            "INSERT INTO conditions (timestamp, pressure, forecast, alt_pressure, alt_forecast, \
             wind_dir, wind_speed, wind_avg, rain_rate, rain_hour_mm, rain_day_mm, rain_total_mm) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![timestamp, p, f, ap, af, wd, ws, wa, rr, rh, rd, rt],
        )?;
        Ok(())
    }

    fn write_sensors(&self, timestamp: &str, snapshot: &Snapshot) -> Result<()> {
        for sensor in 0..MAX_SENSORS as u8 {
            let temp = snapshot.get(RecordType::TempHumidity, sensor);
            let water = snapshot.get(RecordType::Water, sensor);
            if temp.is_none() && water.is_none() {
                continue;
            }

            let (t, h, d, tr) = match temp {
                Some(Reading::TempHumidity {
                    celsius,
                    humidity,
                    dew_point,
                    trend,
                    ..
                }) => (
                    Some(*celsius as f64),
                    Some(*humidity),
                    Some(*dew_point as f64),
                    Some(trend.as_i8()),
                ),
                _ => (None, None, None, None),
            };
            let w = match water {
                Some(Reading::Water { celsius, .. }) => Some(*celsius as f64),
                _ => None,
            };

            self.conn.execute(
                "INSERT INTO sensor_readings (timestamp, sensor, temp_c, humidity, dewpoint_c, \
                 trend, water_temp_c) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![timestamp, sensor, t, h, d, tr, w],
            )?;
        }
        Ok(())
    }
}

impl SnapshotStore for SqliteStore {
    fn persist(&mut self, timestamp: DateTime<Utc>, snapshot: &Snapshot) -> Result<()> {
        let stamp = timestamp.format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        self.write_conditions(&stamp, snapshot)?;
        self.write_sensors(&stamp, snapshot)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::Trend;
    use crate::state::StateStore;

    fn count(store: &SqliteStore, table: &str) -> i64 {
        store
            .connection()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .unwrap()
    }

    #[test]
    fn test_empty_snapshot_writes_nothing() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let state = StateStore::new();
        store.persist(Utc::now(), &state.snapshot()).unwrap();

        assert_eq!(count(&store, "conditions"), 0);
        assert_eq!(count(&store, "sensor_readings"), 0);
    }

    #[test]
    fn test_persist_writes_conditions_and_per_sensor_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let state = StateStore::new();
        state.update(Reading::Pressure {
            pressure: 1009,
            forecast: 2,
            alt_pressure: 1013,
            alt_forecast: 1,
        });
        state.update(Reading::TempHumidity {
            sensor: 0,
            comfort: 1,
            trend: Trend::Rising,
            celsius: 21.0,
            humidity: 40,
            dew_point: 7.2,
        });
        state.update(Reading::TempHumidity {
            sensor: 1,
            comfort: 0,
            trend: Trend::Flat,
            celsius: 5.0,
            humidity: 80,
            dew_point: 1.9,
        });
        state.update(Reading::Water {
            sensor: 1,
            celsius: 17.5,
        });

        store.persist(Utc::now(), &state.snapshot()).unwrap();

        assert_eq!(count(&store, "conditions"), 1);
        assert_eq!(count(&store, "sensor_readings"), 2);

        // Sensor 1 merges the temperature and water readings into one row
        let (humidity, water): (i64, f64) = store
            .connection()
            .query_row(
                "SELECT humidity, water_temp_c FROM sensor_readings WHERE sensor = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(humidity, 80);
        assert!((water - 17.5).abs() < 1e-6);

        // Sensor 0 has no water probe; its water column is NULL
        let water0: Option<f64> = store
            .connection()
            .query_row(
                "SELECT water_temp_c FROM sensor_readings WHERE sensor = 0",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(water0.is_none());
    }

    #[test]
    fn test_unobserved_sensor_slots_are_skipped() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let state = StateStore::new();
        state.update(Reading::Water {
            sensor: 7,
            celsius: 12.0,
        });

        store.persist(Utc::now(), &state.snapshot()).unwrap();

        let sensors: i64 = count(&store, "sensor_readings");
        assert_eq!(sensors, 1);
        let sensor: i64 = store
            .connection()
            .query_row("SELECT sensor FROM sensor_readings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(sensor, 7);
        // Water alone observed, no aggregate conditions row
        assert_eq!(count(&store, "conditions"), 0);
    }
}
