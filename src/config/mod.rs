//! Daemon configuration
//!
//! Loaded from a TOML file (default `wmr100d.toml`); every field has a
//! default so a missing file or a partial file both work. Validation
//! enforces the one hard startup rule: at least one sink must be enabled.
//!
//! # Sections
//!
//! - `[device]` - USB ids, open retry policy, and the device id used in
//!   envelope `source` fields
//! - `[sinks.console]`, `[sinks.file]`, `[sinks.pubsub]`, `[sinks.database]`
//! - `[logging]` - optional rolling daemon-log directory

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, WmrError};
use crate::transport::hid::{WMR100_PRODUCT_ID, WMR100_VENDOR_ID};

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub sinks: SinksConfig,
    pub logging: LoggingConfig,
}

/// USB device identity and open policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// USB vendor id
    pub vendor_id: u16,
    /// USB product id
    pub product_id: u16,
    /// Capped number of open attempts before giving up
    pub open_attempts: u32,
    /// Seconds to sleep between open attempts
    pub open_backoff_secs: u64,
    /// Identifier used in envelope `source` fields
    pub device_id: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: WMR100_VENDOR_ID,
            product_id: WMR100_PRODUCT_ID,
            open_attempts: 5,
            open_backoff_secs: 5,
            device_id: "wmr100".to_string(),
        }
    }
}

/// Enablement and parameters for every sink
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SinksConfig {
    pub console: ConsoleSinkConfig,
    pub file: FileSinkConfig,
    pub pubsub: PubSubSinkConfig,
    pub database: DatabaseSinkConfig,
}

impl SinksConfig {
    /// Number of enabled sinks
    pub fn enabled_count(&self) -> usize {
        [
            self.console.enabled,
            self.file.enabled,
            self.pubsub.enabled,
            self.database.enabled,
        ]
        .iter()
        .filter(|&&on| on)
        .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSinkConfig {
    pub enabled: bool,
}

impl Default for ConsoleSinkConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSinkConfig {
    pub enabled: bool,
    /// Append-only data log path; recreated if rotated away
    pub path: PathBuf,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("./data.log"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PubSubSinkConfig {
    pub enabled: bool,
    /// UDP endpoint of the bus
    pub target: String,
}

impl Default for PubSubSinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target: "127.0.0.1:5557".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSinkConfig {
    pub enabled: bool,
    /// SQLite database path
    pub path: PathBuf,
    /// Seconds between aggregate-state snapshots
    pub snapshot_interval_secs: u64,
}

impl Default for DatabaseSinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("./wmr100.db"),
            snapshot_interval_secs: 60,
        }
    }
}

/// Daemon log output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rolling daily log files; stderr-only when unset
    pub directory: Option<PathBuf>,
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, fall back to defaults otherwise
    ///
    /// A present-but-invalid file is still an error; only absence falls
    /// back.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Startup validation: at least one sink must be enabled
    pub fn validate(&self) -> Result<()> {
        if self.sinks.enabled_count() == 0 {
            return Err(WmrError::Config(
                "at least one sink must be enabled".to_string(),
            ));
        }
        if self.device.open_attempts == 0 {
            return Err(WmrError::Config(
                "device.open_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
