//! Error handling for the wmr100d daemon
//!
//! This module defines the fatal error type and a Result alias used
//! throughout the daemon. Protocol-level conditions that are recovered
//! inside the decode loop (bad checksum, unknown record type) are not
//! errors in this sense; they live in [`crate::protocol::frame`].

use thiserror::Error;

/// Main error type for wmr100d operations
///
/// Every variant here is fatal to the activity that raised it: a transport
/// error terminates the daemon, a config error prevents startup, a database
/// error fails the snapshot cycle that hit it.
#[derive(Error, Debug)]
pub enum WmrError {
    /// Errors from the USB HID transport
    #[error("Transport error: {0}")]
    Transport(#[from] hidapi::HidError),

    /// Device open retries exhausted
    #[error("Device not found after {attempts} attempts: {vendor_id:04x}:{product_id:04x}")]
    DeviceUnavailable {
        vendor_id: u16,
        product_id: u16,
        attempts: u32,
    },

    /// Errors related to configuration loading/validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors parsing the TOML configuration file
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Errors from the snapshot database writer
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Errors raised by an individual sink write
    #[error("Sink '{sink}' error: {message}")]
    Sink { sink: String, message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WmrError {
    /// Create a sink error with the failing sink's name attached
    pub fn sink(name: impl Into<String>, message: impl Into<String>) -> Self {
        WmrError::Sink {
            sink: name.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for wmr100d operations
pub type Result<T> = std::result::Result<T, WmrError>;
