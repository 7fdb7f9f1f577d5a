//! USB HID transport to the WMR100 console
//!
//! Opens the station over hidapi, performs the two-packet initialisation
//! handshake the console expects, and reads fixed-size interrupt reports.
//! Device open uses a capped retry with a fixed backoff; exhausting the
//! retries is a fatal [`WmrError::DeviceUnavailable`].

use std::thread;
use std::time::Duration;

use hidapi::{HidApi, HidDevice};

use crate::config::DeviceConfig;
use crate::error::{Result, WmrError};
use crate::transport::{Report, ReportSource, REPORT_SIZE};

/// USB vendor id of the Oregon Scientific WMR100/200 console
pub const WMR100_VENDOR_ID: u16 = 0x0fde;
/// USB product id of the Oregon Scientific WMR100/200 console
pub const WMR100_PRODUCT_ID: u16 = 0xca01;

/// First handshake packet, sent once after open
const INIT_PACKET: [u8; 8] = [0x20, 0x00, 0x08, 0x01, 0x00, 0x00, 0x00, 0x00];
/// Ready packet; doubles as the per-record acknowledgment
const READY_PACKET: [u8; 8] = [0x01, 0xd0, 0x08, 0x01, 0x00, 0x00, 0x00, 0x00];

/// Report source backed by the real USB HID device
pub struct HidReportSource {
    device: Option<HidDevice>,
}

impl HidReportSource {
    /// Open the console, retrying per the configured policy
    ///
    /// Sends the initialisation handshake before returning, so the device
    /// starts streaming immediately.
    pub fn open(config: &DeviceConfig) -> Result<Self> {
        let api = HidApi::new()?;
        let backoff = Duration::from_secs(config.open_backoff_secs);

        let mut attempt = 0;
        let device = loop {
            attempt += 1;
            match api.open(config.vendor_id, config.product_id) {
                Ok(device) => break device,
                Err(err) if attempt < config.open_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts = config.open_attempts,
                        error = %err,
                        "device open failed, retrying after backoff"
                    );
                    thread::sleep(backoff);
                }
                Err(err) => {
                    tracing::error!(error = %err, "device open retries exhausted");
                    return Err(WmrError::DeviceUnavailable {
                        vendor_id: config.vendor_id,
                        product_id: config.product_id,
                        attempts: config.open_attempts,
                    });
                }
            }
        };

        tracing::info!(
            "opened WMR100 console {:04x}:{:04x}",
            config.vendor_id,
            config.product_id
        );

        let mut source = Self {
            device: Some(device),
        };
        source.send_packet(&INIT_PACKET)?;
        source.send_packet(&READY_PACKET)?;
        Ok(source)
    }

    fn device(&self) -> Result<&HidDevice> {
        self.device
            .as_ref()
            .ok_or_else(|| WmrError::Io(std::io::Error::other("HID device closed")))
    }

    /// Write one 8-byte output report, prefixed with report number 0
    fn send_packet(&mut self, packet: &[u8; 8]) -> Result<()> {
        let mut buf = [0u8; 9];
        buf[1..].copy_from_slice(packet);
        self.device()?.write(&buf)?;
        Ok(())
    }
}

impl ReportSource for HidReportSource {
    fn read_report(&mut self) -> Result<Report> {
        let mut buf = [0u8; REPORT_SIZE];
        // Blocking interrupt read; a short read leaves trailing bytes
        // zeroed, which the length prefix makes harmless.
        self.device()?.read(&mut buf)?;
        Ok(Report::from_raw(buf))
    }

    fn send_ready(&mut self) -> Result<()> {
        self.send_packet(&READY_PACKET)
    }

    fn close(&mut self) {
        if self.device.take().is_some() {
            tracing::info!("closed WMR100 console");
        }
    }
}
