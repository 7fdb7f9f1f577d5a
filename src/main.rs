//! wmr100d - Main Entry Point
//!
//! Opens the station console over USB HID, runs the decode loop on one
//! thread and the periodic snapshot writer on another, and shuts both down
//! on SIGINT/SIGTERM by clearing the shared running flag.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wmr100d::{
    config::Config,
    sink::{ConsoleSink, FileSink, SinkSet, SqliteStore, UdpPublisher},
    state::StateStore,
    transport::HidReportSource,
    worker::{DecodeWorker, SnapshotWorker},
    Result, WmrError,
};

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "wmr100d.toml".to_string());
    let config = Config::load_or_default(&config_path)?;

    // Initialize logging; the appender guard must outlive the workers
    let _log_guard = init_logging(&config);
    tracing::info!(config = %config_path, "starting wmr100d");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            tracing::info!("caught signal, shutting down");
            running.store(false, Ordering::SeqCst);
        })
        .map_err(|e| WmrError::Config(format!("failed to install signal handler: {e}")))?;
    }

    let state = StateStore::new();
    let sinks = build_sinks(&config)?;
    tracing::info!(enabled = sinks.len(), "sinks configured");

    // Snapshot writer, only when the database sink is enabled
    let snapshot_handle = if config.sinks.database.enabled {
        let store = SqliteStore::open(&config.sinks.database.path)?;
        let mut worker = SnapshotWorker::new(
            Arc::clone(&state),
            Box::new(store),
            Duration::from_secs(config.sinks.database.snapshot_interval_secs),
            Arc::clone(&running),
        );
        Some(std::thread::spawn(move || worker.run()))
    } else {
        None
    };

    let source = HidReportSource::open(&config.device)?;
    let mut decoder = DecodeWorker::new(
        Box::new(source),
        state,
        sinks,
        config.device.device_id.clone(),
        Arc::clone(&running),
    );
    let decode_handle = std::thread::spawn(move || decoder.run());

    let decode_result = decode_handle
        .join()
        .map_err(|_| WmrError::Io(std::io::Error::other("decode worker panicked")))?;

    // Make sure the snapshot worker sees shutdown even on transport failure
    running.store(false, Ordering::SeqCst);
    if let Some(handle) = snapshot_handle {
        let _ = handle.join();
    }

    tracing::info!("wmr100d stopped");
    decode_result
}

/// Build the per-record sink set from the configuration
fn build_sinks(config: &Config) -> Result<SinkSet> {
    let mut sinks = SinkSet::new();
    if config.sinks.console.enabled {
        sinks.push(Box::new(ConsoleSink::new()));
    }
    if config.sinks.file.enabled {
        sinks.push(Box::new(FileSink::new(&config.sinks.file.path)));
    }
    if config.sinks.pubsub.enabled {
        let target: SocketAddr = config
            .sinks
            .pubsub
            .target
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                WmrError::Config(format!(
                    "pubsub target '{}' does not resolve",
                    config.sinks.pubsub.target
                ))
            })?;
        sinks.push(Box::new(UdpPublisher::new(target)?));
    }
    Ok(sinks)
}

/// Set up the tracing subscriber, optionally with a rolling daily log file
fn init_logging(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,wmr100d=debug"));

    match &config.logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "wmr100d.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
            None
        }
    }
}
