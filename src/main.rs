//! # Greenhouse Logger
//!
//! Log greenhouse sensor readings and serve rollup averages over a serial link.
//!
//! This application receives samples from a radio receiver, appends them to
//! day partitions on removable storage and answers queries arriving on a
//! second serial device.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use greenhouse_logger::clock::SystemClock;
use greenhouse_logger::config::{Config, LoggingConfig};
use greenhouse_logger::error::GreenhouseError;
use greenhouse_logger::serial::{self, CommandLink, RadioLink};
use greenhouse_logger::station::{IngestOutcome, Station};
use greenhouse_logger::store::{FsBackend, StorageBackend};

/// Configuration file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix of the rolling log files
const LOG_FILE_PREFIX: &str = "greenhouse-logger.log";

/// Number of stored samples between status log messages
const LOG_INTERVAL_SAMPLES: u64 = 100;

/// Main entry point for Greenhouse Logger
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (defaults when the file is missing)
///    - Set up logging with tracing subscriber
///    - Open the radio receiver and the query transport
///
/// 2. **Event Loop**, polled in fixed order
///    - Radio sample: filter and append to today's partition
///    - Command line: answer the query on the transport
///    - Rollover tick: write any due daily, weekly or monthly average
///    - Ctrl+C: shut down
///
/// # Errors
///
/// Returns error if:
/// - The configuration file exists but is invalid
/// - A serial device cannot be opened
///
/// # Examples
///
/// ```bash
/// greenhouse-logger config/default.toml
/// ```
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let (config, missing_config) = match Config::load(&config_path) {
        Ok(config) => (config, false),
        Err(GreenhouseError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            (Config::default(), true)
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load configuration from {}", config_path))
        }
    };

    let _log_guard = init_logging(&config.logging)?;

    info!("Greenhouse Logger v{} starting...", env!("CARGO_PKG_VERSION"));
    if missing_config {
        warn!("Configuration file {} not found, using defaults", config_path);
    }

    let backend = Arc::new(FsBackend::new(&config.storage.root_dir));
    if !backend.is_mounted() {
        warn!("Storage root {} is not mounted, appends will fail", backend.root().display());
    }
    let backend: Arc<dyn StorageBackend> = backend;

    let clock = Box::new(SystemClock::new(config.clock.min_valid_year));
    let mut station = Station::new(backend, clock, &config);

    let mut radio = RadioLink::new(serial::open_port(&config.radio.port, config.radio.baud_rate)?);
    let mut transport = CommandLink::new(serial::open_port(
        &config.transport.port,
        config.transport.baud_rate,
    )?);

    let mut rollover_interval = interval(Duration::from_millis(config.scheduler.tick_interval_ms));
    rollover_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Logging to {}, press Ctrl+C to exit", config.storage.root_dir);

    let mut radio_open = true;
    let mut transport_open = true;
    let mut stored_count: u64 = 0;

    loop {
        tokio::select! {
            biased;

            result = radio.read_sample(), if radio_open => match result {
                Ok(Some(sample)) => {
                    if station.ingest(sample) == IngestOutcome::Stored {
                        stored_count += 1;
                        if stored_count % LOG_INTERVAL_SAMPLES == 0 {
                            info!("Stored {} samples", stored_count);
                        }
                    }
                }
                Ok(None) => {
                    warn!("Radio link closed");
                    radio_open = false;
                }
                Err(e) => {
                    warn!("Radio link failed: {}", e);
                    radio_open = false;
                }
            },

            result = transport.read_command_line(), if transport_open => match result {
                Ok(Some(line)) => {
                    if let Some(response) = station.handle_command(&line) {
                        if let Err(e) = transport.write_response(&response).await {
                            warn!("Failed to send response: {}", e);
                        }
                    }
                }
                Ok(None) => {
                    warn!("Command transport closed");
                    transport_open = false;
                }
                Err(e) => {
                    warn!("Command transport failed: {}", e);
                    transport_open = false;
                }
            },

            _ = rollover_interval.tick() => {
                if let Some(event) = station.tick() {
                    debug!("{:?} rollup for {}: {:?}", event.kind, event.label, event.outcome);
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total samples stored: {}", stored_count);
                break;
            }
        }
    }

    Ok(())
}

/// Set up console logging plus an optional daily rolling log file
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// must be held until exit so buffered file output is flushed.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(directives)?,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    if config.file_dir.is_empty() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
        return Ok(None);
    }

    let appender = tracing_appender::rolling::daily(&config.file_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path_constant() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_log_interval_constant() {
        assert_eq!(LOG_INTERVAL_SAMPLES, 100);
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let config = Config::load(DEFAULT_CONFIG_PATH).unwrap();
        assert_eq!(config.storage.root_dir, "/mnt/sd");
        assert_eq!(config.scheduler.month_window_days, 29);
    }
}
