//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::{GreenhouseError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub radio: RadioConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub clock: ClockConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Removable storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
}

/// Radio receiver serial configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RadioConfig {
    #[serde(default = "default_radio_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Query transport (character stream) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    #[serde(default = "default_transport_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Rollover scheduler configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_day_window_start_minute")]
    pub day_window_start_minute: u32,

    #[serde(default = "default_week_window_days")]
    pub week_window_days: usize,

    #[serde(default = "default_month_window_days")]
    pub month_window_days: usize,
}

/// Which samples are dropped at ingest as sensor failures
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZeroFilter {
    /// Drop samples whose three readings are all zero
    #[default]
    AllZero,

    /// Drop samples with any zero reading
    AnyZero,

    /// Keep every sample
    Off,
}

/// Sample ingest configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct IngestConfig {
    #[serde(default)]
    pub zero_filter: ZeroFilter,
}

/// Query protocol configuration
#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_max_days")]
    pub max_days: usize,
}

/// Local time source configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ClockConfig {
    #[serde(default = "default_min_valid_year")]
    pub min_valid_year: i32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub file_dir: String,
}

// Default value functions
fn default_root_dir() -> String { "/mnt/sd".to_string() }

fn default_radio_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_transport_port() -> String { "/dev/rfcomm0".to_string() }
fn default_baud_rate() -> u32 { 115200 }

fn default_tick_interval_ms() -> u64 { 1000 }
fn default_day_window_start_minute() -> u32 { 55 }
fn default_week_window_days() -> usize { 7 }
fn default_month_window_days() -> usize { 29 }

fn default_max_days() -> usize { 366 }

fn default_min_valid_year() -> i32 { 2020 }

fn default_log_level() -> String { "info".to_string() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { root_dir: default_root_dir() }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            port: default_radio_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: default_transport_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            day_window_start_minute: default_day_window_start_minute(),
            week_window_days: default_week_window_days(),
            month_window_days: default_month_window_days(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { max_days: default_max_days() }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { min_valid_year: default_min_valid_year() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_dir: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use greenhouse_logger::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.storage.root_dir.is_empty() {
            return Err(invalid("storage root_dir cannot be empty"));
        }

        if self.radio.port.is_empty() {
            return Err(invalid("radio port cannot be empty"));
        }

        if self.transport.port.is_empty() {
            return Err(invalid("transport port cannot be empty"));
        }

        if self.radio.baud_rate == 0 || self.transport.baud_rate == 0 {
            return Err(invalid("baud_rate must be greater than 0"));
        }

        if self.scheduler.tick_interval_ms == 0 || self.scheduler.tick_interval_ms > 60000 {
            return Err(invalid("tick_interval_ms must be between 1 and 60000"));
        }

        if self.scheduler.day_window_start_minute > 59 {
            return Err(invalid("day_window_start_minute must be between 0 and 59"));
        }

        for (name, value) in [
            ("week_window_days", self.scheduler.week_window_days),
            ("month_window_days", self.scheduler.month_window_days),
        ] {
            if value == 0 || value > 366 {
                return Err(invalid(format!("{} must be between 1 and 366", name)));
            }
        }

        if self.query.max_days == 0 {
            return Err(invalid("query max_days must be greater than 0"));
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid("logging level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> GreenhouseError {
    GreenhouseError::Config(toml::de::Error::custom(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[storage]
root_dir = "/media/sdcard"

[radio]
port = "/dev/ttyUSB1"

[scheduler]
month_window_days = 30

[ingest]
zero_filter = "any_zero"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.storage.root_dir, "/media/sdcard");
        assert_eq!(config.radio.port, "/dev/ttyUSB1");
        assert_eq!(config.radio.baud_rate, 115200);
        assert_eq!(config.scheduler.month_window_days, 30);
        assert_eq!(config.scheduler.week_window_days, 7);
        assert_eq!(config.ingest.zero_filter, ZeroFilter::AnyZero);
        assert_eq!(config.transport.port, "/dev/rfcomm0");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.storage.root_dir, "/mnt/sd");
        assert_eq!(config.ingest.zero_filter, ZeroFilter::AllZero);
        assert_eq!(config.scheduler.day_window_start_minute, 55);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        match Config::load("/nonexistent/greenhouse.toml") {
            Err(GreenhouseError::Io(_)) => {}
            other => panic!("Expected Io error, got: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_zero_filter_rejected() {
        let result = Config::from_toml("[ingest]\nzero_filter = \"sometimes\"\n");
        assert!(matches!(result, Err(GreenhouseError::Config(_))));
    }

    #[test]
    fn test_zero_filter_off() {
        let config = Config::from_toml("[ingest]\nzero_filter = \"off\"\n").unwrap();
        assert_eq!(config.ingest.zero_filter, ZeroFilter::Off);
    }

    #[test]
    fn test_empty_root_dir() {
        let mut config = create_valid_config();
        config.storage.root_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_ports() {
        let mut config = create_valid_config();
        config.radio.port = String::new();
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.transport.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_baud_rate() {
        let mut config = create_valid_config();
        config.transport.baud_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_interval_zero() {
        let mut config = create_valid_config();
        config.scheduler.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_interval_too_high() {
        let mut config = create_valid_config();
        config.scheduler.tick_interval_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_day_window_minute_out_of_range() {
        let mut config = create_valid_config();
        config.scheduler.day_window_start_minute = 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_window_days_bounds() {
        let mut config = create_valid_config();
        config.scheduler.week_window_days = 0;
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.scheduler.month_window_days = 367;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_days_zero() {
        let mut config = create_valid_config();
        config.query.max_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = create_valid_config();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_root_dir(), "/mnt/sd");
        assert_eq!(default_radio_port(), "/dev/ttyUSB0");
        assert_eq!(default_transport_port(), "/dev/rfcomm0");
        assert_eq!(default_baud_rate(), 115200);
        assert_eq!(default_tick_interval_ms(), 1000);
        assert_eq!(default_day_window_start_minute(), 55);
        assert_eq!(default_week_window_days(), 7);
        assert_eq!(default_month_window_days(), 29);
        assert_eq!(default_max_days(), 366);
        assert_eq!(default_min_valid_year(), 2020);
        assert_eq!(default_log_level(), "info");
    }
}
