//! # Error Types
//!
//! Custom error types for Greenhouse Logger using `thiserror`.

use thiserror::Error;

/// Main error type for Greenhouse Logger
#[derive(Debug, Error)]
pub enum GreenhouseError {
    /// Malformed radio frames or records
    #[error("Record format error: {0}")]
    Record(String),

    /// Serial device errors (radio link or command transport)
    #[error("Serial error: {0}")]
    Serial(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Greenhouse Logger
pub type Result<T> = std::result::Result<T, GreenhouseError>;
