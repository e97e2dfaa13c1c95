//! # Serial Communication Module
//!
//! Handles the two character devices the logger talks to.
//!
//! This module handles:
//! - Opening serial ports (8N1, no flow control)
//! - Framing the radio receiver's byte stream into 12-byte sample frames
//! - Line framing and response writing for the query transport

pub mod radio;
pub mod transport;

pub use radio::RadioLink;
pub use transport::CommandLink;

use crate::error::{GreenhouseError, Result};
use tokio_serial::SerialPortBuilderExt;
use tracing::info;

/// Open a serial device with the logger's line settings
///
/// # Arguments
///
/// * `path` - Device path (e.g., "/dev/ttyUSB0", "/dev/rfcomm0")
/// * `baud_rate` - Line speed
///
/// # Returns
///
/// * `Result<SerialStream>` - Opened serial port
///
/// # Errors
///
/// Returns `GreenhouseError::Serial` if the device cannot be opened
pub fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
    let port = tokio_serial::new(path, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| GreenhouseError::Serial(format!("Failed to open {}: {}", path, e)))?;

    info!("Opened serial device {} at {} baud", path, baud_rate);
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_port_with_invalid_path_returns_error() {
        let result = open_port("/dev/nonexistent_serial_device_12345", 115200);

        match result {
            Err(GreenhouseError::Serial(msg)) => {
                assert!(msg.contains("/dev/nonexistent_serial_device_12345"));
                assert!(msg.contains("Failed to open"));
            }
            other => panic!("Expected Serial error, got: {:?}", other.map(|_| ())),
        }
    }
}
