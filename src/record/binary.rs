//! # Radio Frame Decoder
//!
//! Decodes the fixed-size sample frame sent by the field transmitter.
//!
//! ## Frame Layout (little-endian)
//!
//! ```text
//! offset  size  field
//!      0     4  air_temperature (f32)
//!      4     4  air_humidity    (f32)
//!      8     2  soil_humidity   (i16)
//!     10     2  padding (struct alignment, ignored)
//! ```

use bytes::Buf;

use super::types::Sample;
use crate::error::{GreenhouseError, Result};

/// Size of one sample frame on the radio link
pub const SAMPLE_FRAME_SIZE: usize = 12;

/// Decode one radio sample frame
///
/// # Arguments
///
/// * `frame` - Exactly `SAMPLE_FRAME_SIZE` bytes
///
/// # Errors
///
/// Returns `GreenhouseError::Record` if the frame has the wrong length or
/// carries a NaN or infinite reading (usually a misaligned stream)
pub fn decode_sample_frame(frame: &[u8]) -> Result<Sample> {
    if frame.len() != SAMPLE_FRAME_SIZE {
        return Err(GreenhouseError::Record(format!(
            "Sample frame must be {} bytes, got {}",
            SAMPLE_FRAME_SIZE,
            frame.len()
        )));
    }

    let mut buf = frame;
    let air_temperature = buf.get_f32_le();
    let air_humidity = buf.get_f32_le();
    let soil_humidity = buf.get_i16_le();

    if !air_temperature.is_finite() || !air_humidity.is_finite() {
        return Err(GreenhouseError::Record(format!(
            "Non-finite reading in sample frame (T {}, H {})",
            air_temperature, air_humidity
        )));
    }

    Ok(Sample {
        air_humidity,
        air_temperature,
        soil_humidity,
    })
}

/// Encode a sample as a radio frame (transmitter side, used by tests and tooling)
pub fn encode_sample_frame(sample: &Sample) -> [u8; SAMPLE_FRAME_SIZE] {
    let mut frame = [0u8; SAMPLE_FRAME_SIZE];
    frame[0..4].copy_from_slice(&sample.air_temperature.to_le_bytes());
    frame[4..8].copy_from_slice(&sample.air_humidity.to_le_bytes());
    frame[8..10].copy_from_slice(&sample.soil_humidity.to_le_bytes());
    frame
}
