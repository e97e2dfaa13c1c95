//! Radio receiver link: a byte stream carrying back-to-back sample frames

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::warn;

use crate::error::Result;
use crate::record::binary::{decode_sample_frame, SAMPLE_FRAME_SIZE};
use crate::record::Sample;

/// Splits the receiver's byte stream into samples
///
/// Bytes are buffered inside the link, so a pending `read_sample` can be
/// dropped (e.g. by `tokio::select!`) without losing part of a frame.
///
/// A frame that fails to decode is taken as a sign of a shifted stream: one
/// byte is dropped and decoding is retried from the next offset.
pub struct RadioLink<R> {
    reader: R,
    buffer: BytesMut,
}

impl<R> std::fmt::Debug for RadioLink<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadioLink")
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl<R: AsyncRead + Unpin> RadioLink<R> {
    /// Wrap a byte stream from the radio receiver
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(SAMPLE_FRAME_SIZE * 4),
        }
    }

    /// Wait for the next complete sample
    ///
    /// # Returns
    ///
    /// * `Ok(Some(sample))` - One decoded frame
    /// * `Ok(None)` - The stream ended; a trailing partial frame is dropped
    pub async fn read_sample(&mut self) -> Result<Option<Sample>> {
        loop {
            while self.buffer.len() >= SAMPLE_FRAME_SIZE {
                match decode_sample_frame(&self.buffer[..SAMPLE_FRAME_SIZE]) {
                    Ok(sample) => {
                        self.buffer.advance(SAMPLE_FRAME_SIZE);
                        return Ok(Some(sample));
                    }
                    Err(e) => {
                        warn!("Dropping one byte to resynchronise radio stream: {}", e);
                        self.buffer.advance(1);
                    }
                }
            }

            if self.reader.read_buf(&mut self.buffer).await? == 0 {
                return Ok(None);
            }
        }
    }
}
