//! Query transport: newline-delimited commands in, CRLF-terminated lines out

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::error::Result;

/// Longest command line kept while waiting for a newline
pub const MAX_COMMAND_LEN: usize = 256;

/// Line ending used on the transport
const LINE_ENDING: &str = "\r\n";

/// Line-framed command channel over a character stream
pub struct CommandLink<S> {
    stream: S,
    buffer: BytesMut,
}

impl<S> std::fmt::Debug for CommandLink<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandLink")
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> CommandLink<S> {
    /// Wrap a character stream
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(MAX_COMMAND_LEN),
        }
    }

    /// Wait for the next command line
    ///
    /// The line ending (LF or CRLF) is stripped and invalid UTF-8 is
    /// replaced. Safe to cancel: partial input stays buffered.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(line))` - One line of input
    /// * `Ok(None)` - The stream ended with nothing left buffered
    pub async fn read_command_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
                let line = self.buffer.split_to(newline + 1);
                return Ok(Some(decode_line(&line[..newline])));
            }

            if self.buffer.len() > MAX_COMMAND_LEN {
                warn!("Discarding {} bytes of input without a newline", self.buffer.len());
                self.buffer.clear();
            }

            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let rest = self.buffer.split();
                return Ok(Some(decode_line(&rest)));
            }
        }
    }

    /// Write one response line followed by CRLF
    pub async fn write_response_line(&mut self, line: &str) -> Result<()> {
        let mut out = String::with_capacity(line.len() + LINE_ENDING.len());
        out.push_str(line);
        out.push_str(LINE_ENDING);
        self.stream.write_all(out.as_bytes()).await?;
        Ok(())
    }

    /// Write a complete response and flush it
    pub async fn write_response(&mut self, lines: &[String]) -> Result<()> {
        for line in lines {
            self.write_response_line(line).await?;
        }
        self.stream.flush().await?;
        Ok(())
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end_matches('\r').to_string()
}
