//! Incremental line splitting for upstream response bodies.

use bytes::{Buf, BytesMut};
use gateway_core::GatewayError;

/// Longest line accepted before the body is treated as malformed
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Splits a chunked byte body into text lines.
///
/// A line ends at `\n`, `\r` or `\r\n`, including a `\r\n` pair split across
/// two chunks. Bytes are buffered until a terminator arrives, so multi-byte
/// UTF-8 sequences split across network chunks decode correctly. Empty lines
/// are skipped.
#[derive(Debug)]
pub struct LineSplitter {
    buffer: BytesMut,
    // Bytes of `buffer` already searched without finding a terminator
    scanned: usize,
    // Previous line ended in `\r`; a leading `\n` belongs to it
    pending_lf: bool,
    max_line_length: usize,
}

impl Default for LineSplitter {
    fn default() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl LineSplitter {
    /// Create an empty splitter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a splitter that refuses lines longer than `max_line_length` bytes
    #[must_use]
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            scanned: 0,
            pending_lf: false,
            max_line_length,
        }
    }

    /// Append a chunk and drain every complete line it finishes.
    ///
    /// # Errors
    /// Returns error if an unterminated line grows past the length limit
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, GatewayError> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        loop {
            if self.pending_lf && !self.buffer.is_empty() {
                if self.buffer[0] == b'\n' {
                    self.buffer.advance(1);
                }
                self.pending_lf = false;
            }

            let found = self.buffer[self.scanned..]
                .iter()
                .position(|b| *b == b'\n' || *b == b'\r');

            let Some(offset) = found else {
                self.scanned = self.buffer.len();
                break;
            };

            let line = self.buffer.split_to(self.scanned + offset);
            self.pending_lf = self.buffer[0] == b'\r';
            self.buffer.advance(1);
            self.scanned = 0;

            if let Some(line) = decode(&line) {
                lines.push(line);
            }
        }

        if self.buffer.len() > self.max_line_length {
            return Err(GatewayError::upstream_protocol(format!(
                "Upstream line exceeds {} bytes",
                self.max_line_length
            )));
        }

        Ok(lines)
    }

    /// Flush the unterminated remainder at end of body
    pub fn finish(&mut self) -> Option<String> {
        let rest = self.buffer.split();
        self.scanned = 0;
        self.pending_lf = false;
        decode(&rest)
    }
}

fn decode(raw: &[u8]) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(raw).into_owned())
}
