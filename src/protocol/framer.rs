//! Line framing
//!
//! Turns a byte stream into newline-terminated text lines. A trailing `\r`
//! is dropped, bytes that are not valid UTF-8 are replaced, and lines longer
//! than the configured limit are skipped up to their terminator instead of
//! being buffered.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// One unit read off a client's stream.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    Line(String),
    /// A line longer than `limit` bytes was read and thrown away.
    Oversized { limit: usize },
}

pub struct LineFramer<R> {
    reader: R,
    max_line_length: Option<usize>,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineFramer<R> {
    pub fn new(reader: R, max_line_length: Option<usize>) -> Self {
        Self {
            reader,
            max_line_length,
            buf: Vec::new(),
        }
    }

    /// Reads the next frame. `Ok(None)` means clean end-of-stream.
    ///
    /// A final line without a terminator is still returned as a line.
    pub async fn next_frame(&mut self) -> io::Result<Option<Frame>> {
        self.buf.clear();
        let mut oversized = false;

        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(self.finish(oversized, !self.buf.is_empty()));
            }

            let (used, terminated) = match available.iter().position(|b| *b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };

            if !oversized {
                self.buf.extend_from_slice(&available[..used]);
                if let Some(limit) = self.max_line_length {
                    if strip_terminator(&self.buf).len() > limit {
                        oversized = true;
                        self.buf.clear();
                    }
                }
            }

            self.reader.consume(used);

            if terminated {
                return Ok(self.finish(oversized, true));
            }
        }
    }

    fn finish(&self, oversized: bool, has_line: bool) -> Option<Frame> {
        if oversized {
            return self.max_line_length.map(|limit| Frame::Oversized { limit });
        }
        if !has_line {
            return None;
        }
        let line = String::from_utf8_lossy(strip_terminator(&self.buf)).into_owned();
        Some(Frame::Line(line))
    }
}

fn strip_terminator(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}
