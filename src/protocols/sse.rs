// Server-sent events framing for the OpenAI-compatible chat stream.

use crate::thought_parser::StreamError;

/// Payload marking the end of the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Payload of a `data:` line.
    Data(String),
    /// `data: [DONE]`
    Done,
}

/// Splits incoming byte chunks into SSE `data:` events.
///
/// Bytes are buffered until a complete line is available, so lines and
/// multi-byte characters split across chunks are reassembled before decoding.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk to the buffer
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
    }

    /// Extract the next event from the buffered complete lines.
    ///
    /// Lines that are not valid UTF-8 are consumed and reported as
    /// [`StreamError::MalformedFragment`]; decoding can continue afterwards.
    pub fn next_event(&mut self) -> Option<Result<SseEvent, StreamError>> {
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(event) = Self::decode_line(&line[..pos]) {
                return Some(event);
            }
        }
        None
    }

    /// Check if there's remaining content in the buffer
    pub fn has_remaining(&self) -> bool {
        self.pending.iter().any(|b| !b.is_ascii_whitespace())
    }

    /// Decode an unterminated trailing line once the byte stream has ended.
    pub fn finish(&mut self) -> Option<Result<SseEvent, StreamError>> {
        let line = std::mem::take(&mut self.pending);
        Self::decode_line(&line)
    }

    fn decode_line(line: &[u8]) -> Option<Result<SseEvent, StreamError>> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let line = match std::str::from_utf8(line) {
            Ok(line) => line.trim(),
            Err(e) => return Some(Err(StreamError::malformed(format!("invalid UTF-8: {e}")))),
        };

        let data = line.strip_prefix("data:")?.trim_start();
        if data == DONE_SENTINEL {
            Some(Ok(SseEvent::Done))
        } else if data.is_empty() {
            None
        } else {
            Some(Ok(SseEvent::Data(data.to_string())))
        }
    }
}
