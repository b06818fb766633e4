//! Incremental decoder for the checkout progress event stream.

use shared::protocol::ProgressEvent;
use tracing::debug;

const FRAME_DELIMITER: &[u8] = b"\n\n";
/// Upper bound on an unterminated frame; larger frames are discarded.
pub const MAX_PENDING_BYTES: usize = 4 * 1024 * 1024;

/// Buffers raw stream bytes and yields typed events for every complete frame.
///
/// Chunk boundaries are arbitrary: a frame, a `\r\n` pair or a multi-byte
/// character may be split across calls to [`ProgressDecoder::push`].
#[derive(Debug, Default)]
pub struct ProgressDecoder {
    buffer: Vec<u8>,
    // Bytes before this offset are known not to start a delimiter.
    scanned: usize,
}

impl ProgressDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<ProgressEvent> {
        self.buffer
            .extend(chunk.iter().copied().filter(|byte| *byte != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_frame_end(&self.buffer, self.scanned) {
            let frame: Vec<u8> = self.buffer.drain(..end + FRAME_DELIMITER.len()).collect();
            self.scanned = 0;
            if let Some(event) = decode_frame(&frame[..end]) {
                events.push(event);
            }
        }
        self.scanned = self
            .buffer
            .len()
            .saturating_sub(FRAME_DELIMITER.len() - 1);

        if self.buffer.len() > MAX_PENDING_BYTES {
            debug!(
                bytes = self.buffer.len(),
                "progress stream: discarding oversized frame"
            );
            self.buffer.clear();
            self.scanned = 0;
        }
        events
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Drops an unterminated trailing frame and returns how many bytes were discarded.
    pub fn finish(&mut self) -> usize {
        let dropped = self.buffer.len();
        if dropped > 0 {
            debug!(bytes = dropped, "progress stream: discarding unterminated frame");
        }
        self.buffer.clear();
        self.scanned = 0;
        dropped
    }
}

fn find_frame_end(buffer: &[u8], from: usize) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(FRAME_DELIMITER.len())
        .position(|window| window == FRAME_DELIMITER)
        .map(|offset| from + offset)
}

fn decode_frame(frame: &[u8]) -> Option<ProgressEvent> {
    let text = match std::str::from_utf8(frame) {
        Ok(text) => text,
        Err(err) => {
            debug!(error = %err, "progress stream: dropping non-utf8 frame");
            return None;
        }
    };

    let mut name = None;
    let mut data = Vec::new();
    for line in text.lines() {
        if let Some(value) = field_value(line, "event") {
            name = Some(value.trim());
        } else if let Some(value) = field_value(line, "data") {
            data.push(value);
        }
    }

    let name = name?;
    if data.is_empty() {
        debug!(event = name, "progress stream: dropping frame without data");
        return None;
    }

    match ProgressEvent::from_named_payload(name, &data.join("\n")) {
        Ok(Some(event)) => Some(event),
        Ok(None) => {
            debug!(event = name, "progress stream: ignoring unrecognized event");
            None
        }
        Err(err) => {
            debug!(event = name, error = %err, "progress stream: dropping malformed payload");
            None
        }
    }
}

fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(field)?.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

#[cfg(test)]
#[path = "tests/sse_tests.rs"]
mod tests;
