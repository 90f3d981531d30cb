use encoding_rs::{Decoder, UTF_8};

/// Prefix of every payload line in a streamed record.
pub const DATA_MARKER: &str = "data:";

const RECORD_SEPARATOR: &str = "\n\n";

/// Incremental splitter for blank-line separated event records.
///
/// Bytes are decoded as UTF-8 with a streaming decoder, so a multi-byte
/// sequence cut by a chunk boundary is completed by the next chunk. The
/// buffer belongs to one response body and is dropped with it.
pub struct SseDecoder {
    decoder: Decoder,
    buffer: String,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder(),
            buffer: String::new(),
        }
    }

    /// Appends a chunk and returns every record it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode(chunk, false);
        self.take_complete_records()
    }

    /// Flushes the decoder and drops any unterminated trailing record.
    /// Returns the number of bytes discarded.
    pub fn finish(mut self) -> usize {
        self.decode(&[], true);
        let leftover = self.buffer.trim();
        leftover.len()
    }

    /// Bytes held back waiting for a record separator.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    fn decode(&mut self, bytes: &[u8], last: bool) {
        let needed = self
            .decoder
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or(bytes.len() * 3 + 4);
        self.buffer.reserve(needed);
        let _ = self.decoder.decode_to_string(bytes, &mut self.buffer, last);

        // "\r\n" split across chunks leaves a trailing '\r' that is fixed up
        // once the '\n' arrives.
        if self.buffer.contains("\r\n") {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }
    }

    fn take_complete_records(&mut self) -> Vec<String> {
        let Some(last) = self.buffer.rfind(RECORD_SEPARATOR) else {
            return Vec::new();
        };
        let complete: String = self.buffer.drain(..last + RECORD_SEPARATOR.len()).collect();
        complete
            .split(RECORD_SEPARATOR)
            .map(|record| record.trim_matches('\n'))
            .filter(|record| !record.trim().is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }
}

/// Extracts the payload of a record, or `None` when it does not start with
/// the data marker. Continuation `data:` lines are joined with newlines;
/// other field lines are dropped.
pub fn record_payload(record: &str) -> Option<String> {
    if !record.starts_with(DATA_MARKER) {
        return None;
    }
    let payload = record
        .lines()
        .filter_map(|line| line.strip_prefix(DATA_MARKER))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect::<Vec<_>>()
        .join("\n");
    Some(payload)
}
