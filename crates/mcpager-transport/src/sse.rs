//! Server-Sent Events (SSE) line decoder.
//!
//! Splits raw bytes from an HTTP response into lines and extracts the payload
//! of every `data:` line. Each data line carries one JSON-RPC message.

/// Incremental decoder that turns byte chunks into `data:` payloads.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and return the payloads of any complete data lines.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = Self::parse_line(&line) {
                payloads.push(data);
            }
        }

        payloads
    }

    /// Flush a trailing line that the stream ended without terminating.
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buffer);
        Self::parse_line(&line)
    }

    fn parse_line(raw: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches(['\n', '\r']);

        // Comments, blank separators and non-data fields (event, id, retry)
        let data = line.strip_prefix("data:")?;
        let data = data.trim();
        if data.is_empty() {
            return None;
        }
        Some(data.to_string())
    }
}
