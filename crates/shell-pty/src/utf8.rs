//! Incremental UTF-8 decoding of pty output.
//!
//! Reads are split at arbitrary byte offsets, so a multi-byte character can
//! straddle two reads. The decoder holds back an incomplete trailing sequence
//! and prepends it to the next chunk instead of emitting U+FFFD for both halves.

/// Longest UTF-8 encoded code point.
const MAX_SEQUENCE: usize = 4;

#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, returning all text that is complete so far.
    ///
    /// Bytes that can never form valid UTF-8 are replaced with U+FFFD.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let keep = incomplete_tail_len(&bytes);
        let tail = bytes.split_off(bytes.len() - keep);
        self.pending = tail;

        match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }

    /// Flush whatever is held back, lossily.
    pub fn finish(&mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&rest).into_owned()
    }
}

/// Length of a trailing, truncated-but-plausible UTF-8 sequence in `bytes`.
fn incomplete_tail_len(bytes: &[u8]) -> usize {
    let start = bytes.len().saturating_sub(MAX_SEQUENCE - 1);
    for i in (start..bytes.len()).rev() {
        let b = bytes[i];
        if b & 0b1100_0000 == 0b1000_0000 {
            // Continuation byte; keep looking for the lead.
            continue;
        }
        let expected = match b {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return 0,
        };
        let have = bytes.len() - i;
        return if have < expected { have } else { 0 };
    }
    0
}
