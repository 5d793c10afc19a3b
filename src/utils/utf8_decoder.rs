//! UTF-8 decoding across chunk boundaries
//!
//! HTTP body chunks are cut at arbitrary byte offsets, so a multi-byte
//! character may be split between two chunks. The decoder holds back an
//! incomplete trailing sequence until the next chunk completes it.

/// Incremental UTF-8 decoder.
///
/// Invalid sequences are replaced with U+FFFD, matching a lossy text decoder.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, returning all text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        None => {
                            // incomplete sequence at the end; wait for more bytes
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Flush whatever is held back. An incomplete sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }

    /// Number of bytes waiting for the rest of their character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_split_multibyte_character() {
        let bytes = "héllo €".as_bytes();
        // split inside 'é' (2 bytes) and inside '€' (3 bytes)
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        out.push_str(&decoder.decode(&bytes[..2]));
        assert_eq!(decoder.pending_len(), 1);
        out.push_str(&decoder.decode(&bytes[2..8]));
        out.push_str(&decoder.decode(&bytes[8..]));
        out.push_str(&decoder.finish());
        assert_eq!(out, "héllo €");
    }

    #[test]
    fn byte_at_a_time() {
        let text = "日本語 ok";
        let mut decoder = Utf8StreamDecoder::new();
        let out: String = text.as_bytes().iter().map(|b| decoder.decode(&[*b])).collect();
        assert_eq!(out, text);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn truncated_sequence_flushes_as_replacement() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&"€".as_bytes()[..2]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }
}
