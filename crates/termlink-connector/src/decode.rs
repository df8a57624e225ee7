//! Incremental UTF-8 decoding of backend output.

use std::collections::VecDeque;
use std::io::{self, Read};

/// Bytes requested from the inner reader per read.
const READ_CHUNK: usize = 4096;

/// Reads bytes from `R` and hands out decoded characters.
///
/// Multi-byte sequences split across reads are carried over, invalid bytes
/// become U+FFFD, and characters that do not fit the caller's buffer are
/// kept for the next call.
pub struct Utf8Reader<R> {
    inner: R,
    partial: Vec<u8>,
    decoded: VecDeque<char>,
}

impl<R: Read> Utf8Reader<R> {
    /// Wrap a byte reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            partial: Vec::new(),
            decoded: VecDeque::new(),
        }
    }

    /// Read at least one character into `buf`, blocking as needed.
    ///
    /// Returns 0 only when `buf` is empty or the inner reader is exhausted.
    pub fn read_chars(&mut self, buf: &mut [char]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut chunk = [0u8; READ_CHUNK];
        while self.decoded.is_empty() {
            let n = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                if self.partial.is_empty() {
                    return Ok(0);
                }
                // Truncated sequence at end of stream
                self.partial.clear();
                self.decoded.push_back(char::REPLACEMENT_CHARACTER);
                break;
            }
            self.decode(&chunk[..n]);
        }

        let count = buf.len().min(self.decoded.len());
        for (slot, ch) in buf.iter_mut().zip(self.decoded.drain(..count)) {
            *slot = ch;
        }
        Ok(count)
    }

    /// Number of decoded characters waiting to be handed out.
    pub fn buffered(&self) -> usize {
        self.decoded.len()
    }

    /// Unwrap the inner reader, discarding buffered data.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn decode(&mut self, bytes: &[u8]) {
        let mut data = std::mem::take(&mut self.partial);
        data.extend_from_slice(bytes);

        let mut rest = &data[..];
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.decoded.extend(text.chars());
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        self.decoded.extend(text.chars());
                    }
                    match e.error_len() {
                        Some(len) => {
                            self.decoded.push_back(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.partial = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl<R> std::fmt::Debug for Utf8Reader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Utf8Reader")
            .field("partial", &self.partial.len())
            .field("decoded", &self.decoded.len())
            .finish_non_exhaustive()
    }
}
