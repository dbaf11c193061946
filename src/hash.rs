// src/hash.rs

//! Streaming SHA-256 passthrough
//!
//! [`HashingReader`] forwards bytes unchanged while maintaining a running
//! SHA-256 over exactly the bytes observed. It sits at the bottom of the
//! install pipeline, below the decompressor, so the digest covers the
//! compressed wire payload rather than the extracted contents.
//!
//! Memory use is O(digest block), never O(payload): the hasher state is
//! updated per read, nothing is buffered.

use sha2::{Digest, Sha256};
use std::io::{self, Read};

/// A reader that tees every byte through a SHA-256 state.
///
/// Read errors propagate without touching the digest, so a failed stream
/// never finalizes to a plausible-looking hash.
pub struct HashingReader<R> {
    inner: R,
    hasher: Sha256,
    bytes: u64,
}

impl<R: Read> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            bytes: 0,
        }
    }

    /// Consume the reader, returning the lowercase-hex digest and the total
    /// number of bytes observed.
    pub fn finalize(self) -> (String, u64) {
        (format!("{:x}", self.hasher.finalize()), self.bytes)
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes += n as u64;
        }
        Ok(n)
    }
}

/// Render the canonical digest line: `"<hex>  <filename>\n"` (two spaces).
///
/// This exact format is published remotely as the `.sha256` sibling
/// resource, written locally as the `CHECKSUM` marker file, and compared by
/// strict string equality. Any drift here breaks re-install detection.
pub fn digest_line(digest: &str, filename: &str) -> String {
    format!("{digest}  {filename}\n")
}
