// src/chunk.rs

//! Fixed-size stream re-blocking
//!
//! [`BlockReader`] re-chunks an arbitrarily partitioned byte stream into
//! fixed-size blocks. Upstream readers (network sockets, decompressors)
//! return whatever sizes they like; the unpack stage downstream does a fixed
//! amount of work per read regardless. The final block is shorter when the
//! stream length is not a multiple of the block size; it is never padded.

use std::io::{self, Read};

/// Block size for re-chunked streams (32 KiB).
pub const BLOCK_SIZE: usize = 32 * 1024;

/// Reader adapter that serves full fixed-size blocks until end of stream.
///
/// Each `read` fills up to one block from the underlying reader, looping
/// over short upstream reads, so callers observe `block_size` bytes per call
/// except for the final partial block.
pub struct BlockReader<R> {
    inner: R,
    block_size: usize,
}

impl<R: Read> BlockReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_block_size(inner, BLOCK_SIZE)
    }

    pub fn with_block_size(inner: R, block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be non-zero");
        Self { inner, block_size }
    }

    /// Recover the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for BlockReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let want = buf.len().min(self.block_size);
        let mut filled = 0;
        while filled < want {
            match self.inner.read(&mut buf[filled..want]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}
