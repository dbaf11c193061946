// tests/common/mod.rs

//! Shared fixture builders for integration tests.
//!
//! Archives are synthesized in memory: a tar is built entry by entry, then
//! compressed with the codec under test. Digest lines are computed over the
//! compressed bytes, matching what a mirror would publish.

use sha2::{Digest, Sha256};
use std::io::Write;

/// Build an in-memory tar from (path, contents) pairs. Paths ending in `/`
/// become directory entries.
pub fn make_tar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        if path.ends_with('/') {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            header.set_mode(0o755);
        } else {
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
        }
        header.set_cksum();
        builder.append_data(&mut header, path, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn bzip2(data: &[u8]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Multi-stream bzip2: the payload split into two independently compressed
/// streams, concatenated, the way parallel bzip2 produces SDK archives.
pub fn bzip2_multistream(data: &[u8]) -> Vec<u8> {
    let (first, second) = data.split_at(data.len() / 2);
    let mut out = bzip2(first);
    out.extend_from_slice(&bzip2(second));
    out
}

/// SHA-256 of `payload`, lowercase hex.
pub fn sha256_hex(payload: &[u8]) -> String {
    format!("{:x}", Sha256::digest(payload))
}

/// The published digest line for a compressed payload.
pub fn published_line(payload: &[u8], filename: &str) -> String {
    crossforge::digest_line(&sha256_hex(payload), filename)
}
