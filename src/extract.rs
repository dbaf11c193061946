// src/extract.rs

//! Streaming archive extraction
//!
//! Decompresses an artifact byte stream (bzip2 or gzip) and unpacks it as a
//! tar archive, discarding a configurable number of leading path components
//! from every entry. Entry paths come from an untrusted archive, so they are
//! sanitized before touching the filesystem: `..` components are rejected,
//! absolute prefixes stripped, and any entry that normalizes to the
//! destination root itself is skipped (some archives carry a
//! self-referential root entry).

use crate::artifact::Codec;
use crate::error::{Error, Result};
use bzip2::read::MultiBzDecoder;
use flate2::read::GzDecoder;
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use tracing::{debug, trace};

/// Codec-selected decompressing reader.
///
/// A concrete enum rather than `Box<dyn Read>` so the install transaction
/// can unwind the stage chain after unpack and drain trailing compressed
/// bytes through the hasher underneath.
pub enum Decoder<R: Read> {
    /// Multi-stream bzip2: SDK archives are produced by parallel bzip2 and
    /// contain several concatenated streams; a single-stream decoder would
    /// stop after the first.
    Bzip2(MultiBzDecoder<R>),
    Gzip(GzDecoder<R>),
}

impl<R: Read> Decoder<R> {
    pub fn new(inner: R, codec: Codec) -> Self {
        match codec {
            Codec::Bzip2 => Self::Bzip2(MultiBzDecoder::new(inner)),
            Codec::Gzip => Self::Gzip(GzDecoder::new(inner)),
        }
    }

    /// Recover the wrapped reader.
    pub fn into_inner(self) -> R {
        match self {
            Self::Bzip2(d) => d.into_inner(),
            Self::Gzip(d) => d.into_inner(),
        }
    }
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Bzip2(d) => d.read(buf),
            Self::Gzip(d) => d.read(buf),
        }
    }
}

/// Sanitize an archive entry path and apply the strip count.
///
/// Returns `Ok(None)` when nothing remains after stripping, in which case
/// the entry is skipped. `..` components fail with [`Error::PathTraversal`]; `.`,
/// root markers, and prefixes are dropped.
fn stripped_entry_path(raw: &Path, strip: usize) -> Result<Option<PathBuf>> {
    let mut components = Vec::new();
    for component in raw.components() {
        match component {
            Component::Normal(c) => components.push(c),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                return Err(Error::PathTraversal(raw.display().to_string()));
            }
        }
    }

    if components.len() <= strip {
        return Ok(None);
    }

    let mut path = PathBuf::new();
    for c in &components[strip..] {
        path.push(c);
    }
    Ok(Some(path))
}

/// Unpack a tar archive into `dest`, stripping `strip` leading path
/// components from every entry.
///
/// Returns the number of entries written. The archive reader pulls the whole
/// upstream pipeline (re-chunker, decompressor, hasher) as entries are
/// consumed.
pub fn unpack_archive<R: Read>(
    archive: &mut Archive<R>,
    dest: &Path,
    strip: usize,
) -> Result<usize> {
    let entries = archive
        .entries()
        .map_err(|e| Error::ExtractError(format!("Failed to read archive: {e}")))?;

    let mut written = 0usize;
    for entry in entries {
        let mut entry =
            entry.map_err(|e| Error::ExtractError(format!("Failed to read archive entry: {e}")))?;

        let raw_path = entry
            .path()
            .map_err(|e| Error::ExtractError(format!("Invalid entry path: {e}")))?
            .into_owned();

        let Some(rel) = stripped_entry_path(&raw_path, strip)? else {
            trace!("Skipping entry {} (nothing left after strip)", raw_path.display());
            continue;
        };

        let target = dest.join(&rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::ExtractError(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        entry.unpack(&target).map_err(|e| {
            Error::ExtractError(format!("Failed to unpack {}: {e}", raw_path.display()))
        })?;
        written += 1;
    }

    debug!("Unpacked {} entries into {}", written, dest.display());
    Ok(written)
}
