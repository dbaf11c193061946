// src/install.rs

//! Install transaction
//!
//! The all-or-nothing download→verify→extract→replace sequence for one
//! artifact. The stream is hashed (compressed bytes), decompressed,
//! re-chunked, and unpacked into a fresh staging directory; only after the
//! computed digest matches the published digest line does the transaction
//! touch the install root. Ordering is the transaction's one correctness
//! guarantee: digest finalize, then compare, then any destructive mutation.
//!
//! The install root is replaced under an exclusive advisory lock using
//! rename-aside: the old root is renamed out of the way, staging renamed
//! into place, and the aside copy deleted only once the move succeeded (or
//! restored when it did not). Staging directories are removed on every
//! failure path; an interrupted process may leave one behind, which is
//! harmless and visible (`.staging-*`).

use crate::artifact::Artifact;
use crate::chunk::BlockReader;
use crate::error::{Error, Result};
use crate::extract::{Decoder, unpack_archive};
use crate::hash::{HashingReader, digest_line};
use crate::state::{self, CHECKSUM_FILE};
use fs2::FileExt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use tar::Archive;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Result of a completed install transaction.
#[derive(Debug)]
pub struct InstallOutcome {
    /// Verified SHA-256 of the compressed archive, lowercase hex.
    pub digest: String,
    /// Compressed bytes consumed from the stream.
    pub bytes: u64,
    /// Archive entries written into the install root.
    pub entries: usize,
}

/// Run the install transaction for `artifact` over an already-open archive
/// byte stream.
///
/// `expected_line` is the published digest line (`"<hex>  <filename>\n"`);
/// comparison is strict string equality. On any failure before the final
/// replace, the existing install root is untouched.
pub fn install_stream<R: Read>(
    reader: R,
    artifact: &Artifact,
    expected_line: &str,
) -> Result<InstallOutcome> {
    let root = &artifact.install_root;
    let parent = root.parent().ok_or_else(|| {
        Error::InitError(format!("Install root {} has no parent", root.display()))
    })?;
    fs::create_dir_all(parent)
        .map_err(|e| Error::IoError(format!("Failed to create {}: {e}", parent.display())))?;

    // Staging lives next to the install root so the final rename never
    // crosses a filesystem boundary.
    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(parent)
        .map_err(|e| Error::IoError(format!("Failed to create staging directory: {e}")))?;
    debug!("Staging {} in {}", artifact.name, staging.path().display());

    // hash (compressed bytes) -> decompress -> re-chunk -> unpack
    let hashing = HashingReader::new(reader);
    let decoder = Decoder::new(hashing, artifact.codec);
    let mut archive = Archive::new(BlockReader::new(decoder));

    let entries = unpack_archive(&mut archive, staging.path(), artifact.strip)?;

    // Unwind the stage chain and drain whatever the decompressor left
    // unconsumed (stream trailers, padding) so the digest covers the whole
    // wire payload.
    let mut hashing = archive.into_inner().into_inner().into_inner();
    io::copy(&mut hashing, &mut io::sink())
        .map_err(|e| Error::DownloadError(format!("Failed to read artifact stream: {e}")))?;
    let (digest, bytes) = hashing.finalize();

    let actual_line = digest_line(&digest, artifact.archive_filename());
    if actual_line != expected_line {
        // Staging is removed by TempDir drop; the install root was never
        // touched.
        return Err(Error::ChecksumMismatch {
            artifact: artifact.name.clone(),
            expected: expected_line.to_string(),
            actual: actual_line,
        });
    }

    fs::write(staging.path().join(CHECKSUM_FILE), &actual_line)
        .map_err(|e| Error::IoError(format!("Failed to write digest marker: {e}")))?;

    replace_root(staging, root)?;

    info!(
        "Installed {} ({} bytes, {} entries) into {}",
        artifact.name,
        bytes,
        entries,
        root.display()
    );
    Ok(InstallOutcome {
        digest,
        bytes,
        entries,
    })
}

/// Replace `root` with the staged directory under an exclusive lock.
///
/// Rename-aside keeps the previous install recoverable: if the final move
/// fails, the old root is restored and the staged tree removed.
fn replace_root(staging: TempDir, root: &Path) -> Result<()> {
    let parent = root
        .parent()
        .ok_or_else(|| Error::MoveError(format!("{} has no parent", root.display())))?;
    let name = root
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::MoveError(format!("{} has no usable name", root.display())))?;

    let lock_path = parent.join(format!(".{name}.lock"));
    let lock = File::create(&lock_path)
        .map_err(|e| Error::MoveError(format!("Failed to open lock file: {e}")))?;
    lock.lock_exclusive()
        .map_err(|e| Error::MoveError(format!("Failed to lock {}: {e}", lock_path.display())))?;
    // Held for the critical section below; released when `lock` drops.

    let aside = if root.exists() {
        let aside = parent.join(format!(".{name}.old-{}", std::process::id()));
        fs::rename(root, &aside).map_err(|e| {
            Error::MoveError(format!("Failed to set aside {}: {e}", root.display()))
        })?;
        Some(aside)
    } else {
        None
    };

    let staged = staging.into_path();
    match fs::rename(&staged, root) {
        Ok(()) => {
            if let Some(aside) = aside {
                let _ = fs::remove_dir_all(&aside);
            }
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_dir_all(&staged);
            if let Some(aside) = aside {
                if let Err(restore) = fs::rename(&aside, root) {
                    warn!(
                        "Could not restore previous install at {}: {}",
                        root.display(),
                        restore
                    );
                }
            }
            Err(Error::MoveError(format!(
                "Failed to move staged artifact to {}: {e}",
                root.display()
            )))
        }
    }
}

/// Where artifact bytes and their published digests come from.
///
/// The HTTP client is the production implementation; tests substitute local
/// fixtures so the skip/install decision can be exercised without a network.
pub trait ArtifactSource {
    type Stream: Read;

    /// Fetch the published digest line for this artifact.
    fn published_digest(&self, artifact: &Artifact) -> Result<String>;

    /// Open the archive byte stream.
    fn open_archive(&self, artifact: &Artifact) -> Result<Self::Stream>;
}

/// Fetch the published digest, decide skip/install, and run the transaction
/// when needed.
///
/// Returns `true` when a fresh install happened, `false` for the
/// already-installed no-op. A valid existing install is never re-downloaded.
pub fn ensure_installed<S: ArtifactSource>(source: &S, artifact: &Artifact) -> Result<bool> {
    let expected = source
        .published_digest(artifact)
        .map_err(|e| attributed(artifact, e))?;

    let current = state::check(artifact, Some(&expected));
    if current.exists && current.checked {
        info!("{} already installed", artifact.name);
        return Ok(false);
    }
    if current.exists {
        info!("Updating {}", artifact.name);
    } else {
        info!("Installing {}", artifact.name);
    }

    let reader = source
        .open_archive(artifact)
        .map_err(|e| attributed(artifact, e))?;
    install_stream(reader, artifact, &expected).map_err(|e| attributed(artifact, e))?;
    Ok(true)
}

/// Prefix string-bearing pipeline errors with the artifact name so the
/// caller sees a single attributed failure.
fn attributed(artifact: &Artifact, err: Error) -> Error {
    match err {
        Error::DownloadError(m) => Error::DownloadError(format!("{}: {m}", artifact.name)),
        Error::ExtractError(m) => Error::ExtractError(format!("{}: {m}", artifact.name)),
        Error::MoveError(m) => Error::MoveError(format!("{}: {m}", artifact.name)),
        Error::IoError(m) => Error::IoError(format!("{}: {m}", artifact.name)),
        other => other,
    }
}
