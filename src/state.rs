// src/state.rs

//! Install-state inspection
//!
//! State is derived, never stored: each query re-reads the `CHECKSUM`
//! marker file directly inside the install root. Absence of the marker
//! means "not installed" regardless of whatever else the directory holds.
//! An unreadable marker (missing root, missing file, permission error) is a
//! fallback state, not a propagated failure; state checks never throw for
//! "absent" conditions.

use crate::artifact::Artifact;
use std::fs;
use std::path::{Path, PathBuf};

/// Digest marker filename written directly inside every install root.
pub const CHECKSUM_FILE: &str = "CHECKSUM";

/// Derived install state for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallState {
    /// Marker file was readable.
    pub exists: bool,
    /// Marker contents equal the expected digest line, byte for byte.
    /// Always false when no expected line was supplied.
    pub checked: bool,
    /// The install root that was inspected.
    pub path: PathBuf,
}

/// Inspect an install root against an optional expected digest line.
///
/// Comparison is strict string equality against the marker file's full
/// contents; the digest line format is fixed (see [`crate::hash::digest_line`]).
pub fn check_root(install_root: &Path, expected_line: Option<&str>) -> InstallState {
    let marker = install_root.join(CHECKSUM_FILE);
    match fs::read_to_string(&marker) {
        Ok(contents) => InstallState {
            exists: true,
            checked: expected_line.is_some_and(|expected| contents == expected),
            path: install_root.to_path_buf(),
        },
        Err(_) => InstallState {
            exists: false,
            checked: false,
            path: install_root.to_path_buf(),
        },
    }
}

/// Inspect an artifact's install root.
pub fn check(artifact: &Artifact, expected_line: Option<&str>) -> InstallState {
    check_root(&artifact.install_root, expected_line)
}
