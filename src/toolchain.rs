// src/toolchain.rs

//! Toolchain and build-config resolution
//!
//! Locates the versioned toolchain directory inside the installed SDK,
//! queries the active `rustc` version, and assembles the read-only
//! [`BuildConfig`] the build orchestrator consumes. Resolution is
//! sequential and short-circuits on the first missing dependency, so a
//! partially usable config is never produced.

use crate::artifact::{Artifact, Config};
use crate::error::{Error, Result};
use crate::state;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Directory-name prefix of the toolchain subdirectory inside the SDK.
pub const TOOLCHAIN_PREFIX: &str = "toolchain-";

/// Target triple the SDK toolchain and stdlib bundles are built for.
pub const TARGET_TRIPLE: &str = "mipsel-unknown-linux-musl";

/// Resolved, read-only view of everything a build invocation needs.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Active `rustc` version string (e.g. "1.93.0").
    pub rustc_version: String,
    /// Versioned toolchain directory inside the SDK root.
    pub toolchain_dir: PathBuf,
    /// Install root of the stdlib bundle matching `rustc_version`.
    pub rustlib_dir: PathBuf,
    /// Target triple passed to the build tool.
    pub target: &'static str,
}

/// Locate the toolchain subdirectory under the SDK root.
///
/// Returns the first entry (directory-listing order) whose name begins with
/// [`TOOLCHAIN_PREFIX`]. The contract when several entries match is "a
/// prefixed match", not a specific one; a warning names the candidates so
/// an ambiguous SDK install is at least visible.
pub fn locate_toolchain(sdk_root: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(sdk_root).map_err(|e| {
        Error::NotFoundError(format!(
            "Cannot read SDK directory {}: {e}",
            sdk_root.display()
        ))
    })?;

    let mut matches: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::IoError(e.to_string()))?;
        if entry.file_name().to_string_lossy().starts_with(TOOLCHAIN_PREFIX) {
            matches.push(entry.path());
        }
    }

    match matches.first() {
        Some(first) => {
            if matches.len() > 1 {
                warn!(
                    "Multiple toolchain directories in {}: {:?}; using {}",
                    sdk_root.display(),
                    matches,
                    first.display()
                );
            }
            debug!("Toolchain at {}", first.display());
            Ok(first.clone())
        }
        None => Err(Error::NotFoundError(format!(
            "No {TOOLCHAIN_PREFIX}* directory under {}; reinstall the SDK with `crossforge install`",
            sdk_root.display()
        ))),
    }
}

/// Query the active `rustc` version.
pub fn active_rustc_version() -> Result<String> {
    let output = Command::new("rustc").arg("--version").output().map_err(|e| {
        Error::NotFoundError(format!(
            "Could not run rustc ({e}); install a Rust toolchain and ensure it is on PATH"
        ))
    })?;

    if !output.status.success() {
        return Err(Error::NotFoundError(
            "rustc --version failed; install a Rust toolchain and ensure it is on PATH".to_string(),
        ));
    }

    parse_rustc_version(&String::from_utf8_lossy(&output.stdout))
}

/// Extract the version token from `rustc --version` output
/// ("rustc 1.93.0 (hash date)" → "1.93.0").
fn parse_rustc_version(output: &str) -> Result<String> {
    output
        .split_whitespace()
        .nth(1)
        .map(str::to_string)
        .ok_or_else(|| Error::ParseError(format!("Unrecognized rustc version output: {output:?}")))
}

/// Sequentially resolve everything a build needs, short-circuiting on the
/// first missing dependency.
///
/// Order: active rustc version → SDK install state → stdlib bundle state
/// for that version → toolchain directory. Each failure carries a
/// remediation hint.
pub fn resolve_build_config(config: &Config) -> Result<BuildConfig> {
    let rustc_version = active_rustc_version()?;

    let sdk = Artifact::sdk(config)?;
    let sdk_state = state::check(&sdk, None);
    if !sdk_state.exists {
        return Err(Error::NotFoundError(
            "SDK not installed; run `crossforge install`".to_string(),
        ));
    }

    let rustlib = Artifact::rustlib(config, &rustc_version);
    let rustlib_state = state::check(&rustlib, None);
    if !rustlib_state.exists {
        return Err(Error::NotFoundError(format!(
            "Standard-library bundle for rustc {rustc_version} not installed; \
             run `crossforge install` (supported compiler versions have published bundles)"
        )));
    }

    let toolchain_dir = locate_toolchain(&sdk_state.path)?;

    Ok(BuildConfig {
        rustc_version,
        toolchain_dir,
        rustlib_dir: rustlib_state.path,
        target: TARGET_TRIPLE,
    })
}
