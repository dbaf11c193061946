// src/builder.rs

//! Build orchestration
//!
//! Thin collaborator around the external build tool: assembles the
//! environment overlay from a resolved [`BuildConfig`], invokes `cargo`
//! with inherited stdio, queries its metadata, and packs built binaries
//! into an uncompressed bundle archive.
//!
//! A non-zero exit from the build tool is a fatal, non-recoverable
//! condition, but nothing here terminates the process: failures surface as
//! [`Error::BuildProcessExit`] and only the binary entry point converts
//! that into an exit status.

use crate::error::{Error, Result};
use crate::toolchain::BuildConfig;
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{debug, info};

/// Environment variable naming the target library directory.
pub const LIB_DIR_VAR: &str = "CROSSFORGE_LIB_DIR";

/// Environment variable naming the SDK staging directory.
pub const STAGING_DIR_VAR: &str = "STAGING_DIR";

/// Compute the environment overlay for a build invocation.
///
/// Prepends the toolchain's `bin/` to the search path, exports the target
/// library directory plus a `-L` compiler flag referencing it, and names
/// the SDK staging directory. Existing `PATH`/`RUSTFLAGS` values are
/// extended, not clobbered.
fn env_overlay(
    config: &BuildConfig,
    current_path: Option<&str>,
    current_rustflags: Option<&str>,
) -> Vec<(&'static str, String)> {
    let bin_dir = config.toolchain_dir.join("bin");
    let path = match current_path {
        Some(existing) if !existing.is_empty() => {
            format!("{}:{existing}", bin_dir.display())
        }
        _ => bin_dir.display().to_string(),
    };

    let lib_flag = format!("-L {}", config.rustlib_dir.display());
    let rustflags = match current_rustflags {
        Some(existing) if !existing.is_empty() => format!("{existing} {lib_flag}"),
        _ => lib_flag,
    };

    let staging = config
        .toolchain_dir
        .parent()
        .unwrap_or(&config.toolchain_dir)
        .display()
        .to_string();

    vec![
        ("PATH", path),
        ("RUSTFLAGS", rustflags),
        (LIB_DIR_VAR, config.rustlib_dir.display().to_string()),
        (STAGING_DIR_VAR, staging),
    ]
}

fn apply_overlay(cmd: &mut Command, config: &BuildConfig) {
    let path = env::var("PATH").ok();
    let rustflags = env::var("RUSTFLAGS").ok();
    for (key, value) in env_overlay(config, path.as_deref(), rustflags.as_deref()) {
        cmd.env(key, value);
    }
}

/// Map a child exit status to the crate error contract.
fn check_status(tool: &str, status: ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(Error::BuildProcessExit {
            tool: tool.to_string(),
            code: status.code().unwrap_or(1),
        })
    }
}

/// Invoke the external build tool for one binary target.
///
/// Runs `cargo build --release --target <triple> --bin <name>` with the
/// environment overlay and inherited stdio so compiler output stays
/// interactive. Exit status 0 resolves; anything else is the Fatal
/// build-process variant carrying the child's code.
pub fn build(config: &BuildConfig, binary: &str) -> Result<()> {
    info!(
        "Building {} for {} (toolchain {})",
        binary,
        config.target,
        config.toolchain_dir.display()
    );

    let mut cmd = Command::new("cargo");
    cmd.args(["build", "--release", "--target", config.target, "--bin", binary]);
    apply_overlay(&mut cmd, config);

    let status = cmd
        .status()
        .map_err(|e| Error::IoError(format!("Failed to run cargo: {e}")))?;
    check_status("cargo", status)
}

/// Workspace metadata returned by the build tool's metadata query.
#[derive(Debug, Deserialize)]
pub struct Metadata {
    pub target_directory: PathBuf,
    pub packages: Vec<MetadataPackage>,
}

#[derive(Debug, Deserialize)]
pub struct MetadataPackage {
    pub name: String,
    pub version: String,
}

/// Run the no-dependencies metadata query and parse its stdout.
pub fn metadata() -> Result<Metadata> {
    let output = Command::new("cargo")
        .args(["metadata", "--no-deps", "--format-version", "1"])
        .output()
        .map_err(|e| Error::IoError(format!("Failed to run cargo metadata: {e}")))?;

    check_status("cargo metadata", output.status)?;

    serde_json::from_slice(&output.stdout)
        .map_err(|e| Error::ParseError(format!("Invalid cargo metadata output: {e}")))
}

/// Human-readable label of the workspace package being bundled.
fn package_label(meta: &Metadata) -> Option<String> {
    meta.packages
        .first()
        .map(|p| format!("{} {}", p.name, p.version))
}

/// Pack one built binary into an uncompressed tar next to it.
pub fn bundle(config: &BuildConfig, binary: &str) -> Result<PathBuf> {
    let meta = metadata()?;
    if let Some(label) = package_label(&meta) {
        info!("Bundling {binary} from {label}");
    }
    let built = meta
        .target_directory
        .join(config.target)
        .join("release")
        .join(binary);

    if !built.is_file() {
        return Err(Error::NotFoundError(format!(
            "{} does not exist; run `crossforge build {binary}` first",
            built.display()
        )));
    }

    write_bundle(&built, binary)
}

/// Write `<binary>.tar` next to the built file, containing exactly that one
/// file under its bare name.
fn write_bundle(built: &Path, name: &str) -> Result<PathBuf> {
    let out_path = built.with_extension("tar");
    let out = File::create(&out_path)
        .map_err(|e| Error::IoError(format!("Failed to create {}: {e}", out_path.display())))?;

    let mut builder = tar::Builder::new(out);
    builder
        .append_path_with_name(built, name)
        .map_err(|e| Error::IoError(format!("Failed to add {name} to bundle: {e}")))?;
    builder
        .finish()
        .map_err(|e| Error::IoError(format!("Failed to finish bundle: {e}")))?;

    debug!("Bundled {} into {}", name, out_path.display());
    Ok(out_path)
}
