// src/artifact.rs

//! Artifact model and source locations
//!
//! Exactly two artifact kinds exist: the cross-compilation SDK, keyed by
//! host platform, and the Rust standard-library bundle, keyed by the active
//! `rustc` version. Source URLs are fixed; each has a sibling digest
//! resource at `<url>.sha256`.

use crate::error::{Error, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Default download mirror; override with `CROSSFORGE_MIRROR`.
pub const DEFAULT_MIRROR: &str = "https://dl.crossforge.dev";

/// The two installable artifact kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Cross-compilation SDK (compiler, binutils, sysroot).
    Sdk,
    /// Standard-library bundle matching one `rustc` version.
    Rustlib,
}

impl ArtifactKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sdk => "sdk",
            Self::Rustlib => "rustlib",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Compression codec of an artifact archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Multi-stream bzip2 (SDK archives are produced by parallel bzip2).
    Bzip2,
    /// Single-stream gzip (stdlib bundles).
    Gzip,
}

impl Codec {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bzip2 => "bzip2",
            Self::Gzip => "gzip",
        }
    }
}

/// One installable unit: where it comes from, where it lands, and how its
/// archive is shaped.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Display name used in logs and error attribution.
    pub name: String,
    /// Archive source URL. The digest resource lives at `<url>.sha256`.
    pub url: String,
    /// Directory this artifact installs into. Contains the `CHECKSUM`
    /// marker file when installed.
    pub install_root: PathBuf,
    /// Leading path components discarded from every archive entry.
    pub strip: usize,
    pub codec: Codec,
}

impl Artifact {
    /// The SDK artifact for the current host platform.
    ///
    /// SDK archives are published with a nested top-level wrapper directory,
    /// hence the 2-component strip.
    pub fn sdk(config: &Config) -> Result<Self> {
        let platform = host_platform_key()?;
        let filename = format!("crossforge-sdk-{platform}.tar.bz2");
        Ok(Self {
            kind: ArtifactKind::Sdk,
            name: format!("sdk ({platform})"),
            url: format!("{}/sdk/{platform}/{filename}", config.mirror),
            install_root: config.base_dir.join("sdk").join(platform),
            strip: 2,
            codec: Codec::Bzip2,
        })
    }

    /// The stdlib bundle for a specific `rustc` version.
    pub fn rustlib(config: &Config, version: &str) -> Self {
        let filename = format!("crossforge-rustlib-{version}.tar.gz");
        Self {
            kind: ArtifactKind::Rustlib,
            name: format!("rustlib {version}"),
            url: format!("{}/rustlib/{filename}", config.mirror),
            install_root: config.base_dir.join("rustlib").join(version),
            strip: 0,
            codec: Codec::Gzip,
        }
    }

    /// Sibling URL of the published digest line.
    pub fn digest_url(&self) -> String {
        format!("{}.sha256", self.url)
    }

    /// Archive filename, as it appears in the digest line.
    pub fn archive_filename(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or(&self.url)
    }
}

/// Platform key for the SDK source location and install root.
pub fn host_platform_key() -> Result<&'static str> {
    match (env::consts::OS, env::consts::ARCH) {
        ("linux", "x86_64") => Ok("linux-x86_64"),
        ("linux", "aarch64") => Ok("linux-aarch64"),
        ("macos", "x86_64") => Ok("darwin-x86_64"),
        ("macos", "aarch64") => Ok("darwin-aarch64"),
        (os, arch) => Err(Error::InitError(format!(
            "Unsupported host platform {os}-{arch}; SDK builds exist for \
             linux-x86_64, linux-aarch64, darwin-x86_64, darwin-aarch64"
        ))),
    }
}

/// Resolved runtime configuration: install base directory and mirror.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory holding the `sdk/` and `rustlib/` install roots.
    pub base_dir: PathBuf,
    /// Download mirror base URL (no trailing slash).
    pub mirror: String,
}

impl Config {
    /// Resolve from the environment: `CROSSFORGE_HOME` and
    /// `CROSSFORGE_MIRROR`, with home-relative defaults.
    pub fn from_env() -> Result<Self> {
        let base_dir = match env::var_os("CROSSFORGE_HOME") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .ok_or_else(|| {
                    Error::InitError(
                        "Cannot determine home directory; set CROSSFORGE_HOME".to_string(),
                    )
                })?
                .join(".crossforge"),
        };
        let mirror = env::var("CROSSFORGE_MIRROR")
            .unwrap_or_else(|_| DEFAULT_MIRROR.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self { base_dir, mirror })
    }

    /// Config rooted at an explicit directory (tests, alternate installs).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            mirror: DEFAULT_MIRROR.to_string(),
        }
    }
}
