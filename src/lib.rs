// src/lib.rs

//! Crossforge toolchain manager
//!
//! Installs and verifies the two binary artifacts needed to build firmware
//! for MIPS-class devices (the cross-compilation SDK and the Rust
//! standard-library bundle for the active compiler), then drives the build
//! tool with the matching environment.
//!
//! # Architecture
//!
//! - Install pipeline: streaming hash → decompress → re-chunk → unpack,
//!   staged in a temp directory and atomically swapped into place only
//!   after the digest verifies
//! - Derived state: "installed" means a `CHECKSUM` marker file whose
//!   contents equal the published digest line, re-read on every query
//! - Fatal build failures propagate as a typed error; only the binary
//!   entry point converts errors into process exits

pub mod artifact;
pub mod builder;
pub mod chunk;
pub mod client;
mod error;
pub mod extract;
pub mod hash;
pub mod install;
pub mod state;
pub mod toolchain;

pub use artifact::{Artifact, ArtifactKind, Codec, Config};
pub use chunk::{BLOCK_SIZE, BlockReader};
pub use client::HttpClient;
pub use error::{Error, Result};
pub use hash::{HashingReader, digest_line};
pub use install::{ArtifactSource, InstallOutcome, ensure_installed, install_stream};
pub use state::{CHECKSUM_FILE, InstallState};
pub use toolchain::{BuildConfig, TARGET_TRIPLE, resolve_build_config};
