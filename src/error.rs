// src/error.rs

//! Crate-wide error type
//!
//! A single error enum covering the install pipeline, toolchain resolution,
//! and build orchestration. State checks never produce errors for "absent"
//! conditions; those are reported as non-error states (see `state`).

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Remote digest or archive unavailable (transport failure or non-2xx).
    /// Recoverable by re-running; not automatically retried here.
    #[error("Download failed: {0}")]
    DownloadError(String),

    /// Computed digest disagrees with the published digest. Always fatal to
    /// the transaction; the pre-existing install root is left untouched.
    #[error("Checksum mismatch for {artifact}: expected {expected:?}, got {actual:?}")]
    ChecksumMismatch {
        artifact: String,
        expected: String,
        actual: String,
    },

    /// Decompression or archive unpack failure.
    #[error("Extraction failed: {0}")]
    ExtractError(String),

    /// Final install-root replacement failed.
    #[error("Failed to move artifact into place: {0}")]
    MoveError(String),

    /// Expected local artifact or toolchain missing.
    #[error("{0}")]
    NotFoundError(String),

    /// External build/metadata tool exited non-zero. Fatal by contract:
    /// the binary entry point mirrors the child's exit status and no
    /// component below it may terminate the process directly.
    #[error("{tool} exited with status {code}")]
    BuildProcessExit { tool: String, code: i32 },

    /// Archive entry attempted to escape the destination root.
    #[error("Path traversal attempt: {0}")]
    PathTraversal(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

impl Error {
    /// Process exit code for this error when it reaches the binary boundary.
    ///
    /// Build-tool failures mirror the child's status verbatim; every other
    /// failure is a generic 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::BuildProcessExit { code, .. } => *code,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}
