// src/client.rs

//! HTTP client for artifact downloads
//!
//! Thin wrapper around a blocking reqwest client. Transport concerns
//! (timeouts, redirects) live here, outside the install pipeline; the
//! pipeline only ever sees a byte stream.

use crate::artifact::Artifact;
use crate::error::{Error, Result};
use crate::install::ArtifactSource;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::{Client, Response};
use reqwest::header::CACHE_CONTROL;
use std::io::{self, Read};
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Fetch the published digest line from `<archive-url>.sha256`.
    ///
    /// Requests an uncached response so a republished artifact is never
    /// compared against a stale digest. The body is returned verbatim;
    /// it is compared byte-for-byte against the local marker file.
    pub fn fetch_digest_line(&self, digest_url: &str) -> Result<String> {
        debug!("Fetching digest from {}", digest_url);
        let response = self
            .client
            .get(digest_url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {digest_url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                digest_url
            )));
        }

        response
            .text()
            .map_err(|e| Error::DownloadError(format!("Failed to read digest body: {e}")))
    }

    /// Open a streaming download of the archive.
    ///
    /// Returns a reader that feeds the install pipeline while updating a
    /// byte-count spinner. Nothing is buffered beyond reqwest's own window.
    pub fn open_download(&self, url: &str, display_name: &str) -> Result<ProgressReader> {
        info!("Downloading {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let bar = match response.content_length() {
            Some(len) if len > 0 => {
                let pb = ProgressBar::new(len);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
                        .expect("Invalid progress bar template")
                        .progress_chars("#>-"),
                );
                pb
            }
            _ => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} {bytes} ({bytes_per_sec}) {msg}")
                        .expect("Invalid spinner template"),
                );
                pb
            }
        };
        bar.set_message(display_name.to_string());

        Ok(ProgressReader {
            inner: response,
            bar,
            read: 0,
        })
    }
}

impl ArtifactSource for HttpClient {
    type Stream = ProgressReader;

    fn published_digest(&self, artifact: &Artifact) -> Result<String> {
        self.fetch_digest_line(&artifact.digest_url())
    }

    fn open_archive(&self, artifact: &Artifact) -> Result<ProgressReader> {
        self.open_download(&artifact.url, &artifact.name)
    }
}

/// Response reader that drives an indicatif bar as bytes flow through.
pub struct ProgressReader {
    inner: Response,
    bar: ProgressBar,
    read: u64,
}

impl Read for ProgressReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read += n as u64;
        self.bar.set_position(self.read);
        Ok(n)
    }
}

impl Drop for ProgressReader {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}
