//! Archive download with streaming SHA256 verification.
//!
//! Verified archives are kept in a content-addressed cache
//! (`<cache>/<sha256>/<file name>`), so concurrent builds asking for the same
//! URL and digest reuse one download. Files are published by atomic rename;
//! a half-written download is never visible under its final name.

use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::paths::filename_from_url;
use crate::types::Sha256Digest;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    HashMismatch {
        url: String,
        expected: String,
        actual: String,
    },
}

/// Fetch-and-verify primitive used by the artifact builder.
///
/// Implementations must return a path whose content hashes to `expected`,
/// or fail. There is no "unverified" success.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and place the verified file under `work_dir` (or a cache).
    async fn fetch(
        &self,
        url: &str,
        expected: &Sha256Digest,
        work_dir: &Path,
    ) -> Result<PathBuf, DownloadError>;
}

/// HTTP fetcher with an optional content-addressed cache.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    cache_dir: Option<PathBuf>,
}

impl HttpFetcher {
    /// Fetcher that downloads straight into the caller's work directory.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cache_dir: None,
        }
    }

    /// Keep verified archives under `cache_dir` for reuse.
    pub fn with_cache(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Build the default client (user agent, timeouts).
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialised.
    pub fn default_client() -> reqwest::Result<Client> {
        Client::builder()
            .user_agent(crate::USER_AGENT)
            .connect_timeout(std::time::Duration::from_secs(30))
            .timeout(std::time::Duration::from_secs(600))
            .build()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        expected: &Sha256Digest,
        work_dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let file_name = match filename_from_url(url) {
            "" => "archive",
            name => name,
        };

        let target_dir = match &self.cache_dir {
            Some(cache) => cache.join(expected.as_str()),
            None => work_dir.to_path_buf(),
        };
        let dest = target_dir.join(file_name);

        if self.cache_dir.is_some() && dest.exists() {
            let cached = dest.clone();
            let actual = tokio::task::spawn_blocking(move || sha256_file(&cached))
                .await
                .map_err(std::io::Error::other)??;
            if expected.matches(&actual) {
                debug!("cache hit for {url} at {}", dest.display());
                return Ok(dest);
            }
            debug!("stale cache entry {}, refetching", dest.display());
            tokio::fs::remove_file(&dest).await.ok();
        }

        tokio::fs::create_dir_all(&target_dir).await?;
        download_and_verify(&self.client, url, &dest, expected).await?;
        Ok(dest)
    }
}

/// Download `url` to `dest`, verifying the stream against `expected`.
///
/// The body is written to a temporary sibling of `dest` and renamed into
/// place only after the digest matches. On mismatch the temporary file is
/// removed and nothing appears at `dest`.
///
/// # Errors
///
/// Returns [`DownloadError::Http`] for transport or non-2xx responses,
/// [`DownloadError::Io`] for filesystem failures and
/// [`DownloadError::HashMismatch`] if the content does not hash to `expected`.
pub async fn download_and_verify(
    client: &Client,
    url: &str,
    dest: &Path,
    expected: &Sha256Digest,
) -> Result<String, DownloadError> {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    let partial = tempfile::Builder::new()
        .prefix(".download-")
        .suffix(".partial")
        .tempfile_in(parent)?;

    debug!("downloading {url}");
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let mut file = tokio::fs::File::from_std(partial.reopen()?);
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
    }

    file.flush().await?;
    drop(file);
    let actual_hash = hex::encode(hasher.finalize());

    if !expected.matches(&actual_hash) {
        return Err(DownloadError::HashMismatch {
            url: url.to_string(),
            expected: expected.to_string(),
            actual: actual_hash,
        });
    }

    partial.persist(dest).map_err(|e| e.error)?;
    debug!("verified {downloaded} bytes from {url}");

    Ok(actual_hash)
}

/// Hex SHA256 of a file on disk.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
