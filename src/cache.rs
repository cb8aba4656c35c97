//! On-disk cache for the preloader asset.
//!
//! Files are keyed by the SHA-256 of their locator so the same asset is
//! fetched once per cache directory and reused across restarts.

use crate::fetch::Fetcher;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub struct AssetCache {
    /// Base directory for cached files.
    dir: PathBuf,
}

impl AssetCache {
    /// Open the cache, creating its directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).context("Failed to create cache directory")?;
        tracing::info!("Asset cache at {:?}", dir);
        Ok(Self { dir })
    }

    /// Where `src` is stored. Keeps the locator's extension so the file type
    /// stays recognisable.
    pub fn path_for(&self, src: &str) -> PathBuf {
        let digest = format!("{:x}", Sha256::digest(src.as_bytes()));
        let name = match extension(src) {
            Some(ext) => format!("{}.{}", digest, ext),
            None => digest,
        };
        self.dir.join(name)
    }

    /// Cached file for `src`, if present and non-empty.
    pub fn cached(&self, src: &str) -> Option<PathBuf> {
        let path = self.path_for(src);
        let metadata = fs::metadata(&path).ok()?;
        (metadata.is_file() && metadata.len() > 0).then_some(path)
    }

    /// Return the cached file for `src`, downloading it first if missing.
    pub async fn fetch(&self, fetcher: &Fetcher, src: &str) -> Result<PathBuf> {
        if let Some(path) = self.cached(src) {
            tracing::debug!("Cache hit for {}", src);
            return Ok(path);
        }

        let path = self.path_for(src);
        tracing::debug!("Downloading {} to {:?}", src, path);
        let bytes = fetcher.bytes(src).await?;

        // Only complete downloads ever appear under the final name.
        let partial = partial_path(&path);
        let mut file = tokio::fs::File::create(&partial)
            .await
            .context("Failed to create cache file")?;
        file.write_all(&bytes)
            .await
            .context("Failed to write cache file")?;
        file.flush().await.context("Failed to flush cache file")?;
        drop(file);
        tokio::fs::rename(&partial, &path)
            .await
            .context("Failed to move cache file into place")?;

        tracing::debug!("Cached {} ({:.2} KB)", src, bytes.len() as f64 / 1024.0);
        Ok(path)
    }
}

/// Sibling of `path` that downloads are written to before the rename.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Short alphanumeric extension of the locator's last path segment.
fn extension(src: &str) -> Option<&str> {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    (!ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}
