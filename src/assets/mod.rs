//! Versioned game asset cache.
//!
//! Downloads the version manifest, per-version details and the client
//! archive, and extracts the archive's `assets/minecraft` tree into a
//! per-version bundle directory. Every artifact follows the same policy:
//! serve a fresh disk copy, otherwise fetch and overwrite, and if fetching
//! fails fall back to whatever (possibly stale) copy exists.
//!
//! Cache layout under the configured root:
//!
//! ```text
//! versions/version_manifest.json
//! versions/<id>.json
//! versions/<id>/client.jar
//! assets/<id>/assets/minecraft/**
//! ```

pub mod extract;
pub mod fetch;
pub mod manifest;

pub use fetch::{Fetcher, HttpFetcher};
pub use manifest::{VersionDetails, VersionEntry, VersionManifest, LATEST};

use crate::error::{Error, Result};
use crate::single_flight::SingleFlight;
use crate::storage;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Default upstream manifest location.
pub const DEFAULT_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Asset cache configuration.
#[derive(Debug, Clone)]
pub struct AssetCacheConfig {
    /// Directory that holds manifests, archives and extracted bundles.
    pub cache_root: PathBuf,
    /// Where to fetch the version manifest from.
    pub manifest_url: String,
    /// How long a cached artifact is served without re-fetching.
    pub ttl: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for AssetCacheConfig {
    fn default() -> Self {
        Self {
            cache_root: std::env::temp_dir().join("block-icon-renderer"),
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            ttl: Duration::from_secs(30 * 24 * 60 * 60),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl AssetCacheConfig {
    pub fn with_cache_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.cache_root = root.into();
        self
    }

    pub fn with_manifest_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_url = url.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn versions_dir(&self) -> PathBuf {
        self.cache_root.join("versions")
    }

    fn manifest_path(&self) -> PathBuf {
        self.versions_dir().join("version_manifest.json")
    }

    fn details_path(&self, id: &str) -> PathBuf {
        self.versions_dir().join(format!("{}.json", id))
    }

    fn archive_path(&self, id: &str) -> PathBuf {
        self.versions_dir().join(id).join("client.jar")
    }

    fn bundles_dir(&self) -> PathBuf {
        self.cache_root.join("assets")
    }
}

/// Fetches and caches versioned game assets. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AssetCache {
    config: Arc<AssetCacheConfig>,
    fetcher: Arc<dyn Fetcher>,
    extractions: SingleFlight<(String, bool), PathBuf>,
}

impl AssetCache {
    /// An asset cache that fetches over HTTP.
    pub fn new(config: AssetCacheConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// An asset cache with a custom transport.
    pub fn with_fetcher(config: AssetCacheConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            extractions: SingleFlight::new(),
        }
    }

    pub fn config(&self) -> &AssetCacheConfig {
        &self.config
    }

    /// The version manifest, fetched at most once per TTL unless `force_refresh`.
    pub async fn get_version_manifest(&self, force_refresh: bool) -> Result<VersionManifest> {
        let path = self.config.manifest_path();
        if !force_refresh {
            if let Some(manifest) = self.read_fresh::<VersionManifest>(&path).await {
                return Ok(manifest);
            }
        }

        match self.fetch_json::<VersionManifest>(&self.config.manifest_url, &path).await {
            Ok(manifest) => Ok(manifest),
            Err(e) => match self.read_stale::<VersionManifest>(&path).await {
                Some(manifest) => {
                    tracing::warn!(error = %e, "manifest refresh failed, using cached copy");
                    Ok(manifest)
                }
                None => Err(Error::ManifestUnavailable(e.to_string())),
            },
        }
    }

    /// Concrete version id for `version`, mapping `"latest"` through the manifest.
    pub async fn resolve_version_id(&self, version: &str) -> Result<String> {
        if version != LATEST {
            return Ok(version.to_string());
        }
        let manifest = self.get_version_manifest(false).await?;
        Ok(manifest.resolve_id(version).to_string())
    }

    /// Per-version details (download locations).
    pub async fn get_version_details(&self, version: &str) -> Result<VersionDetails> {
        let id = self.resolve_version_id(version).await?;
        let path = self.config.details_path(&id);
        if let Some(details) = self.read_fresh::<VersionDetails>(&path).await {
            return Ok(details);
        }

        let fetched = async {
            let manifest = self.get_version_manifest(false).await?;
            let entry = manifest
                .find(&id)
                .ok_or_else(|| Error::VersionNotFound(id.clone()))?;
            self.fetch_json::<VersionDetails>(&entry.url, &path).await
        }
        .await;

        match fetched {
            Ok(details) => Ok(details),
            Err(e) => match self.read_stale::<VersionDetails>(&path).await {
                Some(details) => {
                    tracing::warn!(version = %id, error = %e, "details refresh failed, using cached copy");
                    Ok(details)
                }
                None => Err(e),
            },
        }
    }

    /// Path to the downloaded client archive for `version`.
    pub async fn get_client_archive(&self, version: &str) -> Result<PathBuf> {
        let id = self.resolve_version_id(version).await?;
        let path = self.config.archive_path(&id);
        if storage::is_fresh(&path, self.config.ttl).await {
            return Ok(path);
        }

        let fetched = async {
            let details = self.get_version_details(&id).await?;
            let client = &details.downloads.client;
            let bytes = self.download(&client.url).await?;
            if let Some(expected) = client.size {
                if bytes.len() as u64 != expected {
                    return Err(Error::DownloadFailed {
                        url: client.url.clone(),
                        reason: format!("expected {} bytes, got {}", expected, bytes.len()),
                    });
                }
            }
            storage::write_atomic(&path, &bytes).await?;
            tracing::info!(version = %id, bytes = bytes.len(), "downloaded client archive");
            Ok(())
        }
        .await;

        match fetched {
            Ok(()) => Ok(path),
            Err(e) if path.is_file() => {
                tracing::warn!(version = %id, error = %e, "archive refresh failed, using cached copy");
                Ok(path)
            }
            Err(e) => Err(e),
        }
    }

    /// Path to the extracted asset bundle for `version`, downloading and
    /// extracting as needed.
    ///
    /// At most one extraction runs per `(version, force_refresh)`; concurrent
    /// callers share its result.
    pub async fn get_assets(&self, version: &str, force_refresh: bool) -> Result<PathBuf> {
        let id = self.resolve_version_id(version).await?;
        let this = self.clone();
        let key = (id.clone(), force_refresh);
        self.extractions
            .run(key, async move { this.load_assets(id, force_refresh).await })
            .await
    }

    async fn load_assets(&self, id: String, force_refresh: bool) -> Result<PathBuf> {
        let bundle = self.config.bundles_dir().join(&id);
        let marker = bundle.join(extract::COMPLETE_MARKER);
        if !force_refresh && storage::is_fresh(&marker, self.config.ttl).await {
            return Ok(bundle);
        }
        let have_previous = marker.is_file();

        let archive = match self.get_client_archive(&id).await {
            Ok(archive) => archive,
            Err(e) if have_previous => {
                tracing::warn!(version = %id, error = %e, "archive unavailable, keeping existing bundle");
                return Ok(bundle);
            }
            Err(e) => return Err(e),
        };

        let bundles_dir = self.config.bundles_dir();
        let version = id.clone();
        let extracted = tokio::task::spawn_blocking(move || {
            extract::extract_bundle(&archive, &bundles_dir, &version)
        })
        .await
        .map_err(Error::from)
        .and_then(|r| r);

        match extracted {
            Ok(path) => Ok(path),
            Err(e) if have_previous => {
                tracing::warn!(version = %id, error = %e, "re-extraction failed, keeping existing bundle");
                Ok(bundle)
            }
            Err(e) => Err(match e {
                Error::ExtractionFailed { .. } => e,
                other => Error::ExtractionFailed {
                    version: id,
                    reason: other.to_string(),
                },
            }),
        }
    }

    /// Fetch a version's assets in the background after `delay`, so a later
    /// `get_assets` finds them ready. Failures are logged.
    pub fn prefetch(&self, version: impl Into<String>, delay: Duration) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        let version = version.into();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match this.get_assets(&version, false).await {
                Ok(path) => tracing::debug!(version = %version, path = %path.display(), "prefetched assets"),
                Err(e) => tracing::warn!(version = %version, error = %e, "asset prefetch failed"),
            }
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.fetcher.fetch(url).await.map_err(|e| match e {
            Error::DownloadFailed { .. } => e,
            other => Error::DownloadFailed {
                url: url.to_string(),
                reason: other.to_string(),
            },
        })
    }

    /// Fetch, parse, then persist; a body that does not parse is never cached.
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str, path: &Path) -> Result<T> {
        let bytes = self.download(url).await?;
        let value = serde_json::from_slice(&bytes)?;
        storage::write_atomic(path, &bytes).await?;
        Ok(value)
    }

    async fn read_fresh<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        if !storage::is_fresh(path, self.config.ttl).await {
            return None;
        }
        self.read_stale(path).await
    }

    async fn read_stale<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        let bytes = match storage::read_optional(path).await {
            Ok(bytes) => bytes?,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read cache file");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt cache file");
                None
            }
        }
    }
}
