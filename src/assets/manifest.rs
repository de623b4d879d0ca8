//! Version manifest and per-version detail documents.
//!
//! Only the fields this crate needs are modelled; everything else in the
//! upstream JSON is ignored. Cached copies keep the original bytes.

use serde::{Deserialize, Serialize};

/// Version id callers may pass to mean "newest release".
pub const LATEST: &str = "latest";

/// The upstream list of all published versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Location of the [`VersionDetails`] document.
    pub url: String,
    #[serde(rename = "releaseTime", default)]
    pub release_time: String,
}

impl VersionManifest {
    /// Map `"latest"` to the current release id; other ids pass through.
    pub fn resolve_id<'a>(&'a self, requested: &'a str) -> &'a str {
        if requested == LATEST {
            &self.latest.release
        } else {
            requested
        }
    }

    pub fn find(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }
}

/// Per-version document with download locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionDetails {
    pub id: String,
    pub downloads: Downloads,
    #[serde(rename = "assetIndex", default)]
    pub asset_index: Option<AssetIndexRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Downloads {
    pub client: DownloadInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadInfo {
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetIndexRef {
    #[serde(default)]
    pub id: Option<String>,
    pub url: String,
}
