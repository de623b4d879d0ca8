//! Client archive extraction into a version bundle directory.
//!
//! Blocking code: call it from `spawn_blocking`.

use crate::error::{Error, Result};
use crate::storage::temp_sibling;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Archive prefix holding the game's models, textures, item definitions and lang files.
pub const ASSET_PREFIX: &str = "assets/minecraft/";

/// Marker written last into a bundle; a directory without it is incomplete.
pub const COMPLETE_MARKER: &str = ".complete";

/// Unpack entries under `prefix` from `archive` into `dest`, keeping their
/// archive-relative paths. Returns the number of files written.
///
/// Entries whose names would escape `dest` are skipped.
pub fn unzip_filtered(archive: &Path, dest: &Path, prefix: &str) -> Result<usize> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))?;
    let mut written = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        if entry.is_dir() || !entry.name().starts_with(prefix) {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(entry = entry.name(), "skipping archive entry with unsafe path");
            continue;
        };

        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
        written += 1;
    }

    Ok(written)
}

/// Build `<bundles_dir>/<version>` from `archive`, replacing any previous bundle.
///
/// The new tree is built in a temp directory first; the old bundle is only
/// removed once the new one is complete, and is restored if the swap fails.
pub fn extract_bundle(archive: &Path, bundles_dir: &Path, version: &str) -> Result<PathBuf> {
    let failed = |reason: String| Error::ExtractionFailed {
        version: version.to_string(),
        reason,
    };

    std::fs::create_dir_all(bundles_dir)?;
    let dest = bundles_dir.join(version);
    let staging = temp_sibling(&dest, "partial");

    let built = (|| -> Result<usize> {
        std::fs::create_dir_all(&staging)?;
        let count = unzip_filtered(archive, &staging, ASSET_PREFIX)?;
        if count == 0 {
            return Err(failed(format!("no {} entries in archive", ASSET_PREFIX)));
        }
        std::fs::write(staging.join(COMPLETE_MARKER), version)?;
        Ok(count)
    })();

    let count = match built {
        Ok(count) => count,
        Err(e) => {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(match e {
                Error::ExtractionFailed { .. } => e,
                other => failed(other.to_string()),
            });
        }
    };

    let retired = temp_sibling(&dest, "old");
    let had_previous = dest.exists();
    if had_previous {
        std::fs::rename(&dest, &retired).map_err(|e| failed(e.to_string()))?;
    }
    if let Err(e) = std::fs::rename(&staging, &dest) {
        if had_previous {
            let _ = std::fs::rename(&retired, &dest);
        }
        let _ = std::fs::remove_dir_all(&staging);
        return Err(failed(e.to_string()));
    }
    if had_previous {
        let _ = std::fs::remove_dir_all(&retired);
    }

    tracing::info!(version, files = count, path = %dest.display(), "extracted asset bundle");
    Ok(dest)
}
