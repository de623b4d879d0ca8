//! Cache-directory file helpers shared by the asset and render caches.
//!
//! Cache files may be deleted by the caller at any time, so reads treat
//! "not found" as a miss and writes go through a temp file plus rename.

use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A sibling path unique to this process and call, for staging writes.
pub fn temp_sibling(path: &Path, tag: &str) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}-{}-{}", name, tag, std::process::id(), n))
}

/// Write `bytes` to `path` so that readers see either the old file or the complete new one.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let temp = temp_sibling(path, "tmp");
    if let Err(e) = tokio::fs::write(&temp, bytes).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e.into());
    }
    Ok(())
}

/// Read a file, mapping "not found" to `None`.
pub async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Whether `path` exists and was modified less than `ttl` ago.
pub async fn is_fresh(path: &Path, ttl: Duration) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta
            .modified()
            .ok()
            // An mtime slightly in the future counts as brand new.
            .map(|modified| SystemTime::now().duration_since(modified).unwrap_or(Duration::ZERO))
            .map(|age| age < ttl)
            .unwrap_or(false),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_atomic_creates_parents_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/file.bin");
        write_atomic(&path, b"hello").await.unwrap();
        assert_eq!(read_optional(&path).await.unwrap().unwrap(), b"hello");

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_optional(&dir.path().join("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_freshness() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        assert!(!is_fresh(&path, Duration::from_secs(60)).await);
        write_atomic(&path, b"x").await.unwrap();
        assert!(is_fresh(&path, Duration::from_secs(3600)).await);
        assert!(!is_fresh(&path, Duration::ZERO).await);
    }
}
