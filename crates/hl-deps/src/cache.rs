//! On-disk artifact cache.
//!
//! Artifacts live directly under the cache root as
//! `{artifactId}-{version}.jar`. Presence of the file is authoritative:
//! versions are immutable, so a cached file is never re-validated.
//!
//! Downloads go through a [`PendingArtifact`], a hidden temporary file in the
//! cache root that is renamed into place on [`PendingArtifact::commit`] and
//! deleted if dropped uncommitted. A failed or interrupted download therefore
//! never leaves a file that looks like a cache hit.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use hl_core::Coordinate;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

use crate::locator::JAR_EXTENSION;

/// Directory of downloaded dependency jars.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: Utf8PathBuf,
}

impl ArtifactCache {
    /// Creates a cache rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the cache root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the cache path for a coordinate at `version`.
    #[must_use]
    pub fn path_for(&self, coordinate: &Coordinate, version: &str) -> Utf8PathBuf {
        self.root.join(coordinate.file_name(version, JAR_EXTENSION))
    }

    /// Returns `true` if a file is already cached at `path`.
    pub async fn contains(&self, path: &Utf8Path) -> bool {
        tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
    }

    /// Opens a temporary file that will become `target` on commit.
    pub async fn begin(&self, target: &Utf8Path) -> io::Result<PendingArtifact> {
        tokio::fs::create_dir_all(&self.root).await?;

        let (file, temp) = tempfile::Builder::new()
            .prefix(".")
            .suffix(".part")
            .tempfile_in(&self.root)?
            .into_parts();

        Ok(PendingArtifact {
            file: tokio::fs::File::from_std(file),
            temp,
            target: target.to_owned(),
        })
    }

    /// Lists every cached jar, sorted by path.
    ///
    /// A missing cache directory yields an empty list.
    #[must_use]
    pub fn classpath(&self) -> Vec<Utf8PathBuf> {
        let Ok(entries) = self.root.read_dir_utf8() else {
            return Vec::new();
        };

        let mut jars: Vec<Utf8PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path().to_owned())
            .filter(|path| path.extension() == Some(JAR_EXTENSION) && path.is_file())
            .collect();
        jars.sort();
        jars
    }
}

/// An artifact being written to the cache.
#[derive(Debug)]
pub struct PendingArtifact {
    file: tokio::fs::File,
    temp: TempPath,
    target: Utf8PathBuf,
}

impl PendingArtifact {
    /// Returns the writer for the artifact body.
    pub fn writer(&mut self) -> &mut tokio::fs::File {
        &mut self.file
    }

    /// Flushes the body and atomically moves it to its cache path.
    pub async fn commit(self) -> io::Result<Utf8PathBuf> {
        let Self {
            mut file,
            temp,
            target,
        } = self;

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        temp.persist(&target).map_err(|e| e.error)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache_in(dir: &TempDir) -> ArtifactCache {
        let root = Utf8Path::from_path(dir.path()).expect("Non-UTF8 temp dir");
        ArtifactCache::new(root.join(".hotloop/lib"))
    }

    #[test]
    fn test_path_for() {
        let cache = ArtifactCache::new("/work/app/.hotloop/lib");
        let gson = Coordinate::new("com.google.code.gson", "gson");
        assert_eq!(
            cache.path_for(&gson, "2.11.0").as_str(),
            "/work/app/.hotloop/lib/gson-2.11.0.jar"
        );
    }

    #[tokio::test]
    async fn test_commit_moves_file_into_place() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cache = cache_in(&dir);
        let target = cache.root().join("gson-2.11.0.jar");

        assert!(!cache.contains(&target).await);
        let mut pending = cache.begin(&target).await.expect("Failed to begin");
        pending.writer().write_all(b"PK\x03\x04").await.expect("Failed to write");
        let path = pending.commit().await.expect("Failed to commit");

        assert_eq!(path, target);
        assert!(cache.contains(&target).await);
        assert_eq!(std::fs::read(&target).expect("Failed to read"), b"PK\x03\x04");
        assert_eq!(cache.classpath(), vec![target]);
    }

    #[tokio::test]
    async fn test_dropped_pending_leaves_no_entry() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cache = cache_in(&dir);
        let target = cache.root().join("jedis-5.1.0.jar");

        let mut pending = cache.begin(&target).await.expect("Failed to begin");
        pending.writer().write_all(b"partial").await.expect("Failed to write");
        drop(pending);

        assert!(!cache.contains(&target).await);
        let leftovers = std::fs::read_dir(cache.root()).expect("Failed to list").count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_classpath_of_missing_cache_is_empty() {
        let cache = ArtifactCache::new("/nonexistent/.hotloop/lib");
        assert!(cache.classpath().is_empty());
    }
}
