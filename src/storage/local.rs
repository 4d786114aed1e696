//! Local filesystem storage implementation.
//!
//! Writes go to a sibling `.tmp` file that is renamed into place, so a crash
//! mid-write never leaves a truncated checkpoint behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{FinalAggregate, ProgressSnapshot, UnitOutput};
use crate::storage::CheckpointStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CheckpointStorage for LocalStorage {
    async fn write_progress(&self, key: &str, snapshot: &ProgressSnapshot) -> Result<()> {
        self.write_json(key, snapshot).await
    }

    async fn write_aggregate(&self, key: &str, aggregate: &FinalAggregate) -> Result<()> {
        self.write_json(key, aggregate).await
    }

    async fn write_unit_output(&self, key: &str, output: &UnitOutput) -> Result<()> {
        self.write_json(key, output).await
    }

    async fn load_progress(&self, key: &str) -> Result<Option<ProgressSnapshot>> {
        let snapshot = self.read_json::<ProgressSnapshot>(key).await?;
        if snapshot.is_none() {
            log::debug!("No checkpoint at {}", self.location(key));
        }
        Ok(snapshot)
    }

    fn location(&self, key: &str) -> String {
        self.path(key).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Region;
    use crate::models::{MemberRecord, RunStatus, SearchResult};
    use tempfile::TempDir;

    fn results() -> Vec<SearchResult> {
        let member = MemberRecord::with_email("jane@smithca.com.au").unwrap();
        vec![
            SearchResult::success("3000", Some(Region::Vic), vec![member]),
            SearchResult::failed("3001", Some(Region::Vic), "Element not found: tab"),
        ]
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
        assert!(!tmp.path().join("test.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert!(storage.read_bytes("nope.txt").await.unwrap().is_none());
        assert!(storage.load_progress("progress_x.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_progress_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("nested"));

        let snapshot = ProgressSnapshot::new(&results(), 2, 8);
        storage.write_progress("progress_out.json", &snapshot).await.unwrap();

        let loaded = storage.load_progress("progress_out.json").await.unwrap().unwrap();
        assert_eq!(loaded.status, RunStatus::InProgress);
        assert_eq!(loaded.processed, 2);
        assert_eq!(loaded.progress_percent, "25.0");
        assert_eq!(loaded.results, snapshot.results);
    }

    #[tokio::test]
    async fn test_corrupt_checkpoint_is_error() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("progress_out.json", b"{not json").await.unwrap();
        assert!(matches!(
            storage.load_progress("progress_out.json").await,
            Err(AppError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_aggregate_file() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let aggregate = FinalAggregate::from_results(&results(), RunStatus::Completed);
        storage.write_aggregate("out.json", &aggregate).await.unwrap();

        let raw = std::fs::read_to_string(tmp.path().join("out.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["summary"]["total_members_found"], 1);
        assert_eq!(json["summary"]["failed_postcodes"], 1);
    }
}
