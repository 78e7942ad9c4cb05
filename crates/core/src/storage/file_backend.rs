//! File-based backend
//!
//! Stores each key as `<key>.json` inside a directory.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use super::backend::KeyValueBackend;
use crate::{Error, Result};

const EXTENSION: &str = ".json";

/// Directory-backed key-value store
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir`
    ///
    /// The directory is created by [`KeyValueBackend::init`] or on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key.starts_with('.')
            || key.contains(['/', '\\'])
            || key.contains("..")
        {
            return Err(Error::InvalidInput(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}{}", key, EXTENSION)))
    }

    async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create directory: {}", e)))
    }
}

#[async_trait]
impl KeyValueBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn init(&self) -> Result<()> {
        debug!("Opening file store at {:?}", self.dir);
        self.ensure_dir().await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                err
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        self.ensure_dir().await?;

        // Write to a sibling temp file first so readers never see a torn blob
        let temp_path = self
            .dir
            .join(format!(".{}.tmp", Uuid::new_v4().as_hyphenated()));
        tokio::fs::write(&temp_path, value)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write temp file: {}", e)))?;

        if let Err(err) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(Error::Storage(format!(
                "Failed to finalize write of {}: {}",
                path.display(),
                err
            )));
        }

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Storage(format!(
                "Failed to remove {}: {}",
                path.display(),
                err
            ))),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if let Some(key) = name.strip_suffix(EXTENSION) {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_backend() -> (FileBackend, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().join("primary"));
        (backend, temp_dir)
    }

    #[tokio::test]
    async fn test_init_creates_directory() {
        let (backend, _temp) = create_test_backend();
        assert!(!backend.dir().exists());

        backend.init().await.unwrap();
        assert!(backend.dir().is_dir());

        // Idempotent
        backend.init().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_key_reads_as_none() {
        let (backend, _temp) = create_test_backend();
        assert!(backend.get("tasks").await.unwrap().is_none());
        assert!(backend.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_overwrites_and_persists() {
        let (backend, temp) = create_test_backend();
        backend.set("tasks", "[1]").await.unwrap();
        backend.set("tasks", "[1,2]").await.unwrap();

        let reopened = FileBackend::new(temp.path().join("primary"));
        assert_eq!(reopened.get("tasks").await.unwrap().as_deref(), Some("[1,2]"));
    }

    #[tokio::test]
    async fn test_keys_skip_temp_files() {
        let (backend, _temp) = create_test_backend();
        backend.set("tasks", "[]").await.unwrap();
        backend.set("setting_theme", "\"dark\"").await.unwrap();
        tokio::fs::write(backend.dir().join(".stale.tmp"), "x")
            .await
            .unwrap();

        assert_eq!(backend.keys().await.unwrap(), vec!["setting_theme", "tasks"]);
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let (backend, _temp) = create_test_backend();
        backend.remove("categories").await.unwrap();

        backend.set("categories", "[]").await.unwrap();
        backend.remove("categories").await.unwrap();
        assert!(backend.get("categories").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let (backend, _temp) = create_test_backend();
        for key in ["", "../escape", "nested/key", ".hidden", "a\\b"] {
            match backend.set(key, "{}").await {
                Err(Error::InvalidInput(_)) => {}
                other => panic!("Expected InvalidInput for {:?}, got: {:?}", key, other),
            }
        }
    }
}
