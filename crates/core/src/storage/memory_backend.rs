//! In-memory backend
//!
//! Synchronous map behind a mutex. Serves as the same-device fallback for
//! ephemeral sessions and as the default backend in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::backend::KeyValueBackend;
use crate::{Error, Result};

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| Error::Storage(format!("Memory store lock poisoned: {}", e)))
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let backend = MemoryBackend::new();
        assert!(backend.get("tasks").await.unwrap().is_none());

        backend.set("tasks", "[]").await.unwrap();
        assert_eq!(backend.get("tasks").await.unwrap().as_deref(), Some("[]"));

        backend.remove("tasks").await.unwrap();
        assert!(backend.get("tasks").await.unwrap().is_none());

        // Removing twice is fine
        backend.remove("tasks").await.unwrap();
    }

    #[tokio::test]
    async fn test_keys_are_sorted() {
        let backend = MemoryBackend::new();
        backend.set("tasks", "[]").await.unwrap();
        backend.set("categories", "[]").await.unwrap();
        backend.set("setting_theme", "\"dark\"").await.unwrap();

        assert_eq!(
            backend.keys().await.unwrap(),
            vec!["categories", "setting_theme", "tasks"]
        );
    }
}
