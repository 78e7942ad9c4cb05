//! Dual-backend store adapter
//!
//! Writes go to the primary backend and are mirrored to the fallback. Reads
//! prefer the primary and only consult the fallback when the primary has
//! nothing for the requested key.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::backend::{KeyValueBackend, SharedBackend};
use crate::category::Category;
use crate::task::Task;
use crate::{Error, Result};

/// Prefix under which named settings are stored
pub const SETTING_PREFIX: &str = "setting_";

/// Key the fallback store used for categories before they shared the
/// primary's key
const LEGACY_CATEGORIES_KEY: &str = "task_categories";

/// Collection kinds persisted by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Tasks,
    Categories,
}

impl RecordKind {
    pub fn key(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Categories => "categories",
        }
    }

    fn legacy_keys(self) -> &'static [&'static str] {
        match self {
            Self::Tasks => &[],
            Self::Categories => &[LEGACY_CATEGORIES_KEY],
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Selects one of the adapter's two backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Primary,
    Fallback,
}

/// Full export of both collections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,
}

/// Restore payload; each present collection replaces the stored one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
}

impl From<Backup> for ImportRequest {
    fn from(backup: Backup) -> Self {
        Self {
            tasks: Some(backup.tasks),
            categories: Some(backup.categories),
        }
    }
}

/// Summary of what the primary store holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub total_keys: usize,
    pub tasks_count: usize,
    pub categories_count: usize,
}

fn setting_key(key: &str) -> String {
    format!("{}{}", SETTING_PREFIX, key)
}

/// Coordinator over a primary and a fallback backend
pub struct StoreAdapter {
    primary: SharedBackend,
    fallback: SharedBackend,
    ready: OnceCell<()>,
}

impl StoreAdapter {
    pub fn new(primary: SharedBackend, fallback: SharedBackend) -> Self {
        Self {
            primary,
            fallback,
            ready: OnceCell::new(),
        }
    }

    /// Initialize the primary backend once
    ///
    /// Safe to call repeatedly and from concurrent tasks; a failed attempt is
    /// retried on the next call.
    pub async fn ensure_ready(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async {
                debug!("Initializing {} store", self.primary.name());
                self.primary.init().await
            })
            .await?;
        Ok(())
    }

    fn backend(&self, backend: Backend) -> &dyn KeyValueBackend {
        match backend {
            Backend::Primary => self.primary.as_ref(),
            Backend::Fallback => self.fallback.as_ref(),
        }
    }

    async fn read_key(&self, backend: Backend, key: &str) -> Result<Option<String>> {
        if backend == Backend::Primary {
            self.ensure_ready().await?;
        }
        self.backend(backend).get(key).await
    }

    async fn write_key(&self, key: &str, value: &str) -> Result<()> {
        let primary = match self.ensure_ready().await {
            Ok(()) => self.primary.set(key, value).await,
            Err(err) => Err(err),
        };

        match primary {
            Ok(()) => {
                if let Err(err) = self.fallback.set(key, value).await {
                    warn!(
                        "Failed to mirror {} to {} store: {}",
                        key,
                        self.fallback.name(),
                        err
                    );
                }
                Ok(())
            }
            Err(err) => {
                warn!(
                    "Write of {} to {} store failed, using {} store only: {}",
                    key,
                    self.primary.name(),
                    self.fallback.name(),
                    err
                );
                self.fallback.set(key, value).await.map_err(|fallback_err| {
                    Error::Storage(format!(
                        "Both stores rejected {}: primary: {}; fallback: {}",
                        key, err, fallback_err
                    ))
                })
            }
        }
    }

    async fn remove_key(&self, key: &str) -> Result<()> {
        let primary = match self.ensure_ready().await {
            Ok(()) => self.primary.remove(key).await,
            Err(err) => Err(err),
        };
        let fallback = self.fallback.remove(key).await;

        match (primary, fallback) {
            (Err(primary_err), Err(fallback_err)) => Err(Error::Storage(format!(
                "Both stores failed to remove {}: primary: {}; fallback: {}",
                key, primary_err, fallback_err
            ))),
            (Err(err), Ok(())) | (Ok(()), Err(err)) => {
                warn!("Failed to remove {} from one store: {}", key, err);
                Ok(())
            }
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    async fn read_records<T: DeserializeOwned>(
        &self,
        backend: Backend,
        key: &str,
    ) -> Result<Option<Vec<T>>> {
        let Some(content) = self.read_key(backend, key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&content) {
            Ok(records) => Ok(Some(records)),
            Err(err) => {
                warn!("Ignoring unreadable {} in {:?} store: {}", key, backend, err);
                Ok(None)
            }
        }
    }

    /// Serialize the whole collection and write it as one unit
    ///
    /// Succeeds when at least one backend accepted the write.
    pub async fn save<T: Serialize>(&self, kind: RecordKind, records: &[T]) -> Result<()> {
        let content = serde_json::to_string(records)?;
        self.write_key(kind.key(), &content).await
    }

    /// Read whatever one backend stores for `kind`
    ///
    /// `None` means nothing readable is stored; a stored empty collection is
    /// `Some(vec![])`. Legacy keys are only consulted when the current key is
    /// absent from the fallback.
    pub async fn find_in<T: DeserializeOwned>(
        &self,
        backend: Backend,
        kind: RecordKind,
    ) -> Result<Option<Vec<T>>> {
        if let Some(records) = self.read_records(backend, kind.key()).await? {
            return Ok(Some(records));
        }

        if backend == Backend::Fallback {
            for legacy in kind.legacy_keys() {
                if let Some(records) = self.read_records(backend, legacy).await? {
                    debug!("Read {} from legacy key {}", kind, legacy);
                    return Ok(Some(records));
                }
            }
        }

        Ok(None)
    }

    /// Read a collection from exactly one backend
    ///
    /// Missing or unparsable data reads as an empty collection.
    pub async fn load_from<T: DeserializeOwned>(
        &self,
        backend: Backend,
        kind: RecordKind,
    ) -> Result<Vec<T>> {
        Ok(self.find_in(backend, kind).await?.unwrap_or_default())
    }

    /// Read a collection, preferring the primary backend
    pub async fn load<T: DeserializeOwned>(&self, kind: RecordKind) -> Result<Vec<T>> {
        match self.load_from(Backend::Primary, kind).await {
            Ok(records) if !records.is_empty() => return Ok(records),
            Ok(_) => {}
            Err(err) => warn!("Failed to read {} from primary store: {}", kind, err),
        }
        self.load_from(Backend::Fallback, kind).await
    }

    /// Remove a collection from both backends
    pub async fn clear(&self, kind: RecordKind) -> Result<()> {
        self.remove_key(kind.key()).await?;
        for legacy in kind.legacy_keys() {
            if let Err(err) = self.fallback.remove(legacy).await {
                warn!("Failed to remove legacy key {}: {}", legacy, err);
            }
        }
        Ok(())
    }

    pub async fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.save(RecordKind::Tasks, tasks).await
    }

    pub async fn load_tasks(&self) -> Result<Vec<Task>> {
        self.load(RecordKind::Tasks).await
    }

    pub async fn clear_tasks(&self) -> Result<()> {
        self.clear(RecordKind::Tasks).await
    }

    pub async fn save_categories(&self, categories: &[Category]) -> Result<()> {
        self.save(RecordKind::Categories, categories).await
    }

    pub async fn load_categories(&self) -> Result<Vec<Category>> {
        self.load(RecordKind::Categories).await
    }

    pub async fn clear_categories(&self) -> Result<()> {
        self.clear(RecordKind::Categories).await
    }

    /// Store a named setting
    pub async fn save_setting<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let content = serde_json::to_string(value)?;
        self.write_key(&setting_key(key), &content).await
    }

    /// Read a named setting, returning `default` when it is absent or unreadable
    pub async fn load_setting<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let key = setting_key(key);
        for backend in [Backend::Primary, Backend::Fallback] {
            let content = match self.read_key(backend, &key).await {
                Ok(Some(content)) => content,
                Ok(None) => continue,
                Err(err) => {
                    warn!("Failed to read {} from {:?} store: {}", key, backend, err);
                    continue;
                }
            };
            return match serde_json::from_str(&content) {
                Ok(value) => value,
                Err(err) => {
                    warn!("Ignoring unreadable setting {}: {}", key, err);
                    default
                }
            };
        }
        default
    }

    pub async fn remove_setting(&self, key: &str) -> Result<()> {
        self.remove_key(&setting_key(key)).await
    }

    /// Snapshot both collections as currently stored
    pub async fn export_all(&self) -> Result<Backup> {
        Ok(Backup {
            tasks: self.load_tasks().await?,
            categories: self.load_categories().await?,
        })
    }

    /// Overwrite the collections present in `request`
    pub async fn import_all(&self, request: &ImportRequest) -> Result<()> {
        if let Some(categories) = &request.categories {
            self.save_categories(categories).await?;
        }
        if let Some(tasks) = &request.tasks {
            self.save_tasks(tasks).await?;
        }
        Ok(())
    }

    /// Remove tasks, categories and every setting from both backends
    pub async fn clear_all(&self) -> Result<()> {
        self.clear_tasks().await?;
        self.clear_categories().await?;

        let mut setting_keys = Vec::new();
        match self.ensure_ready().await {
            Ok(()) => match self.primary.keys().await {
                Ok(keys) => setting_keys.extend(keys),
                Err(err) => warn!("Failed to list {} store keys: {}", self.primary.name(), err),
            },
            Err(err) => warn!("Primary store unavailable during reset: {}", err),
        }
        match self.fallback.keys().await {
            Ok(keys) => setting_keys.extend(keys),
            Err(err) => warn!("Failed to list {} store keys: {}", self.fallback.name(), err),
        }
        setting_keys.retain(|key| key.starts_with(SETTING_PREFIX));
        setting_keys.sort();
        setting_keys.dedup();

        for key in setting_keys {
            self.remove_key(&key).await?;
        }
        Ok(())
    }

    pub async fn storage_info(&self) -> Result<StorageInfo> {
        self.ensure_ready().await?;
        let total_keys = self.primary.keys().await?.len();
        Ok(StorageInfo {
            total_keys,
            tasks_count: self.load_tasks().await?.len(),
            categories_count: self.load_categories().await?.len(),
        })
    }
}
