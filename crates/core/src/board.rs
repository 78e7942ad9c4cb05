//! Task board service
//!
//! Owns the store adapter and both repositories. Guards that span tasks and
//! categories live here rather than in either repository, and run under one
//! board-wide write gate so a check and the mutation it admits are never
//! interleaved with another guarded operation.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::category::{Category, CategoryRepository};
use crate::config::{Config, FallbackKind};
use crate::filter::ListView;
use crate::storage::{
    Backup, FileBackend, ImportRequest, MemoryBackend, SharedBackend, StorageInfo, StoreAdapter,
};
use crate::task::{CreateTaskRequest, Task, TaskRepository, TaskUpdate};
use crate::{Error, Result};

pub struct TaskBoard {
    store: Arc<StoreAdapter>,
    tasks: TaskRepository,
    categories: CategoryRepository,
    write_gate: Mutex<()>,
}

impl TaskBoard {
    /// Open the on-disk stores described by `config` and load both
    /// collections
    pub async fn open(config: &Config) -> Self {
        info!("Using data directory: {:?}", config.data_dir);

        let primary: SharedBackend = Arc::new(FileBackend::new(config.primary_dir()));
        let fallback: SharedBackend = match config.fallback {
            FallbackKind::File => Arc::new(FileBackend::new(config.fallback_dir())),
            FallbackKind::Memory => Arc::new(MemoryBackend::new()),
        };
        let store = Arc::new(StoreAdapter::new(primary, fallback));
        if let Err(err) = store.ensure_ready().await {
            warn!("Primary store unavailable, continuing with fallback: {}", err);
        }

        Self::with_store(store).await
    }

    /// Build a board over an existing store adapter
    pub async fn with_store(store: Arc<StoreAdapter>) -> Self {
        let categories = CategoryRepository::load(Arc::clone(&store)).await;
        let tasks = TaskRepository::load(Arc::clone(&store)).await;
        Self {
            store,
            tasks,
            categories,
            write_gate: Mutex::new(()),
        }
    }

    pub fn tasks(&self) -> &TaskRepository {
        &self.tasks
    }

    pub fn categories(&self) -> &CategoryRepository {
        &self.categories
    }

    pub fn store(&self) -> &Arc<StoreAdapter> {
        &self.store
    }

    fn require_category(&self, id: &str) -> Result<()> {
        if self.categories.contains(id) {
            Ok(())
        } else {
            Err(Error::CategoryNotFound(id.to_string()))
        }
    }

    /// Create a task in an existing category
    pub async fn add_task(&self, request: CreateTaskRequest) -> Result<Task> {
        let _gate = self.write_gate.lock().await;
        self.require_category(&request.category_id)?;
        self.tasks.add(request).await
    }

    /// Update a task, moving it only into an existing category
    pub async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task> {
        let _gate = self.write_gate.lock().await;
        if let Some(category_id) = update.category_id.as_deref() {
            self.require_category(category_id)?;
        }
        self.tasks
            .update(id, update)
            .await?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    /// Delete a category that no task references
    pub async fn delete_category(&self, id: &str) -> Result<Category> {
        let _gate = self.write_gate.lock().await;
        let referencing = self.tasks.count_for_category(id);
        if referencing > 0 {
            return Err(Error::CategoryInUse {
                id: id.to_string(),
                tasks: referencing,
            });
        }
        self.categories
            .delete(id)
            .await
            .ok_or_else(|| Error::CategoryNotFound(id.to_string()))
    }

    /// Filtered, sorted view over both live collections
    pub fn list_view(&self) -> ListView {
        ListView::new(self.tasks.subscribe(), self.categories.subscribe())
    }

    /// Snapshot of the in-memory collections
    pub fn export_all(&self) -> Backup {
        Backup {
            tasks: self.tasks.export_all(),
            categories: self.categories.export_all(),
        }
    }

    /// Replace the collections present in `request`
    pub async fn import_all(&self, request: ImportRequest) {
        let _gate = self.write_gate.lock().await;
        if let Some(categories) = request.categories {
            self.categories.import_all(categories).await;
        }
        if let Some(tasks) = request.tasks {
            self.tasks.import_all(tasks).await;
        }
    }

    /// Empty both collections and remove every stored key, settings included
    pub async fn clear_all(&self) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        self.tasks.clear_all().await;
        self.categories.clear_all().await;
        self.store.clear_all().await
    }

    pub async fn storage_info(&self) -> Result<StorageInfo> {
        self.store.storage_info().await
    }
}
