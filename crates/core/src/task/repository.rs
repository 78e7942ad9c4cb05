//! Task repository
//!
//! Owns the in-memory task collection, publishes it to subscribers and
//! persists every mutation through the store adapter.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use super::model::{CreateTaskRequest, Task, TaskPriority, TaskStats, TaskUpdate};
use crate::collection::Collection;
use crate::storage::{RecordKind, StoreAdapter};
use crate::{Error, Result};

fn normalize_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Task title cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

pub struct TaskRepository {
    tasks: Collection<Task>,
}

impl TaskRepository {
    /// Load tasks from storage
    ///
    /// Prefers the primary store, then migrates anything found only in the
    /// fallback store. Starts empty when neither has tasks.
    pub async fn load(store: Arc<StoreAdapter>) -> Self {
        let tasks = match Collection::<Task>::load_persisted(&store, RecordKind::Tasks).await {
            Ok(Some(tasks)) => tasks,
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Failed to load tasks, starting empty: {}", err);
                Vec::new()
            }
        };
        debug!("Loaded {} tasks", tasks.len());

        Self {
            tasks: Collection::new(RecordKind::Tasks, store, tasks),
        }
    }

    /// Subscribe to the task collection
    ///
    /// The receiver starts at the current collection and observes every
    /// subsequent mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Task>> {
        self.tasks.subscribe()
    }

    /// Stream of task collections, starting with the current one
    pub fn stream(&self) -> WatchStream<Vec<Task>> {
        WatchStream::new(self.subscribe())
    }

    /// Create a task and append it to the collection
    pub async fn add(&self, request: CreateTaskRequest) -> Result<Task> {
        let title = normalize_title(&request.title)?;
        let mut task = Task::new(title, request.category_id).with_priority(request.priority);
        task.description = request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        task.due_date = request.due_date;

        let created = task.clone();
        self.tasks.mutate(|tasks| tasks.push(task)).await;
        debug!("Created task {}", created.id);
        Ok(created)
    }

    /// Merge `update` into the task with `id`
    ///
    /// Returns `Ok(None)` when no task matches; the collection is still
    /// republished and persisted unchanged.
    pub async fn update(&self, id: &str, mut update: TaskUpdate) -> Result<Option<Task>> {
        if let Some(title) = update.title.as_deref() {
            update.title = Some(normalize_title(title)?);
        }

        let updated = self
            .tasks
            .mutate(|tasks| {
                let task = tasks.iter_mut().find(|t| t.id == id)?;
                update.apply(task);
                Some(task.clone())
            })
            .await;
        Ok(updated)
    }

    /// Flip the completion flag of the task with `id`
    pub async fn toggle(&self, id: &str) -> Option<Task> {
        self.tasks
            .mutate(|tasks| {
                let task = tasks.iter_mut().find(|t| t.id == id)?;
                task.toggle();
                Some(task.clone())
            })
            .await
    }

    /// Remove the task with `id`, returning it if it existed
    pub async fn delete(&self, id: &str) -> Option<Task> {
        self.tasks
            .mutate(|tasks| {
                let index = tasks.iter().position(|t| t.id == id)?;
                Some(tasks.remove(index))
            })
            .await
    }

    pub fn all(&self) -> Vec<Task> {
        self.tasks.snapshot()
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.tasks.read(|tasks| tasks.iter().find(|t| t.id == id).cloned())
    }

    /// Like [`get`](Self::get), but a miss is an error
    pub fn require(&self, id: &str) -> Result<Task> {
        self.get(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    fn filtered(&self, predicate: impl Fn(&Task) -> bool) -> Vec<Task> {
        self.tasks
            .read(|tasks| tasks.iter().filter(|t| predicate(t)).cloned().collect())
    }

    pub fn by_category(&self, category_id: &str) -> Vec<Task> {
        self.filtered(|t| t.category_id == category_id)
    }

    pub fn by_priority(&self, priority: TaskPriority) -> Vec<Task> {
        self.filtered(|t| t.priority == priority)
    }

    pub fn completed(&self) -> Vec<Task> {
        self.filtered(|t| t.completed)
    }

    pub fn pending(&self) -> Vec<Task> {
        self.filtered(|t| !t.completed)
    }

    pub fn count_for_category(&self, category_id: &str) -> usize {
        self.tasks.read(|tasks| {
            tasks
                .iter()
                .filter(|t| t.category_id == category_id)
                .count()
        })
    }

    pub fn stats(&self) -> TaskStats {
        self.tasks.read(TaskStats::from_tasks)
    }

    pub fn export_all(&self) -> Vec<Task> {
        self.all()
    }

    /// Replace the whole collection with `tasks`
    ///
    /// Imported tasks get `completed_at` stamped or cleared to match their
    /// completion flag.
    pub async fn import_all(&self, mut tasks: Vec<Task>) {
        debug!("Importing {} tasks", tasks.len());
        tasks.iter_mut().for_each(Task::normalize_completion);
        self.tasks.replace(tasks).await;
    }

    pub async fn clear_all(&self) {
        self.tasks.replace(Vec::new()).await;
    }
}
