//! Task list projection
//!
//! [`project`] applies the status and category filters and the display
//! order. [`ListView`] keeps that projection current as the task and
//! category collections or the filter change.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::category::Category;
use crate::task::Task;
use crate::{Error, Result};

/// Which completion states are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    All,
    Pending,
    Completed,
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self::All
    }
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !task.completed,
            Self::Completed => task.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(Error::InvalidInput(format!("Unknown status filter: {}", other))),
        }
    }
}

/// Active list filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub status: StatusFilter,
    /// `None` shows every category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(task)
            && self
                .category_id
                .as_deref()
                .map_or(true, |id| task.category_id == id)
    }
}

/// Display order: pending before completed, then higher priority, then newer
pub fn display_order(a: &Task, b: &Task) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| b.priority.rank().cmp(&a.priority.rank()))
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Filter and sort `tasks` for display
pub fn project(tasks: &[Task], filter: &TaskFilter) -> Vec<Task> {
    let mut visible: Vec<Task> = tasks.iter().filter(|t| filter.matches(t)).cloned().collect();
    visible.sort_by(display_order);
    visible
}

/// Filtered, sorted view over the live task and category collections
pub struct ListView {
    tasks: watch::Receiver<Vec<Task>>,
    categories: watch::Receiver<Vec<Category>>,
    filter_tx: watch::Sender<TaskFilter>,
    filter: watch::Receiver<TaskFilter>,
}

impl ListView {
    pub fn new(
        tasks: watch::Receiver<Vec<Task>>,
        categories: watch::Receiver<Vec<Category>>,
    ) -> Self {
        let (filter_tx, filter) = watch::channel(TaskFilter::default());
        Self {
            tasks,
            categories,
            filter_tx,
            filter,
        }
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter.borrow().clone()
    }

    pub fn set_filter(&self, filter: TaskFilter) {
        self.filter_tx.send_replace(filter);
    }

    pub fn set_status_filter(&self, status: StatusFilter) {
        self.filter_tx.send_modify(|filter| filter.status = status);
    }

    /// Restrict to one category, or show all with `None`
    pub fn set_category_filter(&self, category_id: Option<String>) {
        self.filter_tx
            .send_modify(|filter| filter.category_id = category_id);
    }

    /// Current projection
    pub fn visible(&self) -> Vec<Task> {
        let filter = self.filter();
        let tasks = self.tasks.borrow();
        project(&tasks, &filter)
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.borrow().clone()
    }

    /// Wait until tasks, categories or the filter change, then return the
    /// recomputed projection
    ///
    /// Fails with [`Error::StreamClosed`] once a repository has been dropped.
    /// Channels are polled in a fixed order: tasks, categories, filter.
    pub async fn changed(&mut self) -> Result<Vec<Task>> {
        tokio::select! {
            biased;
            res = self.tasks.changed() => res.map_err(|_| Error::StreamClosed)?,
            res = self.categories.changed() => res.map_err(|_| Error::StreamClosed)?,
            res = self.filter.changed() => res.map_err(|_| Error::StreamClosed)?,
        }
        // Consume every pending notification so one change wakes us once
        self.tasks.borrow_and_update();
        self.categories.borrow_and_update();
        self.filter.borrow_and_update();
        Ok(self.visible())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskPriority;
    use chrono::{Duration, TimeZone, Utc};

    fn task_at(title: &str, priority: TaskPriority, completed: bool, secs: i64) -> Task {
        let mut task = Task::new(title, "default-1").with_priority(priority);
        task.created_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs);
        if completed {
            task.toggle();
        }
        task
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_pending_before_completed_then_newest() {
        let tasks = vec![
            task_at("B", TaskPriority::High, false, 1),
            task_at("C", TaskPriority::High, true, 5),
            task_at("A", TaskPriority::High, false, 2),
        ];

        let visible = project(&tasks, &TaskFilter::default());
        assert_eq!(titles(&visible), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_priority_outranks_age() {
        let tasks = vec![
            task_at("new-low", TaskPriority::Low, false, 30),
            task_at("old-high", TaskPriority::High, false, 1),
            task_at("mid", TaskPriority::Medium, false, 10),
            task_at("done-high", TaskPriority::High, true, 40),
        ];

        let visible = project(&tasks, &TaskFilter::default());
        assert_eq!(titles(&visible), vec!["old-high", "mid", "new-low", "done-high"]);
    }

    #[test]
    fn test_status_filters() {
        let tasks = vec![
            task_at("open", TaskPriority::Medium, false, 1),
            task_at("done", TaskPriority::Medium, true, 2),
        ];

        let pending = project(&tasks, &TaskFilter::new().with_status(StatusFilter::Pending));
        assert_eq!(titles(&pending), vec!["open"]);

        let completed = project(&tasks, &TaskFilter::new().with_status(StatusFilter::Completed));
        assert_eq!(titles(&completed), vec!["done"]);

        assert_eq!(project(&tasks, &TaskFilter::default()).len(), 2);
    }

    #[test]
    fn test_category_filter() {
        let mut work = task_at("work", TaskPriority::Medium, false, 1);
        work.category_id = "default-2".to_string();
        let tasks = vec![work, task_at("home", TaskPriority::Medium, false, 2)];

        let visible = project(&tasks, &TaskFilter::new().with_category("default-2"));
        assert_eq!(titles(&visible), vec!["work"]);

        let none = project(&tasks, &TaskFilter::new().with_category("missing"));
        assert!(none.is_empty());
    }

    #[test]
    fn test_projection_is_idempotent() {
        let tasks = vec![
            task_at("a", TaskPriority::Low, true, 3),
            task_at("b", TaskPriority::High, false, 1),
            task_at("c", TaskPriority::Medium, false, 9),
            task_at("d", TaskPriority::High, false, 7),
        ];
        let filter = TaskFilter::new().with_status(StatusFilter::All);

        let once = project(&tasks, &filter);
        let twice = project(&once, &filter);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!("Pending".parse::<StatusFilter>().unwrap(), StatusFilter::Pending);
        assert!("archived".parse::<StatusFilter>().is_err());
    }

    #[tokio::test]
    async fn test_list_view_recomputes_on_changes() {
        let (tasks_tx, tasks_rx) = watch::channel(vec![
            task_at("open", TaskPriority::Low, false, 1),
            task_at("done", TaskPriority::High, true, 2),
        ]);
        let (_categories_tx, categories_rx) = watch::channel(crate::category::default_categories());
        let mut view = ListView::new(tasks_rx, categories_rx);

        assert_eq!(titles(&view.visible()), vec!["open", "done"]);

        view.set_status_filter(StatusFilter::Completed);
        let visible = view.changed().await.unwrap();
        assert_eq!(titles(&visible), vec!["done"]);

        tasks_tx.send_modify(|tasks| tasks.push(task_at("later", TaskPriority::Medium, true, 3)));
        let visible = view.changed().await.unwrap();
        assert_eq!(titles(&visible), vec!["done", "later"]);
    }

    #[tokio::test]
    async fn test_list_view_wakes_on_category_change() {
        let (_tasks_tx, tasks_rx) =
            watch::channel(vec![task_at("open", TaskPriority::Low, false, 1)]);
        let (categories_tx, categories_rx) =
            watch::channel(crate::category::default_categories());
        let mut view = ListView::new(tasks_rx, categories_rx);

        categories_tx.send_modify(|categories| categories.retain(|c| c.id != "default-3"));

        let wait = std::time::Duration::from_secs(1);
        let visible = tokio::time::timeout(wait, view.changed())
            .await
            .expect("category change should wake the view")
            .unwrap();
        assert_eq!(titles(&visible), vec!["open"]);
        assert_eq!(view.categories().len(), 2);
    }

    #[tokio::test]
    async fn test_list_view_reports_pending_change_before_close() {
        let (tasks_tx, tasks_rx) = watch::channel(Vec::new());
        let (categories_tx, categories_rx) = watch::channel(Vec::new());
        let mut view = ListView::new(tasks_rx, categories_rx);

        tasks_tx.send_replace(vec![task_at("last", TaskPriority::Medium, false, 1)]);
        drop(categories_tx);

        let visible = view.changed().await.unwrap();
        assert_eq!(titles(&visible), vec!["last"]);
        assert!(matches!(view.changed().await, Err(Error::StreamClosed)));
    }

    #[tokio::test]
    async fn test_list_view_closed_when_repository_dropped() {
        let (tasks_tx, tasks_rx) = watch::channel(Vec::new());
        let (_categories_tx, categories_rx) = watch::channel(Vec::new());
        let mut view = ListView::new(tasks_rx, categories_rx);

        drop(tasks_tx);
        assert!(matches!(view.changed().await, Err(Error::StreamClosed)));
    }
}
