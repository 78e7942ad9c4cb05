//! Category repository

use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use super::model::{default_categories, Category, CategoryUpdate};
use crate::collection::Collection;
use crate::storage::{RecordKind, StoreAdapter};
use crate::{Error, Result};

fn normalize_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "Category name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Owns the category collection
///
/// Deleting a category does not check for tasks that still reference it;
/// [`TaskBoard::delete_category`](crate::TaskBoard::delete_category) does.
pub struct CategoryRepository {
    categories: Collection<Category>,
}

impl CategoryRepository {
    /// Load categories from storage, seeding the defaults on first run
    pub async fn load(store: Arc<StoreAdapter>) -> Self {
        let categories =
            match Collection::<Category>::load_persisted(&store, RecordKind::Categories).await {
                Ok(Some(categories)) => categories,
                Ok(None) => {
                    info!("No stored categories, seeding defaults");
                    let defaults = default_categories();
                    if let Err(err) = store.save_categories(&defaults).await {
                        warn!("Failed to persist default categories: {}", err);
                    }
                    defaults
                }
                Err(err) => {
                    warn!("Failed to load categories, using defaults: {}", err);
                    default_categories()
                }
            };
        debug!("Loaded {} categories", categories.len());

        Self {
            categories: Collection::new(RecordKind::Categories, store, categories),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Category>> {
        self.categories.subscribe()
    }

    pub fn stream(&self) -> WatchStream<Vec<Category>> {
        WatchStream::new(self.subscribe())
    }

    pub async fn add(
        &self,
        name: &str,
        color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Result<Category> {
        let category = Category::new(normalize_name(name)?, color, icon);
        let created = category.clone();
        self.categories
            .mutate(|categories| categories.push(category))
            .await;
        debug!("Created category {}", created.id);
        Ok(created)
    }

    /// Merge `update` into the category with `id`; a miss is a no-op
    pub async fn update(&self, id: &str, mut update: CategoryUpdate) -> Result<Option<Category>> {
        if let Some(name) = update.name.as_deref() {
            update.name = Some(normalize_name(name)?);
        }

        let updated = self
            .categories
            .mutate(|categories| {
                let category = categories.iter_mut().find(|c| c.id == id)?;
                update.apply(category);
                Some(category.clone())
            })
            .await;
        Ok(updated)
    }

    /// Remove the category with `id`, returning it if it existed
    pub async fn delete(&self, id: &str) -> Option<Category> {
        self.categories
            .mutate(|categories| {
                let index = categories.iter().position(|c| c.id == id)?;
                Some(categories.remove(index))
            })
            .await
    }

    pub fn get_by_id(&self, id: &str) -> Option<Category> {
        self.categories
            .read(|categories| categories.iter().find(|c| c.id == id).cloned())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.categories
            .read(|categories| categories.iter().any(|c| c.id == id))
    }

    pub fn all(&self) -> Vec<Category> {
        self.categories.snapshot()
    }

    /// Replace every category with the built-in defaults
    pub async fn reset_to_defaults(&self) {
        self.categories.replace(default_categories()).await;
    }

    pub fn export_all(&self) -> Vec<Category> {
        self.all()
    }

    pub async fn import_all(&self, categories: Vec<Category>) {
        debug!("Importing {} categories", categories.len());
        self.categories.replace(categories).await;
    }

    pub async fn clear_all(&self) {
        self.categories.replace(Vec::new()).await;
    }
}
