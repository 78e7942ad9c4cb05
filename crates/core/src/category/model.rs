//! Category model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock;

/// A named, colored grouping for tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Display color token, e.g. `#3498db`
    pub color: String,
    /// Display icon token, e.g. `home-outline`
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a category with a fresh id
    pub fn new(name: impl Into<String>, color: impl Into<String>, icon: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name, color, icon)
    }

    fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            icon: icon.into(),
            created_at: clock::now(),
        }
    }
}

/// Built-in categories seeded on first run
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::with_id("default-1", "Personal", "#3498db", "person-outline"),
        Category::with_id("default-2", "Trabajo", "#e74c3c", "briefcase-outline"),
        Category::with_id("default-3", "Hogar", "#2ecc71", "home-outline"),
    ]
}

/// Partial category update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl CategoryUpdate {
    pub(crate) fn apply(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(color) = self.color {
            category.color = color;
        }
        if let Some(icon) = self.icon {
            category.icon = icon;
        }
    }
}
