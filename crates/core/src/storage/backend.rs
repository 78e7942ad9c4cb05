//! Backend trait definition

use async_trait::async_trait;
use std::sync::Arc;

use crate::Result;

/// String-keyed blob store
///
/// Values are opaque serialized documents; the backend never looks inside.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Prepare the backend for use. Called once before the first access.
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    async fn keys(&self) -> Result<Vec<String>>;
}

/// Shared backend reference
pub type SharedBackend = Arc<dyn KeyValueBackend>;
