//! Test doubles for storage backends

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{KeyValueBackend, MemoryBackend, StoreAdapter};
use crate::{Error, Result};

/// Adapter over two fresh memory backends, returned alongside them
pub(crate) fn memory_store() -> (StoreAdapter, Arc<MemoryBackend>, Arc<MemoryBackend>) {
    let primary = Arc::new(MemoryBackend::new());
    let fallback = Arc::new(MemoryBackend::new());
    let store = StoreAdapter::new(primary.clone(), fallback.clone());
    (store, primary, fallback)
}

/// Backend whose every operation fails
#[derive(Debug, Default)]
pub(crate) struct FailingBackend;

fn unavailable() -> Error {
    Error::Storage("backend unavailable".to_string())
}

#[async_trait]
impl KeyValueBackend for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn init(&self) -> Result<()> {
        Err(unavailable())
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(unavailable())
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(unavailable())
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(unavailable())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Err(unavailable())
    }
}

/// Memory backend that records how often it was initialized
#[derive(Debug, Default)]
pub(crate) struct CountingBackend {
    inner: MemoryBackend,
    init_calls: AtomicUsize,
}

impl CountingBackend {
    pub(crate) fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueBackend for CountingBackend {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn init(&self) -> Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys().await
    }
}

/// Memory backend whose writes take `delay` to complete
#[derive(Debug)]
pub(crate) struct SlowBackend {
    inner: MemoryBackend,
    delay: Duration,
}

impl SlowBackend {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryBackend::new(),
            delay,
        }
    }
}

#[async_trait]
impl KeyValueBackend for SlowBackend {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys().await
    }
}
