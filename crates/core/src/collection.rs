//! Reactive in-memory collection backed by the store adapter
//!
//! Shared by the task and category repositories. The latest collection lives
//! in a watch channel so every subscriber sees the current value on
//! subscription and each committed mutation afterwards.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

use crate::storage::{Backend, RecordKind, StoreAdapter};
use crate::Result;

pub(crate) struct Collection<T> {
    kind: RecordKind,
    store: Arc<StoreAdapter>,
    records: watch::Sender<Vec<T>>,
    /// Serializes mutations, including their persistence
    write_gate: Mutex<()>,
}

impl<T> Collection<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    pub(crate) fn new(kind: RecordKind, store: Arc<StoreAdapter>, initial: Vec<T>) -> Self {
        let (records, _) = watch::channel(initial);
        Self {
            kind,
            store,
            records,
            write_gate: Mutex::new(()),
        }
    }

    /// Read whatever was persisted for `kind`
    ///
    /// Returns `None` only when neither backend stores `kind` at all; a
    /// stored empty collection is adopted as empty. Records found only in the
    /// fallback store are migrated into the primary.
    pub(crate) async fn load_persisted(
        store: &StoreAdapter,
        kind: RecordKind,
    ) -> Result<Option<Vec<T>>> {
        let primary = match store.find_in::<T>(Backend::Primary, kind).await {
            Ok(Some(records)) if !records.is_empty() => return Ok(Some(records)),
            Ok(records) => records,
            Err(err) => {
                warn!("Failed to read {} from primary store: {}", kind, err);
                None
            }
        };

        let fallback = match store.find_in::<T>(Backend::Fallback, kind).await {
            Ok(records) => records,
            Err(err) if primary.is_some() => {
                warn!("Failed to read {} from fallback store: {}", kind, err);
                None
            }
            Err(err) => return Err(err),
        };

        match fallback {
            Some(records) if !records.is_empty() => {
                info!("Migrating {} {} from fallback store", records.len(), kind);
                if let Err(err) = store.save(kind, &records).await {
                    warn!("Failed to migrate {}: {}", kind, err);
                }
                Ok(Some(records))
            }
            fallback => Ok(primary.or(fallback)),
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.records.borrow().clone()
    }

    /// Run a synchronous query against the current collection
    pub(crate) fn read<R>(&self, query: impl FnOnce(&[T]) -> R) -> R {
        query(&self.records.borrow())
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.records.subscribe()
    }

    /// Apply `mutation`, publish the result, then persist it
    ///
    /// Subscribers observe the new collection before persistence completes.
    /// A persistence failure is logged and the in-memory change is kept.
    pub(crate) async fn mutate<R>(&self, mutation: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let _gate = self.write_gate.lock().await;

        let mut records = self.snapshot();
        let result = mutation(&mut records);
        self.records.send_replace(records.clone());

        if let Err(err) = self.store.save(self.kind, &records).await {
            error!("Failed to persist {}: {}", self.kind, err);
        }
        result
    }

    /// Replace the whole collection
    pub(crate) async fn replace(&self, records: Vec<T>) {
        self.mutate(|current| *current = records).await
    }
}
