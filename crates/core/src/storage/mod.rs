//! Key-value storage
//!
//! Backends implement [`KeyValueBackend`]; the [`StoreAdapter`] composes a
//! primary and a fallback backend and knows how tasks, categories and
//! settings are laid out on top of them.

mod adapter;
mod backend;
mod file_backend;
mod memory_backend;

pub use adapter::{Backend, Backup, ImportRequest, RecordKind, StorageInfo, StoreAdapter, SETTING_PREFIX};
pub use backend::{KeyValueBackend, SharedBackend};
pub use file_backend::FileBackend;
pub use memory_backend::MemoryBackend;

#[cfg(test)]
pub(crate) mod testing;
