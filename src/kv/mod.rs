//! The key-value collaborator underneath the storage core.
//!
//! The store is an opaque string→string map: no ordering, no querying, no
//! transactions. Everything smarter (scans, filters, soft deletion) lives in
//! the layers above. Two implementations ship with the crate: an in-memory
//! map and a file-backed store owned by a dedicated worker thread.

use async_trait::async_trait;

use crate::error::Result;

mod file;
mod memory;

pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read one key. `Ok(None)` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write one key. Single-key writes are the only atomicity the store offers.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove one key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// List every key starting with `prefix` (empty prefix lists all keys).
    /// No ordering is guaranteed.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Bulk read; result positions mirror the requested keys.
    async fn multi_get(&self, keys: &[String]) -> Result<Vec<Option<String>>>;

    /// Bulk remove; absent keys are skipped silently.
    async fn multi_remove(&self, keys: &[String]) -> Result<()>;
}
