//! Entity-agnostic persistence primitive over the key-value store.
//!
//! Every query is a full prefix scan: list keys, bulk read, decode, drop
//! soft-deleted records, then sort/filter/paginate in memory. There is no
//! secondary index; the global document ceiling keeps scans bounded. Any
//! change here must preserve the scan semantics — an index that reorders
//! results would change observable behavior.

use std::sync::Arc;

use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::codec;
use crate::error::{Result, StoreError};
use crate::kv::KeyValueStore;
use crate::models::EntityKind;
use crate::query::{sort_and_page_documents, FilterParams};

/// Ceiling across all document types, counted over physical keys.
pub const GLOBAL_CAPACITY: usize = 2000;

#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn KeyValueStore>,
}

impl StorageService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Direct access to the underlying store, for callers that need raw key
    /// inspection (tests, diagnostics).
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Write one new document. The caller must have populated `_id`.
    pub async fn add<T: Serialize>(&self, data: &T, kind: EntityKind) -> Result<()> {
        let doc = codec::to_document(data)?;
        let id = doc
            .get("_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::Validation("document is missing an _id".into()))?
            .to_string();

        let total = self.store.keys("").await?.len();
        if total >= GLOBAL_CAPACITY {
            warn!("Global capacity ceiling hit at {total} documents");
            return Err(StoreError::CapacityExceeded(format!(
                "store holds {total} documents, ceiling is {GLOBAL_CAPACITY}"
            )));
        }

        let key = kind.key(&id);
        let raw = serde_json::to_string(&Value::Object(doc))?;
        self.store.set(&key, &raw).await?;
        debug!("Added {key}");
        Ok(())
    }

    /// Scan every live document of a kind, then sort and paginate.
    /// An empty scan is `Ok(vec![])`, never an error.
    pub async fn get_all_by_type<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        params: &FilterParams,
    ) -> Result<Vec<T>> {
        let docs = self.scan_live(kind).await?;
        let page = sort_and_page_documents(docs, params)?;
        page.into_iter()
            .map(|doc| Ok(serde_json::from_value(doc)?))
            .collect()
    }

    pub async fn get_by_id<T: DeserializeOwned>(&self, kind: EntityKind, id: &str) -> Result<T> {
        let doc = self.read_live(kind, id).await?;
        codec::from_document(doc)
    }

    /// Read-modify-write: shallow-merge `patch` over the stored document and
    /// rewrite the same key. The caller stamps `updatedAt` into the patch.
    pub async fn update_by_id<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<T> {
        let mut doc = self.read_live(kind, id).await?;
        for (field, value) in patch {
            doc.insert(field, value);
        }
        self.write_document(kind, id, &doc).await?;
        codec::from_document(doc)
    }

    /// Flip `isDeleted` and keep the key. The record stays physically present
    /// but disappears from every scan and read.
    pub async fn soft_delete_by_id<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<T> {
        let mut doc = self.read_live(kind, id).await?;
        doc.insert("isDeleted".to_string(), Value::Bool(true));
        self.write_document(kind, id, &doc).await?;
        debug!("Soft-deleted {}", kind.key(id));
        codec::from_document(doc)
    }

    /// Physically remove the key, returning the record that was stored.
    pub async fn hard_delete_by_id<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<T> {
        let doc = self.read_live(kind, id).await?;
        self.store.remove(&kind.key(id)).await?;
        debug!("Hard-deleted {}", kind.key(id));
        codec::from_document(doc)
    }

    /// Remove every key under the kind's prefix. Idempotent on an empty prefix.
    pub async fn clear_all_by_type(&self, kind: EntityKind) -> Result<()> {
        let keys = self.store.keys(&kind.prefix()).await?;
        if !keys.is_empty() {
            self.store.multi_remove(&keys).await?;
        }
        debug!("Cleared {} documents under {}", keys.len(), kind.prefix());
        Ok(())
    }

    async fn scan_live(&self, kind: EntityKind) -> Result<Vec<Value>> {
        let keys = self.store.keys(&kind.prefix()).await?;
        let values = self.store.multi_get(&keys).await?;

        let mut docs = Vec::with_capacity(values.len());
        for raw in values.into_iter().flatten() {
            let doc: Value = serde_json::from_str(&raw)?;
            if !doc.is_object() {
                continue;
            }
            let deleted = doc
                .get("isDeleted")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if !deleted {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    async fn read_live(&self, kind: EntityKind, id: &str) -> Result<Map<String, Value>> {
        let key = kind.key(id);
        let raw = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{} {id}", kind.as_str())))?;

        let doc: Value = serde_json::from_str(&raw)?;
        let obj = match doc {
            Value::Object(obj) => obj,
            // A stored null or scalar counts as missing, not as corruption.
            _ => return Err(StoreError::NotFound(format!("{} {id}", kind.as_str()))),
        };

        let deleted = obj
            .get("isDeleted")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if deleted {
            return Err(StoreError::NotFound(format!("{} {id}", kind.as_str())));
        }
        Ok(obj)
    }

    async fn write_document(
        &self,
        kind: EntityKind,
        id: &str,
        doc: &Map<String, Value>,
    ) -> Result<()> {
        let raw = serde_json::to_string(&Value::Object(doc.clone()))?;
        self.store.set(&kind.key(id), &raw).await?;
        Ok(())
    }
}
