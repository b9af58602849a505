//! In-process document store.
//!
//! Keeps every collection in a `BTreeMap` behind a single lock. Indexes are
//! ready as soon as they are created; queries scan the collection and filter on
//! the indexed field. Iteration order is identity order.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use docgraph_proto::{Document, Value, WriteResult};

use crate::error::StoreError;
use crate::metrics::{StoreMetrics, StoreOp};
use crate::store::DocumentStore;

#[derive(Debug, Default)]
struct MemCollection {
    documents: BTreeMap<Uuid, Document>,
    indexes: BTreeSet<String>,
}

/// A document store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, MemCollection>>,
    metrics: StoreMetrics,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call counters.
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    /// Number of documents in a collection, `None` if it does not exist.
    pub fn document_count(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.documents.len())
    }

    /// Check whether a document exists.
    pub fn contains(&self, collection: &str, id: Uuid) -> bool {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.documents.contains_key(&id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        self.metrics.record(StoreOp::ListCollections);
        Ok(self.collections.read().keys().cloned().collect())
    }

    async fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        self.metrics.record(StoreOp::CreateCollection);
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(StoreError::CollectionExists(name.to_string()));
        }
        collections.insert(name.to_string(), MemCollection::default());
        Ok(())
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        self.metrics.record(StoreOp::ListIndexes);
        let collections = self.collections.read();
        let coll = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        Ok(coll.indexes.iter().cloned().collect())
    }

    async fn create_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        self.metrics.record(StoreOp::CreateIndex);
        let mut collections = self.collections.write();
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        if !coll.indexes.insert(field.to_string()) {
            return Err(StoreError::IndexExists {
                collection: collection.to_string(),
                index: field.to_string(),
            });
        }
        Ok(())
    }

    async fn wait_for_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        self.metrics.record(StoreOp::WaitForIndex);
        let collections = self.collections.read();
        let coll = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        if coll.indexes.contains(field) {
            Ok(())
        } else {
            Err(StoreError::IndexNotFound {
                collection: collection.to_string(),
                index: field.to_string(),
            })
        }
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.metrics.record(StoreOp::Get);
        let collections = self.collections.read();
        let coll = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        Ok(coll.documents.get(&id).cloned())
    }

    async fn upsert(
        &self,
        collection: &str,
        mut document: Document,
    ) -> Result<WriteResult, StoreError> {
        self.metrics.record(StoreOp::Upsert);
        let (id, generated) = match document.ensure_id(Uuid::new_v4) {
            Ok(assigned) => assigned,
            Err(e) => return Ok(WriteResult::failed(e.to_string())),
        };

        let mut collections = self.collections.write();
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        let previous = coll.documents.insert(id, document);
        Ok(match (previous, generated) {
            (Some(_), _) => WriteResult::replaced(),
            (None, true) => WriteResult::inserted(Some(id)),
            (None, false) => WriteResult::inserted(None),
        })
    }

    async fn query_by_index(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        self.metrics.record(StoreOp::Query);
        let collections = self.collections.read();
        let coll = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        if !coll.indexes.contains(field) {
            return Err(StoreError::IndexNotFound {
                collection: collection.to_string(),
                index: field.to_string(),
            });
        }
        if value.is_null() {
            return Ok(Vec::new());
        }

        Ok(coll
            .documents
            .values()
            .filter(|doc| doc.get(field) == Some(value))
            .cloned()
            .collect())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        self.metrics.record(StoreOp::Delete);
        let mut collections = self.collections.write();
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        Ok(coll.documents.remove(&id).is_some())
    }
}
