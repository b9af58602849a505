//! Embedded persistent document store on sled.
//!
//! Layout, per database namespace `db`:
//!
//! - `db/_catalog`: `collection:<name>` and `index:<collection>\0<field>` keys;
//!   index keys hold the build state (`building` / `ready`).
//! - `db/<collection>`: document id (16 bytes) -> JSON document.
//! - `db/<collection>#<field>`: secondary index entries (see [`crate::index`]).
//!
//! Index creation returns immediately; existing documents are indexed by a
//! blocking task and [`DocumentStore::wait_for_index`] waits for it. Writes
//! maintain every registered index, including ones still building. Queries
//! re-check the indexed value on the fetched document, so an entry left behind
//! by a racing backfill never produces a wrong match.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sled::{Db, Tree};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use docgraph_proto::{Document, Value, WriteResult};

use crate::config::StorageConfig;
use crate::error::StoreError;
use crate::index;
use crate::metrics::{StoreMetrics, StoreOp};
use crate::store::DocumentStore;

const COLLECTION_PREFIX: &str = "collection:";
const INDEX_PREFIX: &str = "index:";
const INDEX_BUILDING: &[u8] = b"building";
const INDEX_READY: &[u8] = b"ready";

/// Build state published by a background index build.
#[derive(Debug, Clone, PartialEq, Eq)]
enum IndexState {
    Building,
    Ready,
    Failed(String),
}

/// A document store persisted with sled.
pub struct SledStore {
    db: Db,
    database: String,
    catalog: Tree,
    builds: Arc<Mutex<HashMap<Vec<u8>, watch::Receiver<IndexState>>>>,
    metrics: Arc<StoreMetrics>,
}

impl SledStore {
    /// Open or create a store with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, StoreError> {
        let db = config.to_sled_config().open()?;
        let catalog = db.open_tree(format!("{}/_catalog", config.database))?;

        info!(
            database = %config.database,
            recovered = db.was_recovered(),
            "opened sled document store"
        );

        Ok(Self {
            db,
            database: config.database,
            catalog,
            builds: Arc::new(Mutex::new(HashMap::new())),
            metrics: Arc::new(StoreMetrics::new()),
        })
    }

    /// Database namespace of this store.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Call counters.
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    /// Flush all pending writes to disk.
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.db.flush_async().await?;
        Ok(())
    }

    fn collection_key(name: &str) -> Vec<u8> {
        format!("{}{}", COLLECTION_PREFIX, name).into_bytes()
    }

    fn index_prefix(collection: &str) -> Vec<u8> {
        let mut key = format!("{}{}", INDEX_PREFIX, collection).into_bytes();
        key.push(0x00);
        key
    }

    fn index_key(collection: &str, field: &str) -> Vec<u8> {
        let mut key = Self::index_prefix(collection);
        key.extend_from_slice(field.as_bytes());
        key
    }

    /// Open the document tree of an existing collection.
    fn documents(&self, collection: &str) -> Result<Tree, StoreError> {
        if !self.catalog.contains_key(Self::collection_key(collection))? {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }
        Ok(self
            .db
            .open_tree(format!("{}/{}", self.database, collection))?)
    }

    fn index_tree(&self, collection: &str, field: &str) -> Result<Tree, StoreError> {
        Ok(self
            .db
            .open_tree(format!("{}/{}#{}", self.database, collection, field))?)
    }

    /// Fields with a registered index, whatever their build state.
    fn indexed_fields(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        let prefix = Self::index_prefix(collection);
        let mut fields = Vec::new();
        for item in self.catalog.scan_prefix(&prefix) {
            let (key, _) = item?;
            fields.push(String::from_utf8_lossy(&key[prefix.len()..]).into_owned());
        }
        Ok(fields)
    }

    /// Bring every index of `collection` in line with a document change.
    fn reindex(
        &self,
        collection: &str,
        id: Uuid,
        old: Option<&Document>,
        new: Option<&Document>,
    ) -> Result<(), StoreError> {
        for field in self.indexed_fields(collection)? {
            let tree = self.index_tree(collection, &field)?;
            if let Some(old) = old {
                index::remove_entry(&tree, &field, id, old)?;
            }
            if let Some(new) = new {
                index::insert_entry(&tree, &field, id, new)?;
            }
        }
        Ok(())
    }

    fn index_not_found(collection: &str, field: &str) -> StoreError {
        StoreError::IndexNotFound {
            collection: collection.to_string(),
            index: field.to_string(),
        }
    }
}

#[async_trait]
impl DocumentStore for SledStore {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        self.metrics.record(StoreOp::ListCollections);
        let mut names = Vec::new();
        for item in self.catalog.scan_prefix(COLLECTION_PREFIX) {
            let (key, _) = item?;
            names.push(String::from_utf8_lossy(&key[COLLECTION_PREFIX.len()..]).into_owned());
        }
        Ok(names)
    }

    async fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        self.metrics.record(StoreOp::CreateCollection);
        let created = self
            .catalog
            .compare_and_swap(Self::collection_key(name), None as Option<&[u8]>, Some(&[] as &[u8]))?;
        if created.is_err() {
            return Err(StoreError::CollectionExists(name.to_string()));
        }
        self.db.open_tree(format!("{}/{}", self.database, name))?;
        debug!(database = %self.database, collection = name, "created collection");
        Ok(())
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        self.metrics.record(StoreOp::ListIndexes);
        self.documents(collection)?;
        self.indexed_fields(collection)
    }

    async fn create_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        self.metrics.record(StoreOp::CreateIndex);
        let documents = self.documents(collection)?;
        let key = Self::index_key(collection, field);

        let registered =
            self.catalog
                .compare_and_swap(&key, None as Option<&[u8]>, Some(INDEX_BUILDING))?;
        if registered.is_err() {
            return Err(StoreError::IndexExists {
                collection: collection.to_string(),
                index: field.to_string(),
            });
        }

        let tree = self.index_tree(collection, field)?;
        let (tx, rx) = watch::channel(IndexState::Building);
        self.builds.lock().insert(key.clone(), rx);

        let catalog = self.catalog.clone();
        let builds = Arc::clone(&self.builds);
        let collection = collection.to_string();
        let field = field.to_string();
        tokio::task::spawn_blocking(move || {
            let state = match index::backfill(&documents, &tree, &field)
                .and_then(|count| Ok(catalog.insert(&key, INDEX_READY).map(|_| count)?))
            {
                Ok(count) => {
                    debug!(collection = %collection, field = %field, entries = count, "index ready");
                    IndexState::Ready
                }
                Err(e) => {
                    warn!(collection = %collection, field = %field, error = %e, "index build failed");
                    IndexState::Failed(e.to_string())
                }
            };
            if let Err(e) = tx.send(state) {
                debug!(collection = %collection, field = %field, state = ?e.0, "no listener for index build state");
            }
            builds.lock().remove(&key);
        });

        Ok(())
    }

    async fn wait_for_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        self.metrics.record(StoreOp::WaitForIndex);
        let key = Self::index_key(collection, field);

        match self.catalog.get(&key)? {
            None => return Err(Self::index_not_found(collection, field)),
            Some(state) if &*state == INDEX_READY => return Ok(()),
            Some(_) => {}
        }

        let build = self.builds.lock().get(&key).cloned();
        let Some(mut rx) = build else {
            // No build in flight (left behind by an earlier process, or a
            // failed build already reported): rebuild in place.
            let documents = self.documents(collection)?;
            let tree = self.index_tree(collection, field)?;
            index::backfill(&documents, &tree, field)?;
            self.catalog.insert(&key, INDEX_READY)?;
            return Ok(());
        };

        let state = rx
            .wait_for(|state| *state != IndexState::Building)
            .await
            .map(|state| (*state).clone())
            .map_err(|_| StoreError::IndexBuild {
                collection: collection.to_string(),
                index: field.to_string(),
                reason: "build task exited without reporting".to_string(),
            })?;
        self.builds.lock().remove(&key);

        match state {
            IndexState::Failed(reason) => Err(StoreError::IndexBuild {
                collection: collection.to_string(),
                index: field.to_string(),
                reason,
            }),
            _ => Ok(()),
        }
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.metrics.record(StoreOp::Get);
        let documents = self.documents(collection)?;
        match documents.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(Document::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn upsert(
        &self,
        collection: &str,
        mut document: Document,
    ) -> Result<WriteResult, StoreError> {
        self.metrics.record(StoreOp::Upsert);
        let documents = self.documents(collection)?;
        let (id, generated) = match document.ensure_id(Uuid::new_v4) {
            Ok(assigned) => assigned,
            Err(e) => return Ok(WriteResult::failed(e.to_string())),
        };

        let previous = documents.insert(id.as_bytes(), document.to_bytes()?)?;
        let previous = previous
            .map(|bytes| Document::from_bytes(&bytes))
            .transpose()?;
        self.reindex(collection, id, previous.as_ref(), Some(&document))?;

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
        let documents = self.documents(collection)?;
        if !self.catalog.contains_key(Self::index_key(collection, field))? {
            return Err(Self::index_not_found(collection, field));
        }
        if value.is_null() {
            return Ok(Vec::new());
        }

        let tree = self.index_tree(collection, field)?;
        let mut found = Vec::new();
        for item in tree.scan_prefix(index::value_prefix(value)?) {
            let (key, _) = item?;
            let Some(id) = index::entry_id(&key) else {
                continue;
            };
            if let Some(bytes) = documents.get(id.as_bytes())? {
                let doc = Document::from_bytes(&bytes)?;
                if doc.get(field) == Some(value) {
                    found.push(doc);
                }
            }
        }
        Ok(found)
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        self.metrics.record(StoreOp::Delete);
        let documents = self.documents(collection)?;
        match documents.remove(id.as_bytes())? {
            Some(bytes) => {
                let old = Document::from_bytes(&bytes)?;
                self.reindex(collection, id, Some(&old), None)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("database", &self.database)
            .field("pending_builds", &self.builds.lock().len())
            .finish()
    }
}
