//! The document store contract consumed by the engine.

use async_trait::async_trait;
use docgraph_proto::{Document, Value, WriteResult};
use uuid::Uuid;

use crate::error::StoreError;

/// Primitives a schemaless document store must offer.
///
/// Collections hold flat documents keyed by the reserved `id` key. Secondary
/// indexes are built per field and may become usable only after
/// [`wait_for_index`](DocumentStore::wait_for_index) returns.
///
/// Implementations report redundant creation with
/// [`StoreError::CollectionExists`] / [`StoreError::IndexExists`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Names of all collections.
    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;

    /// Create a collection.
    async fn create_collection(&self, name: &str) -> Result<(), StoreError>;

    /// Names of all secondary indexes of a collection.
    async fn list_indexes(&self, collection: &str) -> Result<Vec<String>, StoreError>;

    /// Start building a secondary index on `field`.
    async fn create_index(&self, collection: &str, field: &str) -> Result<(), StoreError>;

    /// Wait until the index on `field` is ready for queries.
    async fn wait_for_index(&self, collection: &str, field: &str) -> Result<(), StoreError>;

    /// Fetch a document by identity.
    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Insert a document, replacing any document with the same identity.
    ///
    /// A document without an identity gets one generated by the store, reported
    /// in [`WriteResult::generated_keys`]. Rejected writes are reported through
    /// [`WriteResult::errors`] rather than as an `Err`.
    async fn upsert(&self, collection: &str, document: Document)
        -> Result<WriteResult, StoreError>;

    /// All documents whose indexed `field` equals `value`.
    async fn query_by_index(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError>;

    /// Delete a document by identity. Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError>;
}
