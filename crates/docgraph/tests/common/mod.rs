//! Entities and store helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use docgraph::store::proto::{Document, Value, WriteResult};
use docgraph::store::{DocumentStore, MemoryStore, StoreError};
use docgraph::{lens, Engine, EngineConfig, Entity, FieldDef, LazyRefs, ModelBuilder, Shared};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Person {
    pub id: Option<Uuid>,
    pub name: String,
    pub born: Option<DateTime<Utc>>,
}

impl Entity for Person {
    const COLLECTION: &'static str = "Person";

    fn describe(model: ModelBuilder<Self>) -> ModelBuilder<Self> {
        model
            .field(FieldDef::identity(lens!(id)))
            .field(FieldDef::scalar("name", lens!(name)).with_index())
            .field(FieldDef::scalar("born", lens!(born)))
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Chapter {
    pub id: Option<Uuid>,
    pub title: String,
    pub pages: u32,
}

impl Entity for Chapter {
    const COLLECTION: &'static str = "Chapter";

    fn describe(model: ModelBuilder<Self>) -> ModelBuilder<Self> {
        model
            .field(FieldDef::identity(lens!(id)))
            .field(FieldDef::scalar("title", lens!(title)))
            .field(FieldDef::scalar("pages", lens!(pages)))
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tag {
    pub id: Option<Uuid>,
    pub label: String,
}

impl Entity for Tag {
    const COLLECTION: &'static str = "Tag";

    fn describe(model: ModelBuilder<Self>) -> ModelBuilder<Self> {
        model
            .field(FieldDef::identity(lens!(id)))
            .field(FieldDef::scalar("label", lens!(label)))
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Book {
    pub id: Option<Uuid>,
    pub title: String,
    pub isbn: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub rating: f64,
    pub in_print: bool,
    pub keywords: Vec<String>,
    pub catalog_ref: Uuid,
    pub author: Option<Person>,
    pub editor: Option<Person>,
    pub chapters: Vec<Chapter>,
    pub tags: Vec<Shared<Tag>>,
    pub scratch: String,
}

impl Entity for Book {
    const COLLECTION: &'static str = "Book";

    fn describe(model: ModelBuilder<Self>) -> ModelBuilder<Self> {
        model
            .field(FieldDef::identity(lens!(id)))
            .field(FieldDef::scalar("title", lens!(title)).with_index())
            .field(FieldDef::scalar("isbn", lens!(isbn)))
            .field(FieldDef::scalar("published", lens!(published)))
            .field(FieldDef::scalar("rating", lens!(rating)))
            .field(FieldDef::scalar("in_print", lens!(in_print)))
            .field(FieldDef::scalar("keywords", lens!(keywords)))
            .field(FieldDef::scalar("catalog_ref", lens!(catalog_ref)))
            .field(FieldDef::owned("author", lens!(author)))
            .field(FieldDef::owned("editor", lens!(editor)).no_cascade())
            .field(FieldDef::owned_many("chapters", lens!(chapters)))
            .field(FieldDef::shared_many("tags", lens!(tags)))
            .field(FieldDef::scalar("scratch", lens!(scratch)).excluded())
    }
}

/// A shelf holding lazily loaded volumes (owned) and topics (shared).
#[derive(Debug, Default)]
pub struct Shelf {
    pub id: Option<Uuid>,
    pub label: String,
    pub volumes: LazyRefs<Chapter>,
    pub topics: LazyRefs<Tag>,
}

impl Entity for Shelf {
    const COLLECTION: &'static str = "Shelf";

    fn describe(model: ModelBuilder<Self>) -> ModelBuilder<Self> {
        model
            .field(FieldDef::identity(lens!(id)))
            .field(FieldDef::scalar("label", lens!(label)))
            .field(FieldDef::owned_many("volumes", lens!(volumes)))
            .field(FieldDef::shared_many("topics", lens!(topics)))
    }
}

/// A self-referential chain.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Node {
    pub id: Option<Uuid>,
    pub value: i64,
    pub next: Option<Box<Node>>,
}

impl Entity for Node {
    const COLLECTION: &'static str = "Node";

    fn describe(model: ModelBuilder<Self>) -> ModelBuilder<Self> {
        model
            .field(FieldDef::identity(lens!(id)))
            .field(FieldDef::scalar("value", lens!(value)))
            .field(FieldDef::owned::<Node, _>("next", lens!(next)))
    }
}

pub fn person(name: &str) -> Person {
    Person {
        name: name.to_string(),
        ..Default::default()
    }
}

pub fn chapter(title: &str, pages: u32) -> Chapter {
    Chapter {
        title: title.to_string(),
        pages,
        ..Default::default()
    }
}

pub fn tag(label: &str) -> Tag {
    Tag {
        label: label.to_string(),
        ..Default::default()
    }
}

/// An engine over a fresh in-memory store.
pub fn memory_engine() -> (Engine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(store.clone(), EngineConfig::new("test"));
    (engine, store)
}

/// A store that fails chosen primitives, wrapping a [`MemoryStore`].
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing_deletes: Mutex<HashSet<String>>,
    rejected_upserts: Mutex<HashSet<String>>,
    hide_listings: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make deletes in `collection` fail with a connection error.
    pub fn fail_deletes_in(&self, collection: &str) {
        self.failing_deletes.lock().insert(collection.to_string());
    }

    /// Report no collections and no indexes, as a store seen by a handle
    /// that lost a creation race would.
    pub fn hide_listings(&self) {
        self.hide_listings.store(true, Ordering::Relaxed);
    }

    /// Make upserts into `collection` report a write error.
    pub fn reject_upserts_in(&self, collection: &str) {
        self.rejected_upserts.lock().insert(collection.to_string());
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        if self.hide_listings.load(Ordering::Relaxed) {
            return Ok(Vec::new());
        }
        self.inner.list_collections().await
    }

    async fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        self.inner.create_collection(name).await
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        if self.hide_listings.load(Ordering::Relaxed) {
            return Ok(Vec::new());
        }
        self.inner.list_indexes(collection).await
    }

    async fn create_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        self.inner.create_index(collection, field).await
    }

    async fn wait_for_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        self.inner.wait_for_index(collection, field).await
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn upsert(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<WriteResult, StoreError> {
        if self.rejected_upserts.lock().contains(collection) {
            return Ok(WriteResult::failed("document rejected"));
        }
        self.inner.upsert(collection, document).await
    }

    async fn query_by_index(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        self.inner.query_by_index(collection, field, value).await
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        if self.failing_deletes.lock().contains(collection) {
            return Err(StoreError::Connection("connection reset".to_string()));
        }
        self.inner.delete(collection, id).await
    }
}
