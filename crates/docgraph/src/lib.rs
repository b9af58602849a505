//! docgraph - persist in-memory object graphs to a schemaless document store.
//!
//! Entities describe their fields once; the engine then stores, loads and
//! trashes whole graphs of them. Three relationship kinds are supported:
//!
//! - owned single references (`Option<C>`), written as `<field>_id`,
//! - owned reference sequences (`Vec<C>`, `LazyRefs<C>`), written as
//!   `<field>_list`,
//! - shared reference sequences (`Vec<Shared<C>>`, `LazyRefs<C>`), recorded in
//!   a `<Parent>_<Child>` join relation.
//!
//! Collections, indexes and join relations are created on first use of a type
//! unless the engine is frozen.
//!
//! # Quick Start
//!
//! ```ignore
//! use docgraph::{lens, Engine, EngineConfig, Entity, FieldDef, ModelBuilder};
//! use uuid::Uuid;
//!
//! #[derive(Debug, Default)]
//! struct Note {
//!     id: Option<Uuid>,
//!     text: String,
//! }
//!
//! impl Entity for Note {
//!     const COLLECTION: &'static str = "Note";
//!
//!     fn describe(model: ModelBuilder<Self>) -> ModelBuilder<Self> {
//!         model
//!             .field(FieldDef::identity(lens!(id)))
//!             .field(FieldDef::scalar("text", lens!(text)))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Engine::open(EngineConfig::new("notes"))?;
//!
//!     let mut note = Note { text: "hello".into(), ..Default::default() };
//!     let id = engine.store(&mut note).await?;
//!
//!     let loaded: Note = engine.load(id).await?;
//!     assert_eq!(loaded.text, "hello");
//!
//!     engine.trash(&loaded).await?;
//!     Ok(())
//! }
//! ```

pub mod blocking;
pub mod cascade;
pub mod config;
pub mod container;
pub mod deserialize;
pub mod engine;
pub mod error;
pub mod lazy;
pub mod model;
pub mod schema;
pub mod serialize;
pub mod shared;

pub use blocking::BlockingEngine;
pub use cascade::TrashReport;
pub use config::EngineConfig;
pub use container::{Container, Element, ElementMut, Pending, RefContainer, RefSlot};
pub use engine::Engine;
pub use error::{Error, Result};
pub use lazy::{LazyRefs, Slot};
pub use model::{
    Entity, FieldDef, FieldDescriptor, FieldKind, Lens, Model, ModelBuilder, Scalar, ScalarType,
};
pub use shared::Shared;

/// Re-export of the document store crate.
pub use docgraph_store as store;
