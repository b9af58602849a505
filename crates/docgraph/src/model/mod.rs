//! Entity models.
//!
//! An entity type describes its fields once, in [`Entity::describe`]. The
//! description is validated and turned into a [`Model`]: the per-type table of
//! field classifications and accessors every engine operation walks. Models are
//! built on first use and cached per engine.
//!
//! ```ignore
//! #[derive(Debug, Default)]
//! struct Book {
//!     id: Option<Uuid>,
//!     title: String,
//!     author: Option<Person>,
//!     chapters: Vec<Chapter>,
//!     tags: LazyRefs<Tag>,
//! }
//!
//! impl Entity for Book {
//!     const COLLECTION: &'static str = "Book";
//!
//!     fn describe(model: ModelBuilder<Self>) -> ModelBuilder<Self> {
//!         model
//!             .field(FieldDef::identity(lens!(id)))
//!             .field(FieldDef::scalar("title", lens!(title)).with_index())
//!             .field(FieldDef::owned("author", lens!(author)))
//!             .field(FieldDef::owned_many("chapters", lens!(chapters)))
//!             .field(FieldDef::shared_many("tags", lens!(tags)))
//!     }
//! }
//! ```

pub(crate) mod access;
pub mod field;
pub mod lens;
pub(crate) mod registry;
pub mod scalar;

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::{Error, Result};
use access::Access;
pub use field::{FieldDef, FieldDescriptor, FieldKind};
pub use lens::Lens;
pub use scalar::{Scalar, ScalarType};

/// A persisted entity type.
pub trait Entity: Default + Send + Sync + 'static {
    /// Collection the entity is stored in.
    const COLLECTION: &'static str;

    /// Declare the fields of the entity.
    fn describe(model: ModelBuilder<Self>) -> ModelBuilder<Self>;
}

/// Collects the field definitions of an entity.
pub struct ModelBuilder<E> {
    fields: Vec<FieldDef<E>>,
}

impl<E: Entity> ModelBuilder<E> {
    fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Add a field.
    pub fn field(mut self, field: FieldDef<E>) -> Self {
        self.fields.push(field);
        self
    }
}

/// Validated field table of an entity type.
pub struct Model<E> {
    collection: &'static str,
    identity: Lens<E, Option<Uuid>>,
    fields: Vec<FieldDef<E>>,
}

impl<E: Entity> Model<E> {
    /// Build and validate the model of `E`.
    pub fn build() -> Result<Self> {
        let builder = E::describe(ModelBuilder::new());
        let entity = E::COLLECTION;

        if entity.is_empty() {
            return Err(Error::invalid_model(entity, "empty collection name"));
        }

        let mut identity = None;
        let mut names = HashSet::new();
        let mut keys = HashSet::new();
        let mut joins = HashSet::new();

        for field in &builder.fields {
            let descriptor = field.descriptor();
            if !names.insert(descriptor.name) {
                return Err(Error::invalid_model(
                    entity,
                    format!("field `{}` declared twice", descriptor.name),
                ));
            }
            if descriptor.indexed && !matches!(descriptor.kind, FieldKind::Scalar(_)) {
                return Err(Error::invalid_model(
                    entity,
                    format!("only scalar fields can be indexed, not `{}`", descriptor.name),
                ));
            }

            if let Access::Identity(lens) = &field.access {
                if descriptor.excluded {
                    return Err(Error::invalid_model(entity, "identity cannot be excluded"));
                }
                if identity.replace(*lens).is_some() {
                    return Err(Error::invalid_model(entity, "more than one identity field"));
                }
            }
            if descriptor.excluded {
                continue;
            }

            if let Some(key) = descriptor.wire_key() {
                if !keys.insert(key.clone()) {
                    return Err(Error::invalid_model(
                        entity,
                        format!("field `{}` collides on document key `{}`", descriptor.name, key),
                    ));
                }
            }
            if descriptor.kind == FieldKind::SharedSequence {
                if let Some(child) = descriptor.child {
                    if !joins.insert(child) {
                        return Err(Error::invalid_model(
                            entity,
                            format!(
                                "field `{}` shares the join relation to `{}` with another field",
                                descriptor.name, child
                            ),
                        ));
                    }
                }
            }
        }

        let identity =
            identity.ok_or_else(|| Error::invalid_model(entity, "no identity field"))?;

        Ok(Self {
            collection: entity,
            identity,
            fields: builder.fields,
        })
    }

    /// Collection the entity is stored in.
    pub fn collection(&self) -> &'static str {
        self.collection
    }

    /// Classification of the participating fields, in declaration order.
    pub fn classify(&self) -> Vec<FieldDescriptor> {
        self.participating()
            .map(|field| field.descriptor().clone())
            .collect()
    }

    /// Identity of `entity`, if assigned. The nil identity counts as
    /// unassigned.
    pub fn id(&self, entity: &E) -> Option<Uuid> {
        (*self.identity.get(entity)).filter(|id| !id.is_nil())
    }

    pub(crate) fn set_id(&self, entity: &mut E, id: Uuid) {
        *self.identity.get_mut(entity) = Some(id);
    }

    /// Fields with a secondary index.
    pub fn indexed_fields(&self) -> Vec<&'static str> {
        self.participating()
            .filter(|field| field.descriptor().indexed)
            .map(FieldDef::name)
            .collect()
    }

    /// Join relations of the shared sequences, as `(relation, child)` pairs.
    pub fn join_relations(&self) -> Vec<(String, &'static str)> {
        self.participating()
            .filter(|field| field.descriptor().kind == FieldKind::SharedSequence)
            .filter_map(|field| field.descriptor().child)
            .map(|child| (docgraph_proto::join_collection(self.collection, child), child))
            .collect()
    }

    pub(crate) fn participating(&self) -> impl Iterator<Item = &FieldDef<E>> {
        self.fields
            .iter()
            .filter(|field| !field.descriptor().excluded)
    }
}

impl<E> std::fmt::Debug for Model<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("collection", &self.collection)
            .field("fields", &self.fields)
            .finish()
    }
}
