//! Cascade delete.
//!
//! `trash` removes an entity together with what it owns:
//! - an owned single child is trashed recursively, unless the field is marked
//!   `no_cascade`,
//! - every element of an owned sequence is trashed recursively; elements of a
//!   lazy sequence that were never loaded are loaded first so their own
//!   children are found,
//! - a shared sequence only loses the join rows pointing at the parent. The
//!   shared children stay.
//!
//! The entity's own row goes last. Nothing is transactional: when a delete
//! fails midway the error is returned and the rows already deleted stay
//! deleted.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use docgraph_proto::PARENT_KEY;

use crate::container::{Element, RefContainer, RefSlot};
use crate::engine::Engine;
use crate::error::Result;
use crate::model::access::{Access, OneAccess, SequenceAccess};
use crate::model::{Entity, FieldKind};

/// Rows removed by a cascade delete.
#[derive(Debug, Default)]
pub struct TrashReport {
    /// Entity rows deleted, as `(collection, id)`.
    pub deleted: Vec<(String, Uuid)>,
    /// Join rows deleted, as `(join relation, row id)`.
    pub unlinked: Vec<(String, Uuid)>,
    visited: HashSet<(String, Uuid)>,
}

impl TrashReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows deleted.
    pub fn affected_count(&self) -> usize {
        self.deleted.len() + self.unlinked.len()
    }

    /// Check whether the row `(collection, id)` was deleted.
    pub fn contains(&self, collection: &str, id: Uuid) -> bool {
        self.deleted
            .iter()
            .any(|(name, deleted)| name == collection && *deleted == id)
    }

    /// Mark a row as walked. Returns false if it was walked before.
    fn visit(&mut self, collection: &str, id: Uuid) -> bool {
        self.visited.insert((collection.to_string(), id))
    }

    fn visited(&self, collection: &str, id: Uuid) -> bool {
        self.visited.contains(&(collection.to_string(), id))
    }
}

/// Trash half of a relation field.
#[async_trait]
pub(crate) trait TrashRelation<E: Entity>: Send + Sync {
    /// Trash what the field of `entity` references. `id` is the parent
    /// identity, if it was ever stored.
    async fn trash(
        &self,
        engine: &Engine,
        id: Option<Uuid>,
        entity: &E,
        report: &mut TrashReport,
    ) -> Result<()>;
}

#[async_trait]
impl<E: Entity, C: Entity, S: RefSlot<C>> TrashRelation<E> for OneAccess<E, C, S> {
    async fn trash(
        &self,
        engine: &Engine,
        _id: Option<Uuid>,
        entity: &E,
        report: &mut TrashReport,
    ) -> Result<()> {
        if let Some(child) = self.slot(entity).child() {
            engine.trash_into(child, report).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<E: Entity, T: RefContainer> TrashRelation<E> for SequenceAccess<E, T> {
    async fn trash(
        &self,
        engine: &Engine,
        id: Option<Uuid>,
        entity: &E,
        report: &mut TrashReport,
    ) -> Result<()> {
        if self.shared {
            let Some(id) = id else {
                return Ok(());
            };
            let backend = engine.backend();
            let rows = backend
                .query_by_index(&self.join, PARENT_KEY, &Value::String(id.to_string()))
                .await?;
            for row in rows {
                if let Some(row_id) = row.id()? {
                    if backend.delete(&self.join, row_id).await? {
                        report.unlinked.push((self.join.clone(), row_id));
                    }
                }
            }
            return Ok(());
        }

        let container = self.container(entity);
        for position in 0..container.len() {
            match container.element(position) {
                Some(Element::Loaded { value, .. }) => engine.trash_into(value, report).await?,
                Some(Element::Pending(pending)) => {
                    if report.visited(&pending.source, pending.id) {
                        continue;
                    }
                    match engine
                        .load_from::<T::Child>(&pending.source, pending.id)
                        .await
                    {
                        Ok(child) => engine.trash_into(&child, report).await?,
                        Err(e) if e.is_not_found() => {
                            debug!(collection = %pending.source, id = %pending.id, "owned element already gone")
                        }
                        Err(e) => return Err(e),
                    }
                }
                None => {}
            }
        }
        Ok(())
    }
}

impl Engine {
    /// Delete `entity`, its owned descendants and its join rows.
    pub async fn trash<E: Entity>(&self, entity: &E) -> Result<TrashReport> {
        let mut report = TrashReport::new();
        self.trash_into(entity, &mut report).await?;
        Ok(report)
    }

    /// Load the entity stored under `id`, then trash it.
    pub async fn trash_by_id<E: Entity>(&self, id: Uuid) -> Result<TrashReport> {
        let entity = self.load::<E>(id).await?;
        self.trash(&entity).await
    }

    pub(crate) async fn trash_into<E: Entity>(
        &self,
        entity: &E,
        report: &mut TrashReport,
    ) -> Result<()> {
        let model = self.prepare::<E>().await?;
        let collection = model.collection();
        let id = model.id(entity);

        if let Some(id) = id {
            if !report.visit(collection, id) {
                return Ok(());
            }
        }

        for field in model.participating() {
            let Access::Relation(access) = &field.access else {
                continue;
            };
            let descriptor = field.descriptor();
            if descriptor.cascade || descriptor.kind == FieldKind::SharedSequence {
                access.trash(self, id, entity, report).await?;
            }
        }

        if let Some(id) = id {
            if self.backend().delete(collection, id).await? {
                report.deleted.push((collection.to_string(), id));
                debug!(collection, %id, "trashed entity");
            } else {
                debug!(collection, %id, "entity row already gone");
            }
        }
        Ok(())
    }
}
