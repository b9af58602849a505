//! Storing entity graphs.
//!
//! `store` writes children before their parent, so every reference written
//! into the parent document already has an identity:
//!
//! - scalars are copied by value,
//! - an owned single child is stored and its identity written as `<field>_id`,
//! - owned sequence elements are stored in order and their identities written
//!   as `<field>_list`,
//! - shared sequence elements are stored, and one join row per element is
//!   staged until the parent identity is known.
//!
//! The parent is then upserted and its staged join rows flushed. A join-row
//! identity carried by an element is reused only when that row already links
//! this parent and no earlier element of the batch claimed it; every other
//! element gets a fresh row, and the identity the store assigns is stamped back
//! onto the element. Rows of a previously stored parent that no longer belong
//! to the sequence are deleted.
//!
//! Scalars of an entity are encoded before any of its children are written, so
//! a value with no wire representation fails the store early.
//!
//! Elements of a lazy sequence that were never loaded are not loaded here:
//! their identities are written as they are.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use docgraph_proto::{list_key, single_key, Document, JoinRow, WriteResult, PARENT_KEY};

use crate::container::{ElementMut, RefContainer, RefSlot};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::model::access::{Access, OneAccess, ScalarAccess, SequenceAccess};
use crate::model::Entity;

/// A join row to write once the parent identity is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StagedLink {
    pub(crate) child_id: Uuid,
    pub(crate) link: Option<Uuid>,
    pub(crate) position: usize,
}

/// The join rows of one shared sequence.
#[derive(Debug)]
pub(crate) struct LinkBatch {
    pub(crate) join: String,
    pub(crate) links: Vec<StagedLink>,
}

/// Store half of a relation field.
#[async_trait]
pub(crate) trait WriteRelation<E: Entity>: Send + Sync {
    /// Store the children and write their references into `doc`. Shared
    /// sequences return their staged join rows instead.
    async fn write(
        &self,
        engine: &Engine,
        entity: &mut E,
        doc: &mut Document,
    ) -> Result<Option<LinkBatch>>;

    /// Record the join-row identity of element `position`.
    fn stamp_link(&self, entity: &mut E, position: usize, link: Uuid);
}

#[async_trait]
impl<E: Entity, C: Entity, S: RefSlot<C>> WriteRelation<E> for OneAccess<E, C, S> {
    async fn write(
        &self,
        engine: &Engine,
        entity: &mut E,
        doc: &mut Document,
    ) -> Result<Option<LinkBatch>> {
        let key = single_key(self.name);
        match self.slot_mut(entity).child_mut() {
            Some(child) => {
                let id = engine.store(child).await?;
                doc.insert(key, id.to_string());
            }
            None => {
                doc.insert(key, Value::Null);
            }
        }
        Ok(None)
    }

    fn stamp_link(&self, _entity: &mut E, _position: usize, _link: Uuid) {}
}

#[async_trait]
impl<E: Entity, T: RefContainer> WriteRelation<E> for SequenceAccess<E, T> {
    async fn write(
        &self,
        engine: &Engine,
        entity: &mut E,
        doc: &mut Document,
    ) -> Result<Option<LinkBatch>> {
        let container = self.container_mut(entity);
        let mut ids = Vec::with_capacity(container.len());
        let mut links = Vec::new();

        for position in 0..container.len() {
            let (child_id, link) = match container.element_mut(position) {
                Some(ElementMut::Loaded { value, link }) => (engine.store(value).await?, link),
                Some(ElementMut::Pending(pending)) => (pending.id, pending.link),
                None => continue,
            };
            if self.shared {
                links.push(StagedLink {
                    child_id,
                    link,
                    position,
                });
            } else {
                ids.push(child_id);
            }
        }

        if self.shared {
            return Ok(Some(LinkBatch {
                join: self.join.clone(),
                links,
            }));
        }
        doc.set_uuid_list(list_key(self.name), &ids);
        Ok(None)
    }

    fn stamp_link(&self, entity: &mut E, position: usize, link: Uuid) {
        self.container_mut(entity).set_link(position, link);
    }
}

impl Engine {
    /// Store `entity` and everything it owns or shares.
    ///
    /// An entity without an identity gets one from the store; it is written
    /// back into the entity and returned. An entity with an identity replaces
    /// the stored document with that identity.
    pub async fn store<E: Entity>(&self, entity: &mut E) -> Result<Uuid> {
        let model = self.prepare::<E>().await?;
        let collection = model.collection();
        let existing = model.id(entity);

        let mut doc = Document::new();
        if let Some(id) = existing {
            doc.set_id(id);
        }

        for field in model.participating() {
            if let Access::Scalar(access) = &field.access {
                let value = access.read(entity).map_err(|reason| Error::Conversion {
                    collection: collection.to_string(),
                    field: field.name().to_string(),
                    reason,
                })?;
                doc.insert(field.name(), value);
            }
        }

        let mut batches = Vec::new();
        for field in model.participating() {
            if let Access::Relation(access) = &field.access {
                if let Some(batch) = access.write(self, entity, &mut doc).await? {
                    batches.push((access, batch));
                }
            }
        }

        let result = self.backend().upsert(collection, doc).await?;
        check_write(collection, &result)?;
        let id = match existing {
            Some(id) => id,
            None => result
                .generated_key()
                .ok_or_else(|| Error::MissingGeneratedKey {
                    collection: collection.to_string(),
                })?,
        };
        model.set_id(entity, id);

        for (access, batch) in batches {
            let linked = match existing {
                Some(_) => self.linked_rows(&batch.join, id).await?,
                None => HashSet::new(),
            };
            let written = self
                .flush_links(id, &batch, &linked, |position, link| {
                    access.stamp_link(entity, position, link)
                })
                .await?;
            self.prune_links(&batch.join, &linked, &written).await?;
        }

        debug!(collection, %id, inserted = existing.is_none(), "stored entity");
        Ok(id)
    }

    /// Identities of the join rows currently linking `parent_id`.
    async fn linked_rows(&self, join: &str, parent_id: Uuid) -> Result<HashSet<Uuid>> {
        let rows = self
            .backend()
            .query_by_index(join, PARENT_KEY, &Value::String(parent_id.to_string()))
            .await?;
        let mut linked = HashSet::with_capacity(rows.len());
        for row in rows {
            if let Some(row_id) = row.id()? {
                linked.insert(row_id);
            }
        }
        Ok(linked)
    }

    /// Upsert the join rows of one shared sequence. Returns the identities of
    /// the rows written.
    ///
    /// `linked` holds the rows already linking `parent_id`; a carried link
    /// outside it belongs to another parent and is never overwritten.
    async fn flush_links<F>(
        &self,
        parent_id: Uuid,
        batch: &LinkBatch,
        linked: &HashSet<Uuid>,
        mut stamp: F,
    ) -> Result<HashSet<Uuid>>
    where
        F: FnMut(usize, Uuid) + Send,
    {
        let mut written = HashSet::with_capacity(batch.links.len());
        for staged in &batch.links {
            let reuse = staged
                .link
                .filter(|link| linked.contains(link) && !written.contains(link));
            let row = JoinRow::new(parent_id, staged.child_id)
                .with_id(reuse)
                .with_position(staged.position as u64);
            let result = self.backend().upsert(&batch.join, row.to_document()).await?;
            check_write(&batch.join, &result)?;

            let link = match reuse {
                Some(link) => link,
                None => result
                    .generated_key()
                    .ok_or_else(|| Error::MissingGeneratedKey {
                        collection: batch.join.clone(),
                    })?,
            };
            if staged.link != Some(link) {
                if let Some(previous) = staged.link {
                    debug!(collection = %batch.join, %previous, %link, "relinked shared element");
                }
                stamp(staged.position, link);
            }
            written.insert(link);
        }
        Ok(written)
    }

    /// Delete the rows of `linked` not in `keep`.
    async fn prune_links(
        &self,
        join: &str,
        linked: &HashSet<Uuid>,
        keep: &HashSet<Uuid>,
    ) -> Result<()> {
        for row_id in linked.difference(keep) {
            if self.backend().delete(join, *row_id).await? {
                debug!(collection = join, id = %row_id, "pruned stale join row");
            }
        }
        Ok(())
    }
}

fn check_write(collection: &str, result: &WriteResult) -> Result<()> {
    if result.has_errors() {
        return Err(Error::WriteConflict {
            collection: collection.to_string(),
            errors: result.errors,
            message: result.first_error.clone().unwrap_or_default(),
        });
    }
    Ok(())
}
