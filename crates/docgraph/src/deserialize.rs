//! Loading entity graphs.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use docgraph_proto::{join::sort_by_position, list_key, single_key, Document, JoinRow, PARENT_KEY};

use crate::container::{Pending, RefContainer, RefSlot};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::model::access::{Access, OneAccess, ScalarAccess, SequenceAccess};
use crate::model::Entity;

/// Load half of a relation field.
#[async_trait]
pub(crate) trait ReadRelation<E: Entity>: Send + Sync {
    /// Rebuild the field of `entity` from the parent document `doc`, stored
    /// under identity `id`.
    async fn read(&self, engine: &Engine, id: Uuid, doc: &Document, entity: &mut E) -> Result<()>;
}

#[async_trait]
impl<E: Entity, C: Entity, S: RefSlot<C>> ReadRelation<E> for OneAccess<E, C, S> {
    async fn read(&self, engine: &Engine, _id: Uuid, doc: &Document, entity: &mut E) -> Result<()> {
        let child = match doc.uuid(&single_key(self.name))? {
            Some(child_id) => Some(engine.load::<C>(child_id).await?),
            None => None,
        };
        self.slot_mut(entity).put(child);
        Ok(())
    }
}

#[async_trait]
impl<E: Entity, T: RefContainer> ReadRelation<E> for SequenceAccess<E, T> {
    async fn read(&self, engine: &Engine, id: Uuid, doc: &Document, entity: &mut E) -> Result<()> {
        let source = <T::Child as Entity>::COLLECTION;

        let refs: Vec<Pending> = if self.shared {
            let docs = engine
                .backend()
                .query_by_index(&self.join, PARENT_KEY, &Value::String(id.to_string()))
                .await?;
            let mut rows = docs
                .iter()
                .map(JoinRow::from_document)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            sort_by_position(&mut rows);
            rows.into_iter()
                .map(|row| Pending::new(row.child_id, source).with_link(row.id))
                .collect()
        } else {
            doc.uuid_list(&list_key(self.name))?
                .into_iter()
                .map(|child_id| Pending::new(child_id, source))
                .collect()
        };

        *self.container_mut(entity) = T::hydrate(engine, refs).await?;
        Ok(())
    }
}

impl Engine {
    /// Load the entity stored under `id`, with everything it owns or shares.
    ///
    /// Eager sequences are loaded in full; lazy sequences come back as
    /// placeholders.
    pub async fn load<E: Entity>(&self, id: Uuid) -> Result<E> {
        self.load_from::<E>(E::COLLECTION, id).await
    }

    /// Load an entity of type `E` stored under `id` in `collection`.
    pub async fn load_from<E: Entity>(&self, collection: &str, id: Uuid) -> Result<E> {
        let model = self.prepare::<E>().await?;
        let doc = self
            .backend()
            .get(collection, id)
            .await?
            .ok_or_else(|| Error::NotFound {
                collection: collection.to_string(),
                id,
            })?;

        let mut entity = E::default();
        model.set_id(&mut entity, id);

        let null = Value::Null;
        for field in model.participating() {
            match &field.access {
                Access::Identity(_) => {}
                Access::Scalar(access) => {
                    let value = doc.get(field.name()).unwrap_or(&null);
                    access
                        .write(&mut entity, value)
                        .map_err(|reason| Error::Conversion {
                            collection: collection.to_string(),
                            field: field.name().to_string(),
                            reason,
                        })?;
                }
                Access::Relation(access) => access.read(self, id, &doc, &mut entity).await?,
            }
        }

        debug!(collection, %id, "loaded entity");
        Ok(entity)
    }
}
