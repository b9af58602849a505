//! Schema provisioning.
//!
//! Before the first use of an entity type the engine makes sure its backing
//! collection, its secondary indexes and the join relations of its shared
//! sequences exist. Every step checks before it creates, and a store answering
//! "already exists" (another handle won the race) counts as success. Once a
//! type is provisioned the handle skips it; a frozen handle skips everything.

use std::any::TypeId;
use std::sync::Arc;

use tracing::{debug, info, warn};

use docgraph_proto::{CHILD_KEY, PARENT_KEY};

use crate::engine::Engine;
use crate::error::Result;
use crate::model::{Entity, Model};

impl Engine {
    /// Make sure the collection, indexes and join relations of `E` exist.
    ///
    /// Always checks the store, even when `E` was provisioned before. Does
    /// nothing on a frozen handle.
    pub async fn ensure_schema<E: Entity>(&self) -> Result<()> {
        let model = self.model::<E>()?;
        if self.is_frozen() {
            debug!(collection = model.collection(), "provisioning frozen, skipped");
            return Ok(());
        }
        self.provision(&model).await?;
        self.prepared.insert(TypeId::of::<E>());
        Ok(())
    }

    /// Model of `E`, provisioning its schema on first use.
    pub(crate) async fn prepare<E: Entity>(&self) -> Result<Arc<Model<E>>> {
        let model = self.model::<E>()?;
        if !self.is_frozen() && !self.prepared.contains(&TypeId::of::<E>()) {
            self.provision(&model).await?;
            self.prepared.insert(TypeId::of::<E>());
        }
        Ok(model)
    }

    async fn provision<E: Entity>(&self, model: &Model<E>) -> Result<()> {
        let existing = self.backend().list_collections().await?;

        self.ensure_collection(&existing, model.collection(), &model.indexed_fields())
            .await?;
        for (join, _) in model.join_relations() {
            self.ensure_collection(&existing, &join, &[PARENT_KEY, CHILD_KEY])
                .await?;
        }
        Ok(())
    }

    async fn ensure_collection(
        &self,
        existing: &[String],
        collection: &str,
        indexes: &[&str],
    ) -> Result<()> {
        let backend = self.backend();

        if !existing.iter().any(|name| name == collection) {
            match backend.create_collection(collection).await {
                Ok(()) => info!(collection, "created collection"),
                Err(e) if e.is_already_exists() => {
                    warn!(collection, "collection created concurrently")
                }
                Err(e) => return Err(e.into()),
            }
        }

        if indexes.is_empty() {
            return Ok(());
        }

        let present = backend.list_indexes(collection).await?;
        for field in indexes {
            if !present.iter().any(|name| name == field) {
                match backend.create_index(collection, field).await {
                    Ok(()) => info!(collection, field, "created index"),
                    Err(e) if e.is_already_exists() => {
                        warn!(collection, field, "index created concurrently")
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            backend.wait_for_index(collection, field).await?;
        }
        Ok(())
    }
}
