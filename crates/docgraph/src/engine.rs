//! The engine handle.

use std::any::TypeId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashSet;
use tracing::info;

use docgraph_store::{DocumentStore, SledStore};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::registry::Registry;
use crate::model::{Entity, FieldDescriptor, Model};

/// Handle through which entities are stored, loaded and trashed.
///
/// Owns the document store, the model cache and the provisioning state. Every
/// operation takes the handle explicitly; share it with an `Arc` across tasks.
pub struct Engine {
    backend: Arc<dyn DocumentStore>,
    config: EngineConfig,
    registry: Registry,
    /// Entity types whose schema has been provisioned by this handle.
    pub(crate) prepared: DashSet<TypeId>,
    frozen: AtomicBool,
}

impl Engine {
    /// Create an engine over any document store.
    pub fn new(backend: Arc<dyn DocumentStore>, config: EngineConfig) -> Self {
        let frozen = AtomicBool::new(config.frozen);
        Self {
            backend,
            config,
            registry: Registry::new(),
            prepared: DashSet::new(),
            frozen,
        }
    }

    /// Open the embedded sled store described by `config`.
    pub fn open(config: EngineConfig) -> Result<Self> {
        let store = SledStore::open(config.storage())?;
        info!(
            database = %config.database,
            path = ?config.data_path,
            frozen = config.frozen,
            "opened engine"
        );
        Ok(Self::new(Arc::new(store), config))
    }

    /// The document store.
    pub fn backend(&self) -> &Arc<dyn DocumentStore> {
        &self.backend
    }

    /// Configuration the engine was created with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Permanently disable schema provisioning for this handle.
    pub fn freeze(&self) {
        if !self.frozen.swap(true, Ordering::SeqCst) {
            info!(database = %self.config.database, "schema provisioning frozen");
        }
    }

    /// Check whether schema provisioning is disabled.
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }

    /// Model of `E`, built on first use.
    pub fn model<E: Entity>(&self) -> Result<Arc<Model<E>>> {
        self.registry.model::<E>()
    }

    /// Field classification of `E`.
    pub fn classify<E: Entity>(&self) -> Result<Vec<FieldDescriptor>> {
        Ok(self.model::<E>()?.classify())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("frozen", &self.is_frozen())
            .field("prepared", &self.prepared.len())
            .finish()
    }
}
