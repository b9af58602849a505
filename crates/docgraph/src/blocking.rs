//! Blocking facade over [`Engine`].
//!
//! For hosts without an async runtime. Each call blocks the current thread on
//! a runtime owned by the facade, so it must not be used from inside another
//! tokio runtime.

use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use uuid::Uuid;

use docgraph_store::DocumentStore;

use crate::cascade::TrashReport;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::Result;
use crate::lazy::LazyRefs;
use crate::model::Entity;

/// An [`Engine`] driven by its own runtime.
pub struct BlockingEngine {
    engine: Engine,
    runtime: Runtime,
}

impl BlockingEngine {
    /// Wrap an engine.
    pub fn new(engine: Engine) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("docgraph-blocking")
            .enable_all()
            .build()?;
        Ok(Self { engine, runtime })
    }

    /// Open the embedded sled store described by `config`.
    pub fn open(config: EngineConfig) -> Result<Self> {
        Self::new(Engine::open(config)?)
    }

    /// Create a blocking engine over any document store.
    pub fn with_store(store: Arc<dyn DocumentStore>, config: EngineConfig) -> Result<Self> {
        Self::new(Engine::new(store, config))
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// See [`Engine::store`].
    pub fn store<E: Entity>(&self, entity: &mut E) -> Result<Uuid> {
        self.runtime.block_on(self.engine.store(entity))
    }

    /// See [`Engine::load`].
    pub fn load<E: Entity>(&self, id: Uuid) -> Result<E> {
        self.runtime.block_on(self.engine.load(id))
    }

    /// See [`Engine::trash`].
    pub fn trash<E: Entity>(&self, entity: &E) -> Result<TrashReport> {
        self.runtime.block_on(self.engine.trash(entity))
    }

    /// See [`Engine::trash_by_id`].
    pub fn trash_by_id<E: Entity>(&self, id: Uuid) -> Result<TrashReport> {
        self.runtime.block_on(self.engine.trash_by_id::<E>(id))
    }

    /// See [`Engine::ensure_schema`].
    pub fn ensure_schema<E: Entity>(&self) -> Result<()> {
        self.runtime.block_on(self.engine.ensure_schema::<E>())
    }

    /// See [`Engine::freeze`].
    pub fn freeze(&self) {
        self.engine.freeze();
    }

    /// Borrow element `index` of a lazy sequence, loading it if needed.
    pub fn resolve<'a, C: Entity>(
        &self,
        refs: &'a mut LazyRefs<C>,
        index: usize,
    ) -> Result<Option<&'a C>> {
        self.runtime.block_on(refs.get(&self.engine, index))
    }

    /// Load every element of a lazy sequence.
    pub fn resolve_all<C: Entity>(&self, refs: &mut LazyRefs<C>) -> Result<()> {
        self.runtime.block_on(refs.resolve_all(&self.engine))
    }
}

impl std::fmt::Debug for BlockingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingEngine")
            .field("engine", &self.engine)
            .finish()
    }
}
