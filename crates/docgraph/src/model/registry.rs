//! Per-engine model cache.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;

use super::{Entity, Model};
use crate::error::Result;

/// Models built so far, keyed by entity type.
#[derive(Default)]
pub(crate) struct Registry {
    models: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Model of `E`, built and validated on first request.
    pub(crate) fn model<E: Entity>(&self) -> Result<Arc<Model<E>>> {
        let key = TypeId::of::<E>();
        if let Some(cached) = self.models.get(&key) {
            if let Ok(model) = Arc::clone(cached.value()).downcast::<Model<E>>() {
                return Ok(model);
            }
        }

        let model = Arc::new(Model::<E>::build()?);
        self.models.insert(key, model.clone());
        Ok(model)
    }
}
