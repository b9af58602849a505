//! Type-erased field accessors.
//!
//! Each field of a model carries one [`Access`]: the identity lens, a boxed
//! scalar converter, or a boxed relation handler. Relation handlers are
//! generic over the child type and container, erased behind
//! [`RelationAccess`] so one model can walk children of any entity type.
//! Their store, load and trash halves live with the matching engine
//! operation.

use std::marker::PhantomData;

use serde_json::Value;
use uuid::Uuid;

use super::lens::Lens;
use super::scalar::Scalar;
use super::Entity;
use crate::cascade::TrashRelation;
use crate::container::{RefContainer, RefSlot};
use crate::deserialize::ReadRelation;
use crate::serialize::WriteRelation;

pub(crate) enum Access<E> {
    Identity(Lens<E, Option<Uuid>>),
    Scalar(Box<dyn ScalarAccess<E>>),
    Relation(Box<dyn RelationAccess<E>>),
}

/// Reads and writes one scalar field.
pub(crate) trait ScalarAccess<E>: Send + Sync {
    fn read(&self, entity: &E) -> Result<Value, String>;

    fn write(&self, entity: &mut E, value: &Value) -> Result<(), String>;
}

pub(crate) struct ScalarField<E, T> {
    pub(crate) lens: Lens<E, T>,
}

impl<E: 'static, T: Scalar> ScalarAccess<E> for ScalarField<E, T> {
    fn read(&self, entity: &E) -> Result<Value, String> {
        self.lens.get(entity).to_wire()
    }

    fn write(&self, entity: &mut E, value: &Value) -> Result<(), String> {
        *self.lens.get_mut(entity) = T::from_wire(value)?;
        Ok(())
    }
}

/// Stores, loads and trashes the children behind one relation field.
pub(crate) trait RelationAccess<E: Entity>:
    WriteRelation<E> + ReadRelation<E> + TrashRelation<E>
{
}

impl<E: Entity, R> RelationAccess<E> for R where
    R: WriteRelation<E> + ReadRelation<E> + TrashRelation<E>
{
}

/// Owned single reference held in a [`RefSlot`].
pub(crate) struct OneAccess<E, C, S> {
    pub(crate) name: &'static str,
    pub(crate) lens: Lens<E, S>,
    pub(crate) _child: PhantomData<fn() -> C>,
}

impl<E, C: Entity, S: RefSlot<C>> OneAccess<E, C, S> {
    pub(crate) fn slot<'a>(&self, entity: &'a E) -> &'a S {
        self.lens.get(entity)
    }

    pub(crate) fn slot_mut<'a>(&self, entity: &'a mut E) -> &'a mut S {
        self.lens.get_mut(entity)
    }
}

/// Owned or shared reference sequence held in a [`RefContainer`].
pub(crate) struct SequenceAccess<E, T> {
    pub(crate) name: &'static str,
    pub(crate) lens: Lens<E, T>,
    pub(crate) shared: bool,
    /// Join relation of a shared sequence.
    pub(crate) join: String,
}

impl<E, T: RefContainer> SequenceAccess<E, T> {
    pub(crate) fn container<'a>(&self, entity: &'a E) -> &'a T {
        self.lens.get(entity)
    }

    pub(crate) fn container_mut<'a>(&self, entity: &'a mut E) -> &'a mut T {
        self.lens.get_mut(entity)
    }
}
