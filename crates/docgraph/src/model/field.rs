//! Field definitions for entities.

use std::marker::PhantomData;

use uuid::Uuid;

use docgraph_proto::{join_collection, ID_KEY};

use super::access::{Access, OneAccess, ScalarField, SequenceAccess};
use super::lens::Lens;
use super::scalar::{Scalar, ScalarType};
use super::Entity;
use crate::container::{Container, RefContainer, RefSlot};

/// Classification of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// The entity identity, stored under the reserved `id` key.
    Identity,
    /// A value stored under the field name.
    Scalar(ScalarType),
    /// One owned child, stored as `<field>_id`.
    OwnedSingle,
    /// Ordered owned children, stored as `<field>_list`.
    OwnedSequence,
    /// Ordered shared children, stored in a join relation.
    SharedSequence,
}

impl FieldKind {
    /// Check whether the field references other entities.
    pub fn is_relation(&self) -> bool {
        matches!(
            self,
            FieldKind::OwnedSingle | FieldKind::OwnedSequence | FieldKind::SharedSequence
        )
    }
}

/// Classification record of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: &'static str,
    /// Field kind.
    pub kind: FieldKind,
    /// Container of a sequence field.
    pub container: Option<Container>,
    /// Collection of the referenced entity type.
    pub child: Option<&'static str>,
    /// Whether a secondary index is created on the field.
    pub indexed: bool,
    /// Whether the field is left out of documents entirely.
    pub excluded: bool,
    /// Whether cascade delete follows the field.
    pub cascade: bool,
}

impl FieldDescriptor {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            container: None,
            child: None,
            indexed: false,
            excluded: false,
            cascade: kind.is_relation(),
        }
    }

    /// Document key the field is written under. Shared sequences have none.
    pub fn wire_key(&self) -> Option<String> {
        match self.kind {
            FieldKind::Identity => Some(ID_KEY.to_string()),
            FieldKind::Scalar(_) => Some(self.name.to_string()),
            FieldKind::OwnedSingle => Some(docgraph_proto::single_key(self.name)),
            FieldKind::OwnedSequence => Some(docgraph_proto::list_key(self.name)),
            FieldKind::SharedSequence => None,
        }
    }
}

/// A field of entity `E`: its classification and its accessors.
pub struct FieldDef<E> {
    pub(crate) descriptor: FieldDescriptor,
    pub(crate) access: Access<E>,
}

impl<E: Entity> FieldDef<E> {
    /// The identity field.
    pub fn identity(lens: Lens<E, Option<Uuid>>) -> Self {
        Self {
            descriptor: FieldDescriptor::new(ID_KEY, FieldKind::Identity),
            access: Access::Identity(lens),
        }
    }

    /// A scalar field.
    pub fn scalar<T: Scalar>(name: &'static str, lens: Lens<E, T>) -> Self {
        Self {
            descriptor: FieldDescriptor::new(name, FieldKind::Scalar(T::TYPE)),
            access: Access::Scalar(Box::new(ScalarField { lens })),
        }
    }

    /// An owned single reference held in `Option<C>` or `Option<Box<C>>`.
    pub fn owned<C: Entity, S: RefSlot<C>>(name: &'static str, lens: Lens<E, S>) -> Self {
        let mut descriptor = FieldDescriptor::new(name, FieldKind::OwnedSingle);
        descriptor.child = Some(C::COLLECTION);
        Self {
            descriptor,
            access: Access::Relation(Box::new(OneAccess {
                name,
                lens,
                _child: PhantomData,
            })),
        }
    }

    /// An owned reference sequence.
    pub fn owned_many<T: RefContainer>(name: &'static str, lens: Lens<E, T>) -> Self {
        Self::sequence(name, lens, FieldKind::OwnedSequence)
    }

    /// A shared reference sequence, recorded in the `<Parent>_<Child>` join
    /// relation.
    pub fn shared_many<T: RefContainer>(name: &'static str, lens: Lens<E, T>) -> Self {
        Self::sequence(name, lens, FieldKind::SharedSequence)
    }

    fn sequence<T: RefContainer>(name: &'static str, lens: Lens<E, T>, kind: FieldKind) -> Self {
        let child = <T::Child as Entity>::COLLECTION;
        let mut descriptor = FieldDescriptor::new(name, kind);
        descriptor.container = Some(T::CONTAINER);
        descriptor.child = Some(child);
        Self {
            descriptor,
            access: Access::Relation(Box::new(SequenceAccess {
                name,
                lens,
                shared: kind == FieldKind::SharedSequence,
                join: join_collection(E::COLLECTION, child),
            })),
        }
    }

    /// Create a secondary index on the field.
    pub fn with_index(mut self) -> Self {
        self.descriptor.indexed = true;
        self
    }

    /// Leave the child in place when the parent is trashed.
    pub fn no_cascade(mut self) -> Self {
        self.descriptor.cascade = false;
        self
    }

    /// Leave the field out of documents. It keeps its default value on load.
    pub fn excluded(mut self) -> Self {
        self.descriptor.excluded = true;
        self
    }
}

impl<E> FieldDef<E> {
    /// Field name.
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    /// Classification record.
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }
}

impl<E> std::fmt::Debug for FieldDef<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDef")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_keys() {
        let scalar = FieldDescriptor::new("title", FieldKind::Scalar(ScalarType::String));
        let single = FieldDescriptor::new("author", FieldKind::OwnedSingle);
        let sequence = FieldDescriptor::new("chapters", FieldKind::OwnedSequence);
        let shared = FieldDescriptor::new("tags", FieldKind::SharedSequence);

        assert_eq!(scalar.wire_key().as_deref(), Some("title"));
        assert_eq!(single.wire_key().as_deref(), Some("author_id"));
        assert_eq!(sequence.wire_key().as_deref(), Some("chapters_list"));
        assert_eq!(shared.wire_key(), None);
    }

    #[test]
    fn test_relations_cascade_by_default() {
        assert!(FieldDescriptor::new("author", FieldKind::OwnedSingle).cascade);
        assert!(!FieldDescriptor::new("title", FieldKind::Scalar(ScalarType::String)).cascade);
    }
}
