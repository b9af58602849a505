//! Containers holding referenced entities.
//!
//! An owned single reference lives in a [`RefSlot`] (`Option<C>` or
//! `Option<Box<C>>`). Reference sequences live in a [`RefContainer`]:
//!
//! | container | loading | join-row identity |
//! |---|---|---|
//! | `Vec<C>` | eager | not kept |
//! | `Vec<Shared<C>>` | eager | kept on each element |
//! | `LazyRefs<C>` | lazy | kept on each slot |
//!
//! Any container may back an owned or a shared sequence. A shared sequence held
//! in a plain `Vec<C>` forgets its join-row identities, so every store rewrites
//! its join rows.

use async_trait::async_trait;
use uuid::Uuid;

use crate::engine::Engine;
use crate::error::Result;
use crate::lazy::LazyRefs;
use crate::model::Entity;
use crate::shared::Shared;

/// Loading behavior of a sequence container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Every element is loaded with the parent.
    Eager,
    /// Elements are loaded on first access.
    Lazy,
}

/// Identity and origin of an element that has not been loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    /// Identity of the referenced entity.
    pub id: Uuid,
    /// Collection the entity is loaded from.
    pub source: String,
    /// Identity of the join row linking it, for shared sequences.
    pub link: Option<Uuid>,
}

impl Pending {
    /// Create a placeholder for `id` in `source`.
    pub fn new(id: Uuid, source: impl Into<String>) -> Self {
        Self {
            id,
            source: source.into(),
            link: None,
        }
    }

    /// Attach the join-row identity.
    pub fn with_link(mut self, link: Option<Uuid>) -> Self {
        self.link = link;
        self
    }
}

/// Borrowed element of a sequence container.
#[derive(Debug)]
pub enum Element<'a, C> {
    /// A loaded entity and its join-row identity.
    Loaded { value: &'a C, link: Option<Uuid> },
    /// A reference that has not been loaded.
    Pending(&'a Pending),
}

/// Mutably borrowed element of a sequence container.
#[derive(Debug)]
pub enum ElementMut<'a, C> {
    /// A loaded entity and its join-row identity.
    Loaded { value: &'a mut C, link: Option<Uuid> },
    /// A reference that has not been loaded.
    Pending(&'a Pending),
}

/// Holder of an owned single reference.
///
/// The child type is a trait parameter so that `Option<C>` and
/// `Option<Box<C>>` can both hold a `C`.
pub trait RefSlot<C: Entity>: Default + Send + Sync + 'static {
    /// Borrow the child.
    fn child(&self) -> Option<&C>;

    /// Mutably borrow the child.
    fn child_mut(&mut self) -> Option<&mut C>;

    /// Replace the child.
    fn put(&mut self, child: Option<C>);
}

impl<C: Entity> RefSlot<C> for Option<C> {
    fn child(&self) -> Option<&C> {
        self.as_ref()
    }

    fn child_mut(&mut self) -> Option<&mut C> {
        self.as_mut()
    }

    fn put(&mut self, child: Option<C>) {
        *self = child;
    }
}

impl<C: Entity> RefSlot<C> for Option<Box<C>> {
    fn child(&self) -> Option<&C> {
        self.as_deref()
    }

    fn child_mut(&mut self) -> Option<&mut C> {
        self.as_deref_mut()
    }

    fn put(&mut self, child: Option<C>) {
        *self = child.map(Box::new);
    }
}

/// Ordered holder of a reference sequence.
#[async_trait]
pub trait RefContainer: Default + Send + Sync + 'static {
    /// Entity type of the elements.
    type Child: Entity;

    /// Loading behavior.
    const CONTAINER: Container;

    /// Number of elements.
    fn len(&self) -> usize;

    /// Check whether the container is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow element `index`.
    fn element(&self, index: usize) -> Option<Element<'_, Self::Child>>;

    /// Mutably borrow element `index`.
    fn element_mut(&mut self, index: usize) -> Option<ElementMut<'_, Self::Child>>;

    /// Record the join-row identity of element `index`.
    fn set_link(&mut self, index: usize, link: Uuid);

    /// Build the container from stored references, in order.
    async fn hydrate(engine: &Engine, refs: Vec<Pending>) -> Result<Self>;
}

#[async_trait]
impl<C: Entity> RefContainer for Vec<C> {
    type Child = C;

    const CONTAINER: Container = Container::Eager;

    fn len(&self) -> usize {
        <[C]>::len(self)
    }

    fn element(&self, index: usize) -> Option<Element<'_, C>> {
        self.get(index)
            .map(|value| Element::Loaded { value, link: None })
    }

    fn element_mut(&mut self, index: usize) -> Option<ElementMut<'_, C>> {
        self.get_mut(index)
            .map(|value| ElementMut::Loaded { value, link: None })
    }

    fn set_link(&mut self, _index: usize, _link: Uuid) {}

    async fn hydrate(engine: &Engine, refs: Vec<Pending>) -> Result<Self> {
        let mut items = Vec::with_capacity(refs.len());
        for pending in refs {
            items.push(engine.load_from::<C>(&pending.source, pending.id).await?);
        }
        Ok(items)
    }
}

#[async_trait]
impl<C: Entity> RefContainer for Vec<Shared<C>> {
    type Child = C;

    const CONTAINER: Container = Container::Eager;

    fn len(&self) -> usize {
        <[Shared<C>]>::len(self)
    }

    fn element(&self, index: usize) -> Option<Element<'_, C>> {
        self.get(index).map(|shared| Element::Loaded {
            value: &shared.value,
            link: shared.link,
        })
    }

    fn element_mut(&mut self, index: usize) -> Option<ElementMut<'_, C>> {
        self.get_mut(index).map(|shared| ElementMut::Loaded {
            value: &mut shared.value,
            link: shared.link,
        })
    }

    fn set_link(&mut self, index: usize, link: Uuid) {
        if let Some(shared) = self.get_mut(index) {
            shared.link = Some(link);
        }
    }

    async fn hydrate(engine: &Engine, refs: Vec<Pending>) -> Result<Self> {
        let mut items = Vec::with_capacity(refs.len());
        for pending in refs {
            let value = engine.load_from::<C>(&pending.source, pending.id).await?;
            items.push(Shared {
                value,
                link: pending.link,
            });
        }
        Ok(items)
    }
}

#[async_trait]
impl<C: Entity> RefContainer for LazyRefs<C> {
    type Child = C;

    const CONTAINER: Container = Container::Lazy;

    fn len(&self) -> usize {
        LazyRefs::len(self)
    }

    fn element(&self, index: usize) -> Option<Element<'_, C>> {
        self.slot(index).map(|slot| slot.as_element())
    }

    fn element_mut(&mut self, index: usize) -> Option<ElementMut<'_, C>> {
        self.slot_mut(index).map(|slot| slot.as_element_mut())
    }

    fn set_link(&mut self, index: usize, link: Uuid) {
        if let Some(slot) = self.slot_mut(index) {
            slot.set_link(link);
        }
    }

    async fn hydrate(_engine: &Engine, refs: Vec<Pending>) -> Result<Self> {
        Ok(LazyRefs::from_pending(refs))
    }
}
