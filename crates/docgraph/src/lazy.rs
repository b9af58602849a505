//! Lazily loaded reference sequences.
//!
//! A [`LazyRefs`] is an ordered sequence of slots. A slot is either a
//! placeholder holding the identity and source collection of an entity that has
//! not been loaded, or a loaded entity. Loading happens one slot at a time, on
//! access, and the loaded entity replaces the placeholder in place: accessing
//! the same index again does not touch the store.
//!
//! Accessors that may load take `&mut self` and the [`Engine`]. A sequence is
//! not meant to be shared between tasks while it is being resolved.

use uuid::Uuid;

use crate::container::{Element, ElementMut, Pending};
use crate::engine::Engine;
use crate::error::Result;
use crate::model::Entity;

/// One position of a [`LazyRefs`].
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<C> {
    /// Not loaded yet.
    Unresolved(Pending),
    /// Loaded, with the join-row identity for shared sequences.
    Resolved { value: C, link: Option<Uuid> },
}

impl<C> Slot<C> {
    /// Check whether the slot holds a loaded entity.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Slot::Resolved { .. })
    }

    /// Join-row identity of the slot.
    pub fn link(&self) -> Option<Uuid> {
        match self {
            Slot::Unresolved(pending) => pending.link,
            Slot::Resolved { link, .. } => *link,
        }
    }

    pub(crate) fn set_link(&mut self, id: Uuid) {
        match self {
            Slot::Unresolved(pending) => pending.link = Some(id),
            Slot::Resolved { link, .. } => *link = Some(id),
        }
    }

    pub(crate) fn as_element(&self) -> Element<'_, C> {
        match self {
            Slot::Unresolved(pending) => Element::Pending(pending),
            Slot::Resolved { value, link } => Element::Loaded {
                value,
                link: *link,
            },
        }
    }

    pub(crate) fn as_element_mut(&mut self) -> ElementMut<'_, C> {
        match self {
            Slot::Unresolved(pending) => ElementMut::Pending(pending),
            Slot::Resolved { value, link } => ElementMut::Loaded {
                value,
                link: *link,
            },
        }
    }
}

/// An ordered reference sequence loaded element by element.
#[derive(Debug, Clone, PartialEq)]
pub struct LazyRefs<C> {
    slots: Vec<Slot<C>>,
}

impl<C> Default for LazyRefs<C> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<C> LazyRefs<C> {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sequence of placeholders.
    pub fn from_pending(refs: impl IntoIterator<Item = Pending>) -> Self {
        Self {
            slots: refs.into_iter().map(Slot::Unresolved).collect(),
        }
    }

    /// Number of elements, loaded or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append a loaded entity.
    pub fn push(&mut self, value: C) {
        self.slots.push(Slot::Resolved { value, link: None });
    }

    /// Insert a loaded entity at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: C) {
        self.slots.insert(index, Slot::Resolved { value, link: None });
    }

    /// Replace the element at `index`, returning the previous slot.
    ///
    /// The new element is not linked: a shared sequence writes a new join row
    /// for it and drops the old one on the next store.
    pub fn set(&mut self, index: usize, value: C) -> Option<Slot<C>> {
        let slot = self.slots.get_mut(index)?;
        Some(std::mem::replace(
            slot,
            Slot::Resolved { value, link: None },
        ))
    }

    /// Remove the element at `index` without loading it.
    pub fn remove_at(&mut self, index: usize) -> Option<Slot<C>> {
        (index < self.slots.len()).then(|| self.slots.remove(index))
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Check whether the element at `index` is loaded.
    pub fn is_resolved(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(Slot::is_resolved)
    }

    /// Identities of the elements not loaded yet, in order.
    pub fn pending_ids(&self) -> Vec<Uuid> {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Unresolved(pending) => Some(pending.id),
                Slot::Resolved { .. } => None,
            })
            .collect()
    }

    /// Iterate over the loaded elements, in order, without loading anything.
    pub fn iter_resolved(&self) -> impl Iterator<Item = &C> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Resolved { value, .. } => Some(value),
            Slot::Unresolved(_) => None,
        })
    }

    /// Borrow the slot at `index`.
    pub fn slot(&self, index: usize) -> Option<&Slot<C>> {
        self.slots.get(index)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Slot<C>> {
        self.slots.get_mut(index)
    }
}

impl<C: Entity> LazyRefs<C> {
    /// Borrow the element at `index`, loading it first if needed.
    ///
    /// Returns `None` when `index` is out of bounds.
    pub async fn get(&mut self, engine: &Engine, index: usize) -> Result<Option<&C>> {
        self.resolve(engine, index).await?;
        Ok(match self.slots.get(index) {
            Some(Slot::Resolved { value, .. }) => Some(value),
            _ => None,
        })
    }

    /// Mutably borrow the element at `index`, loading it first if needed.
    pub async fn get_mut(&mut self, engine: &Engine, index: usize) -> Result<Option<&mut C>> {
        self.resolve(engine, index).await?;
        Ok(match self.slots.get_mut(index) {
            Some(Slot::Resolved { value, .. }) => Some(value),
            _ => None,
        })
    }

    /// Load every element not loaded yet.
    pub async fn resolve_all(&mut self, engine: &Engine) -> Result<()> {
        for index in 0..self.slots.len() {
            self.resolve(engine, index).await?;
        }
        Ok(())
    }

    /// Consume into the loaded entities, loading the rest.
    pub async fn into_vec(mut self, engine: &Engine) -> Result<Vec<C>> {
        self.resolve_all(engine).await?;
        Ok(self
            .slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Resolved { value, .. } => Some(value),
                Slot::Unresolved(_) => None,
            })
            .collect())
    }

    /// Load the slot at `index` if it is a placeholder.
    async fn resolve(&mut self, engine: &Engine, index: usize) -> Result<()> {
        let pending = match self.slots.get(index) {
            Some(Slot::Unresolved(pending)) => pending.clone(),
            _ => return Ok(()),
        };

        let value = engine.load_from::<C>(&pending.source, pending.id).await?;
        self.slots[index] = Slot::Resolved {
            value,
            link: pending.link,
        };
        Ok(())
    }
}

impl<C: Entity + PartialEq> LazyRefs<C> {
    /// Index of the first element equal to `value`.
    ///
    /// Elements are loaded in order until a match is found.
    pub async fn position(&mut self, engine: &Engine, value: &C) -> Result<Option<usize>> {
        for index in 0..self.slots.len() {
            self.resolve(engine, index).await?;
            if let Slot::Resolved { value: item, .. } = &self.slots[index] {
                if item == value {
                    return Ok(Some(index));
                }
            }
        }
        Ok(None)
    }

    /// Check whether an element equals `value`.
    pub async fn contains(&mut self, engine: &Engine, value: &C) -> Result<bool> {
        Ok(self.position(engine, value).await?.is_some())
    }

    /// Remove the first element equal to `value`.
    ///
    /// Every element before the match ends up loaded.
    pub async fn remove(&mut self, engine: &Engine, value: &C) -> Result<bool> {
        match self.position(engine, value).await? {
            Some(index) => {
                self.slots.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<C> From<Vec<C>> for LazyRefs<C> {
    fn from(values: Vec<C>) -> Self {
        values.into_iter().collect()
    }
}

impl<C> FromIterator<C> for LazyRefs<C> {
    fn from_iter<T: IntoIterator<Item = C>>(iter: T) -> Self {
        Self {
            slots: iter
                .into_iter()
                .map(|value| Slot::Resolved { value, link: None })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_unresolved() {
        let ids = [Uuid::new_v4(), Uuid::new_v4()];
        let mut refs: LazyRefs<String> =
            LazyRefs::from_pending(ids.iter().map(|id| Pending::new(*id, "Tag")));

        assert_eq!(refs.len(), 2);
        assert!(!refs.is_resolved(0));
        assert_eq!(refs.pending_ids(), ids.to_vec());

        refs.push("local".to_string());
        assert!(refs.is_resolved(2));
        assert_eq!(refs.iter_resolved().collect::<Vec<_>>(), vec!["local"]);
    }

    #[test]
    fn test_set_and_remove_at() {
        let link = Uuid::new_v4();
        let mut refs: LazyRefs<String> = LazyRefs::from_pending([
            Pending::new(Uuid::new_v4(), "Tag").with_link(Some(link)),
        ]);

        let previous = refs.set(0, "replacement".to_string()).unwrap();
        assert_eq!(previous.link(), Some(link));
        assert_eq!(refs.slot(0).unwrap().link(), None);
        assert!(refs.set(5, "x".to_string()).is_none());

        assert!(refs.remove_at(3).is_none());
        assert!(refs.remove_at(0).unwrap().is_resolved());
        assert!(refs.is_empty());
    }

    #[test]
    fn test_set_link_on_placeholder() {
        let mut slot: Slot<String> = Slot::Unresolved(Pending::new(Uuid::new_v4(), "Tag"));
        let link = Uuid::new_v4();
        slot.set_link(link);
        assert_eq!(slot.link(), Some(link));
    }

    #[test]
    fn test_from_vec() {
        let refs = LazyRefs::from(vec![1, 2, 3]);
        assert_eq!(refs.len(), 3);
        assert!(refs.pending_ids().is_empty());
        assert_eq!(refs.iter_resolved().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
