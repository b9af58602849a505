//! Elements of shared reference sequences.

use std::ops::{Deref, DerefMut};

use uuid::Uuid;

/// A child entity held in a shared sequence.
///
/// Carries the identity of the join row linking the child to its parent.
/// The identity is captured on load and on store, and reused on the next
/// store so the same row is replaced instead of duplicated. Equality only
/// compares the wrapped values.
#[derive(Debug, Clone, Default)]
pub struct Shared<C> {
    pub(crate) value: C,
    pub(crate) link: Option<Uuid>,
}

impl<C> Shared<C> {
    /// Wrap a child that is not linked yet.
    pub fn new(value: C) -> Self {
        Self { value, link: None }
    }

    /// Identity of the join row, once stored or loaded.
    pub fn link_id(&self) -> Option<Uuid> {
        self.link
    }

    /// Unwrap the child, dropping the link.
    pub fn into_inner(self) -> C {
        self.value
    }
}

impl<C> From<C> for Shared<C> {
    fn from(value: C) -> Self {
        Self::new(value)
    }
}

impl<C> Deref for Shared<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.value
    }
}

impl<C> DerefMut for Shared<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.value
    }
}

impl<C: PartialEq> PartialEq for Shared<C> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
