//! Field accessor/mutator pairs.

/// Accessor and mutator of one field of `E`.
pub struct Lens<E, T> {
    get: fn(&E) -> &T,
    get_mut: fn(&mut E) -> &mut T,
}

impl<E, T> Lens<E, T> {
    /// Pair an accessor with a mutator. Usually built with [`lens!`](crate::lens).
    pub fn new(get: fn(&E) -> &T, get_mut: fn(&mut E) -> &mut T) -> Self {
        Self { get, get_mut }
    }

    /// Borrow the field.
    pub fn get<'a>(&self, entity: &'a E) -> &'a T {
        (self.get)(entity)
    }

    /// Mutably borrow the field.
    pub fn get_mut<'a>(&self, entity: &'a mut E) -> &'a mut T {
        (self.get_mut)(entity)
    }
}

impl<E, T> Clone for Lens<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Lens<E, T> {}

impl<E, T> std::fmt::Debug for Lens<E, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Lens")
    }
}

/// Build a [`Lens`] for a field of `Self`.
///
/// Meant for use inside [`Entity::describe`](crate::Entity::describe):
///
/// ```ignore
/// FieldDef::scalar("title", lens!(title))
/// ```
#[macro_export]
macro_rules! lens {
    ($field:ident) => {
        $crate::Lens::new(|e: &Self| &e.$field, |e: &mut Self| &mut e.$field)
    };
}
