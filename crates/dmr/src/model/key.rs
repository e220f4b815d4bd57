//! Child addressing: a child is found either by name or by position.

use std::fmt;

/// Address of a child node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildKey<'a> {
    /// Object entry or property name.
    Name(&'a str),
    /// List position (or `0` for a property's single child).
    Index(usize),
}

impl ChildKey<'_> {
    /// Type a node auto-vivifies to when it is undefined and accessed with this key.
    pub(crate) fn container(self) -> crate::model::ModelType {
        match self {
            ChildKey::Name(_) => crate::model::ModelType::Object,
            ChildKey::Index(_) => crate::model::ModelType::List,
        }
    }
}

impl fmt::Display for ChildKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildKey::Name(name) => write!(f, "{name:?}"),
            ChildKey::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Types that can address a child of a [`ModelNode`](crate::ModelNode).
///
/// Implemented for `usize` (list positions) and `str`/`String` (names), plus
/// references to those. This trait is sealed.
pub trait Key: private::Sealed {
    /// Returns the child address.
    fn child_key(&self) -> ChildKey<'_>;
}

impl Key for usize {
    fn child_key(&self) -> ChildKey<'_> {
        ChildKey::Index(*self)
    }
}

impl Key for str {
    fn child_key(&self) -> ChildKey<'_> {
        ChildKey::Name(self)
    }
}

impl Key for String {
    fn child_key(&self) -> ChildKey<'_> {
        ChildKey::Name(self.as_str())
    }
}

impl Key for ChildKey<'_> {
    fn child_key(&self) -> ChildKey<'_> {
        *self
    }
}

impl<T> Key for &T
where
    T: ?Sized + Key,
{
    fn child_key(&self) -> ChildKey<'_> {
        (**self).child_key()
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for usize {}
    impl Sealed for str {}
    impl Sealed for String {}
    impl Sealed for super::ChildKey<'_> {}
    impl<T> Sealed for &T where T: ?Sized + Sealed {}
}
