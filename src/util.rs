//! Miscellaneous helpers shared by the storages.

use std::any::{self, TypeId};
use std::borrow::Borrow;
use std::{fmt, hash};

/// A [`TypeId`] that remembers the name of its type for diagnostics.
///
/// Equality and hashing only consider the [`TypeId`],
/// so maps keyed by `DbgTypeId` can be queried with a plain `&TypeId`.
#[derive(Clone, Copy)]
pub struct DbgTypeId {
    /// The underlying type ID.
    pub id:   TypeId,
    /// The name of the type, as returned by [`any::type_name`].
    pub name: &'static str,
}

impl DbgTypeId {
    /// Creates a `DbgTypeId` for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self { id: TypeId::of::<T>(), name: any::type_name::<T>() }
    }
}

impl fmt::Debug for DbgTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name) }
}

impl PartialEq for DbgTypeId {
    fn eq(&self, other: &Self) -> bool { self.id == other.id }
}

impl Eq for DbgTypeId {}

impl hash::Hash for DbgTypeId {
    fn hash<H: hash::Hasher>(&self, state: &mut H) { self.id.hash(state) }
}

impl Borrow<TypeId> for DbgTypeId {
    fn borrow(&self) -> &TypeId { &self.id }
}
