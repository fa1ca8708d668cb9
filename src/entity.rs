//! An entity is an opaque handle that components are attached to.
//!
//! Entity identifiers are packed into a single `u32`:
//! the low bits hold an index into the storages,
//! the high bits hold a generation counter that is incremented every time the index is recycled.
//! A handle whose generation no longer matches the store is stale,
//! so holding on to an entity after it is released never aliases a newer entity.

use std::fmt;

pub mod raw;
pub use raw::{GENERATION_BITS, GENERATION_MASK, INDEX_BITS, INDEX_MASK, MAX_ENTITIES};

pub mod store;
pub use store::Store;

#[cfg(test)]
mod tests;

/// A generational entity identifier.
///
/// Entities are plain values.
/// They can be copied, hashed and ordered freely;
/// whether an entity is still alive can only be answered by the [`Store`] that issued it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct Entity(u32);

impl Entity {
    /// The null entity.
    ///
    /// It uses the reserved index with generation 0 and is never issued by a [`Store`].
    pub const NULL: Self = Self(raw::pack(INDEX_MASK, 0));

    /// The tombstone entity, with every bit set.
    ///
    /// Used to mark absent links, e.g. in [`Relationship`](crate::registry::Relationship).
    pub const TOMBSTONE: Self = Self(raw::pack(INDEX_MASK, GENERATION_MASK));

    /// Packs an index and a generation into an entity.
    ///
    /// The result never equals [`Entity::NULL`] or [`Entity::TOMBSTONE`].
    ///
    /// # Panics
    /// Panics if `index` is the reserved index [`INDEX_MASK`] or larger,
    /// or if `generation` does not fit in its field.
    pub fn construct(index: u32, generation: u32) -> Self {
        assert!(
            index < INDEX_MASK,
            "entity index {index} is out of range: index {INDEX_MASK} is reserved for the sentinels"
        );
        assert!(
            generation <= GENERATION_MASK,
            "entity generation {generation} exceeds {GENERATION_BITS} bits"
        );
        Self(raw::pack(index, generation))
    }

    /// The index part of the identifier.
    pub const fn index(self) -> u32 { raw::index_of(self.0) }

    /// The generation part of the identifier.
    pub const fn generation(self) -> u32 { raw::generation_of(self.0) }

    /// The packed representation.
    pub const fn to_bits(self) -> u32 { self.0 }

    /// Reinterprets a packed representation as an entity.
    pub const fn from_bits(bits: u32) -> Self { Self(bits) }

    /// Whether this is [`Entity::NULL`].
    pub const fn is_null(self) -> bool { self.0 == Self::NULL.0 }

    /// Whether this is [`Entity::TOMBSTONE`].
    pub const fn is_tombstone(self) -> bool { self.0 == Self::TOMBSTONE.0 }

    pub(crate) fn usize(self) -> usize { self.index() as usize }
}

impl Default for Entity {
    fn default() -> Self { Self::NULL }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("Entity(null)")
        } else if self.is_tombstone() {
            f.write_str("Entity(tombstone)")
        } else {
            write!(f, "Entity({}v{})", self.index(), self.generation())
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Debug::fmt(self, f) }
}
