//! Entity/component storage with generational identifiers.
//!
//! # Entities
//! An [`Entity`] is a `u32` packing an index and a generation.
//! Indices are issued and recycled by an [`entity::Store`];
//! each time an index is recycled its generation is incremented,
//! so handles kept across a release are detected as stale instead of
//! silently aliasing the entity that reuses the index.
//!
//! # Sparse storages
//! [`SparseSet`] and [`SparseMap`] map entities to densely packed arrays
//! through a paged index, giving O(1) insertion, lookup and removal
//! while keeping members contiguous for iteration.
//! Removal swaps the last member into the hole,
//! so positions in the packed arrays are only stable until the next removal.
//!
//! # Archetypes
//! An [`Archetype`] stores rows of plain-old-data components in parallel type-erased columns.
//! Rows are addressed by [`archetype::Key`]s which survive the compaction caused by erasing other rows.
//!
//! # Registry
//! [`Registry`] is the entry point for most users.
//! It owns an entity store and lazily creates one [`SparseMap`] per component type.
//!
//! ```
//! use sparsec::Registry;
//!
//! let mut registry = Registry::new();
//! let player = registry.acquire_entity();
//! registry.assign(player, 100_u32)?;
//! registry.assign(player, "player")?;
//!
//! *registry.get_mut::<u32>(player)? -= 10;
//! assert_eq!(registry.get::<u32>(player), Ok(&90));
//! assert!(registry.has::<&str>(player));
//! # Ok::<(), sparsec::Error>(())
//! ```
//!
//! # Threading
//! All types are `Send` and `Sync`, but mutation requires `&mut` access;
//! sharing a registry across threads needs external synchronization.

#![cfg_attr(doc, warn(missing_docs))]

pub mod archetype;
pub use archetype::Archetype;

pub mod entity;
pub use entity::Entity;

mod error;
pub use error::Error;

pub mod registry;
pub use registry::Registry;

pub mod storage;
pub use storage::{SparseMap, SparseSet};

mod util;

#[cfg(test)]
mod test_util;
