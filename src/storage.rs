//! Sparse storages keyed by entity.
//!
//! A [`SparseSet`] maps entity indices to positions in a packed array of entities.
//! The index side is split into lazily allocated pages of [`PAGE_SIZE`] slots,
//! so a handful of entities with large indices does not cost a full-size index.
//! A [`SparseMap`] adds a value array that moves in lockstep with the packed entities.
//!
//! Removal swaps the last element into the hole,
//! so iteration order is insertion order until the first removal.

mod sparse;
pub use sparse::SparseSet;

mod map;
pub use map::SparseMap;


/// The number of index slots in a page.
pub const PAGE_SIZE: usize = 1024;

static_assertions::const_assert!(PAGE_SIZE.is_power_of_two());
static_assertions::const_assert_eq!((crate::entity::MAX_ENTITIES + 1) % PAGE_SIZE, 0);
