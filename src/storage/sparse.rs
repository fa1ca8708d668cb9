use std::slice;

use xias::Xias;

use super::PAGE_SIZE;
use crate::Entity;

/// Marks an index slot that does not point into the packed array.
const ABSENT: u32 = u32::MAX;

type Page = Box<[u32; PAGE_SIZE]>;

/// A set of entities with O(1) insertion, lookup and removal.
///
/// Membership compares the full identifier,
/// so a stale handle sharing an index with a member is not contained.
#[derive(Debug, Default, Clone)]
pub struct SparseSet {
    /// Maps entity indices to positions in `dense`, allocated one page at a time.
    pages: Vec<Option<Page>>,
    /// The members, packed.
    dense: Vec<Entity>,
}

/// The outcome of [`SparseSet::assure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Assured {
    /// The entity was appended at this position.
    Appended(usize),
    /// The entity was already present at this position.
    Present(usize),
    /// An older generation of the entity at this position was overwritten.
    Replaced(usize),
}

impl SparseSet {
    /// Creates an empty set.
    pub fn new() -> Self { Self::default() }

    /// Creates an empty set with room for `capacity` members in the packed array.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { pages: Vec::new(), dense: Vec::with_capacity(capacity) }
    }

    /// The number of members.
    pub fn len(&self) -> usize { self.dense.len() }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool { self.dense.is_empty() }

    /// The capacity of the packed array.
    pub fn capacity(&self) -> usize { self.dense.capacity() }

    /// Reserves room for at least `additional` more members in the packed array.
    pub fn reserve(&mut self, additional: usize) { self.dense.reserve(additional) }

    /// Whether `entity` is a member.
    pub fn contains(&self, entity: Entity) -> bool { self.find(entity).is_some() }

    /// The position of `entity` in the packed array, if it is a member.
    pub fn find(&self, entity: Entity) -> Option<usize> {
        let (page, offset) = split(entity);
        let position = self.pages.get(page)?.as_ref()?[offset];
        if position == ABSENT {
            return None;
        }

        let position = position.small_int();
        (self.dense.get(position) == Some(&entity)).then_some(position)
    }

    /// The member at `position` in the packed array.
    pub fn at(&self, position: usize) -> Option<Entity> { self.dense.get(position).copied() }

    /// Inserts `entity`.
    ///
    /// If an older generation of the same index is a member, it is replaced in place.
    /// Returns `false` if `entity` itself was already a member.
    ///
    /// # Panics
    /// Panics if `entity` is a sentinel.
    pub fn insert(&mut self, entity: Entity) -> bool {
        !matches!(self.assure(entity), Assured::Present(_))
    }

    /// Ensures that `entity` is a member and returns its position.
    pub(super) fn assure(&mut self, entity: Entity) -> Assured {
        assert!(
            !entity.is_null() && !entity.is_tombstone(),
            "sentinel entities cannot be stored"
        );

        let next_position = self.dense.len();
        let slot = *self.slot_mut(entity);
        if slot != ABSENT {
            let position: usize = slot.small_int();
            let member = self.dense.get_mut(position).expect("index slots point into dense");
            if *member == entity {
                return Assured::Present(position);
            }

            log::trace!("Replacing stale {member:?} with {entity:?} at position {position}");
            *member = entity;
            return Assured::Replaced(position);
        }

        *self.slot_mut(entity) = next_position.small_int();
        self.dense.push(entity);
        Assured::Appended(next_position)
    }

    /// Removes `entity`, moving the last member into its position.
    ///
    /// Returns `false` if `entity` was not a member.
    pub fn erase(&mut self, entity: Entity) -> bool { self.swap_remove(entity).is_some() }

    /// Removes `entity` and returns the position it occupied.
    pub(super) fn swap_remove(&mut self, entity: Entity) -> Option<usize> {
        let position = self.find(entity)?;
        self.swap_remove_at(position);
        Some(position)
    }

    /// Removes the member at `position`, moving the last member into its place.
    pub fn swap_remove_at(&mut self, position: usize) -> Option<Entity> {
        if position >= self.dense.len() {
            return None;
        }

        let removed = self.dense.swap_remove(position);
        *self.slot_mut(removed) = ABSENT;
        if let Some(&moved) = self.dense.get(position) {
            *self.slot_mut(moved) = position.small_int();
        }
        Some(removed)
    }

    /// Removes all members. Allocated pages are kept.
    pub fn clear(&mut self) {
        let mut dense = std::mem::take(&mut self.dense);
        for &entity in &dense {
            *self.slot_mut(entity) = ABSENT;
        }
        dense.clear();
        self.dense = dense;
    }

    /// The members in the packed order.
    pub fn as_slice(&self) -> &[Entity] { &self.dense }

    /// Iterates over the members in the packed order.
    pub fn iter(&self) -> slice::Iter<'_, Entity> { self.dense.iter() }

    fn slot_mut(&mut self, entity: Entity) -> &mut u32 {
        let (page_index, offset) = split(entity);
        if self.pages.len() <= page_index {
            self.pages.resize_with(page_index + 1, || None);
        }

        let page = self.pages[page_index].get_or_insert_with(|| {
            log::trace!("Allocating sparse page #{page_index}");
            Box::new([ABSENT; PAGE_SIZE])
        });
        &mut page[offset]
    }

    /// Asserts that the index and the packed array agree.
    #[cfg(test)]
    pub(super) fn validate(&self) {
        for (position, &entity) in self.dense.iter().enumerate() {
            assert_eq!(self.find(entity), Some(position), "{entity:?} should be at {position}");
        }

        let occupied = self
            .pages
            .iter()
            .flatten()
            .flat_map(|page| page.iter())
            .filter(|&&slot| slot != ABSENT)
            .count();
        assert_eq!(occupied, self.dense.len(), "every index slot should point to a member");
    }
}

impl<'t> IntoIterator for &'t SparseSet {
    type Item = &'t Entity;
    type IntoIter = slice::Iter<'t, Entity>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

fn split(entity: Entity) -> (usize, usize) {
    let index = entity.usize();
    (index / PAGE_SIZE, index % PAGE_SIZE)
}

#[cfg(test)]
super::tests::test_storage!(SparseSet);
