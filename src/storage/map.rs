use std::{iter, mem, slice};

use super::sparse::Assured;
use super::SparseSet;
use crate::Entity;

/// Associates a value of type `T` with each member of a [`SparseSet`].
///
/// Values are stored packed, parallel to the member array,
/// so iterating over values is a plain slice traversal.
#[derive(Debug, Clone)]
pub struct SparseMap<T> {
    keys:   SparseSet,
    values: Vec<T>,
}

impl<T> Default for SparseMap<T> {
    fn default() -> Self { Self { keys: SparseSet::default(), values: Vec::new() } }
}

impl<T> SparseMap<T> {
    /// Creates an empty map.
    pub fn new() -> Self { Self::default() }

    /// Creates an empty map with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { keys: SparseSet::with_capacity(capacity), values: Vec::with_capacity(capacity) }
    }

    /// The number of entries.
    pub fn len(&self) -> usize { self.values.len() }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// The capacity of the value array.
    pub fn capacity(&self) -> usize { self.values.capacity() }

    /// Reserves room for at least `additional` more values.
    pub fn reserve(&mut self, additional: usize) {
        self.keys.reserve(additional);
        self.values.reserve(additional);
    }

    /// Whether `entity` has a value.
    pub fn contains(&self, entity: Entity) -> bool { self.keys.contains(entity) }

    /// The position of `entity` in the packed arrays.
    pub fn find(&self, entity: Entity) -> Option<usize> { self.keys.find(entity) }

    /// Inserts a value for `entity` unless it already has one.
    ///
    /// A value left behind by an older generation of the same index is dropped and replaced.
    /// Returns `false` and drops `value` if `entity` already has a value.
    pub fn insert(&mut self, entity: Entity, value: T) -> bool {
        match self.keys.assure(entity) {
            Assured::Appended(position) => {
                debug_assert_eq!(position, self.values.len());
                self.values.push(value);
                true
            }
            Assured::Present(_) => false,
            Assured::Replaced(position) => {
                self.values[position] = value;
                true
            }
        }
    }

    /// Inserts a value for `entity`, returning the value it replaced.
    ///
    /// Values left behind by an older generation are dropped, not returned.
    pub fn insert_or_replace(&mut self, entity: Entity, value: T) -> Option<T> {
        match self.keys.assure(entity) {
            Assured::Appended(_) => {
                self.values.push(value);
                None
            }
            Assured::Present(position) => Some(mem::replace(&mut self.values[position], value)),
            Assured::Replaced(position) => {
                self.values[position] = value;
                None
            }
        }
    }

    /// The value of `entity`.
    pub fn get(&self, entity: Entity) -> Option<&T> {
        let position = self.keys.find(entity)?;
        self.values.get(position)
    }

    /// The mutable value of `entity`.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let position = self.keys.find(entity)?;
        self.values.get_mut(position)
    }

    /// Removes the value of `entity`, moving the last value into its position.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let position = self.keys.swap_remove(entity)?;
        Some(self.values.swap_remove(position))
    }

    /// Like [`remove`](Self::remove), but drops the value.
    pub fn erase(&mut self, entity: Entity) -> bool { self.remove(entity).is_some() }

    /// Removes the entry at `position` in the packed arrays.
    pub fn swap_remove_at(&mut self, position: usize) -> Option<(Entity, T)> {
        let entity = self.keys.swap_remove_at(position)?;
        Some((entity, self.values.swap_remove(position)))
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    /// The members, in the same order as [`values`](Self::values).
    pub fn entities(&self) -> &[Entity] { self.keys.as_slice() }

    /// The values, in the same order as [`entities`](Self::entities).
    pub fn values(&self) -> &[T] { &self.values }

    /// The mutable values, in the same order as [`entities`](Self::entities).
    pub fn values_mut(&mut self) -> &mut [T] { &mut self.values }

    /// The underlying entity set.
    pub fn keys(&self) -> &SparseSet { &self.keys }

    /// Iterates over entries in the packed order.
    pub fn iter(&self) -> iter::Zip<iter::Copied<slice::Iter<'_, Entity>>, slice::Iter<'_, T>> {
        iter::zip(self.keys.iter().copied(), self.values.iter())
    }

    /// Iterates over entries in the packed order with mutable values.
    pub fn iter_mut(
        &mut self,
    ) -> iter::Zip<iter::Copied<slice::Iter<'_, Entity>>, slice::IterMut<'_, T>> {
        iter::zip(self.keys.iter().copied(), self.values.iter_mut())
    }

    #[cfg(test)]
    pub(super) fn validate(&self) {
        self.keys.validate();
        assert_eq!(self.keys.len(), self.values.len());
    }
}

impl<'t, T> IntoIterator for &'t SparseMap<T> {
    type Item = (Entity, &'t T);
    type IntoIter = iter::Zip<iter::Copied<slice::Iter<'t, Entity>>, slice::Iter<'t, T>>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

#[cfg(test)]
super::tests::test_storage!(SparseMap<i64>);
