use std::any;

use indexmap::IndexMap;

use super::erased::AnyStorage;
use super::{Component, Registry};
use crate::entity;
use crate::storage::SparseMap;
use crate::util::DbgTypeId;

/// Configures a [`Registry`] before construction.
///
/// Component types registered here have their storages created eagerly;
/// other component types are still created lazily on first assignment.
#[derive(Default)]
pub struct Builder {
    entity_capacity: usize,
    storages:        IndexMap<DbgTypeId, Box<dyn AnyStorage>>,
}

impl Builder {
    /// Reserves room for `capacity` live entities.
    pub fn entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    /// Creates the storage for `T` up front.
    ///
    /// # Panics
    /// Panics if `T` is already registered.
    pub fn register<T: Component>(self) -> Self { self.register_with_capacity::<T>(0) }

    /// Creates the storage for `T` up front, with room for `capacity` components.
    ///
    /// # Panics
    /// Panics if `T` is already registered.
    pub fn register_with_capacity<T: Component>(mut self, capacity: usize) -> Self {
        let storage: Box<dyn AnyStorage> = Box::new(SparseMap::<T>::with_capacity(capacity));
        let previous = self.storages.insert(DbgTypeId::of::<T>(), storage);
        assert!(previous.is_none(), "Component type `{}` is registered twice", any::type_name::<T>());
        self
    }

    /// Builds the registry.
    pub fn build(self) -> Registry {
        log::debug!(
            "Building registry with {} registered component types and capacity for {} entities",
            self.storages.len(),
            self.entity_capacity,
        );
        Registry {
            entities: entity::Store::with_capacity(self.entity_capacity),
            storages: self.storages,
        }
    }
}
