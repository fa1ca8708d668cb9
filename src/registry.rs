//! The registry composes an entity store with one component storage per type.
//!
//! ```
//! use sparsec::{Error, Registry};
//!
//! let mut registry = Registry::new();
//! let entity = registry.acquire_entity();
//! registry.assign(entity, 42_i32)?;
//! assert_eq!(registry.get::<i32>(entity), Ok(&42));
//!
//! registry.release(entity)?;
//! assert_eq!(registry.get::<i32>(entity), Err(Error::InvalidEntity(entity)));
//! # Ok::<(), Error>(())
//! ```

use std::any::{self, TypeId};
use std::fmt;

use indexmap::IndexMap;

use crate::storage::SparseMap;
use crate::util::DbgTypeId;
use crate::{entity, Entity, Error};

mod builder;
pub use builder::Builder;

mod erased;
use erased::AnyStorage;

mod relationship;
pub use relationship::{Children, Relationship};


/// A type that can be assigned to entities.
///
/// This trait is implemented for every eligible type.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Stores entities and their components.
pub struct Registry {
    entities: entity::Store,
    storages: IndexMap<DbgTypeId, Box<dyn AnyStorage>>,
}

static_assertions::assert_impl_all!(Registry: Send, Sync);

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct StorageSizes<'t>(&'t IndexMap<DbgTypeId, Box<dyn AnyStorage>>);

        impl fmt::Debug for StorageSizes<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_map().entries(self.0.iter().map(|(ty, storage)| (ty, storage.len()))).finish()
            }
        }

        f.debug_struct("Registry")
            .field("entities", &self.entities.len())
            .field("storages", &StorageSizes(&self.storages))
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self { Self::new() }
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self { Builder::default().build() }

    /// Creates a builder to configure a registry.
    pub fn builder() -> Builder { Builder::default() }

    /// Issues a new entity.
    pub fn acquire_entity(&mut self) -> Entity { self.entities.acquire() }

    /// Releases an entity and drops all its components.
    pub fn release(&mut self, entity: Entity) -> Result<(), Error> {
        if !self.entities.is_valid(entity) {
            return Err(Error::InvalidEntity(entity));
        }

        self.unlink_relationships(entity);

        let mut purged = 0_usize;
        for storage in self.storages.values_mut() {
            purged += usize::from(storage.erase(entity));
        }
        log::trace!("Releasing {entity:?} with {purged} components");

        self.entities.release(entity)
    }

    /// Whether `entity` is alive.
    pub fn is_valid(&self, entity: Entity) -> bool { self.entities.is_valid(entity) }

    /// The number of live entities.
    pub fn entity_count(&self) -> usize { self.entities.len() }

    /// Iterates over the live entities in ascending index order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ { self.entities.iter() }

    /// The number of component types with a storage.
    pub fn component_types(&self) -> usize { self.storages.len() }

    /// The total number of components across all storages.
    pub fn component_count(&self) -> usize {
        self.storages.values().map(|storage| storage.len()).sum()
    }

    /// Assigns a component to `entity`, returning the component it replaced.
    pub fn assign<T: Component>(&mut self, entity: Entity, value: T) -> Result<Option<T>, Error> {
        self.check(entity)?;
        Ok(self.storage_or_insert::<T>().insert_or_replace(entity, value))
    }

    /// Whether `entity` has a component of type `T`.
    ///
    /// Returns `false` if no component of type `T` has ever been assigned.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.storage::<T>().map_or(false, |storage| storage.contains(entity))
    }

    /// The component of type `T` of `entity`.
    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T, Error> {
        self.check(entity)?;
        self.try_get(entity).ok_or_else(|| missing::<T>(entity))
    }

    /// The component of type `T` of `entity`, mutably.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, Error> {
        self.check(entity)?;
        self.try_get_mut(entity).ok_or_else(|| missing::<T>(entity))
    }

    /// The component of type `T` of `entity`, if both exist.
    pub fn try_get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    /// The component of type `T` of `entity`, mutably, if both exist.
    pub fn try_get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut::<T>()?.get_mut(entity)
    }

    /// Removes the component of type `T` from `entity`.
    ///
    /// Does nothing if `entity` has no such component.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.storage_mut::<T>()?.remove(entity)
    }

    /// The storage of component type `T`, if it has been created.
    pub fn storage<T: Component>(&self) -> Option<&SparseMap<T>> {
        let storage = self.storages.get(&TypeId::of::<T>())?;
        Some(storage.downcast_ref::<T>())
    }

    /// The mutable storage of component type `T`, if it has been created.
    ///
    /// Inserting values for dead entities through this storage is allowed
    /// but they are never reachable through the registry.
    pub fn storage_mut<T: Component>(&mut self) -> Option<&mut SparseMap<T>> {
        let storage = self.storages.get_mut(&TypeId::of::<T>())?;
        Some(storage.downcast_mut::<T>())
    }

    /// Releases all entities and drops all components.
    ///
    /// Storages are kept, so component types stay registered.
    pub fn clear(&mut self) {
        for storage in self.storages.values_mut() {
            storage.clear();
        }
        self.entities.clear();
    }

    fn storage_or_insert<T: Component>(&mut self) -> &mut SparseMap<T> {
        let storage = self.storages.entry(DbgTypeId::of::<T>()).or_insert_with(|| {
            log::debug!("Creating storage for component `{}`", any::type_name::<T>());
            Box::new(SparseMap::<T>::new()) as Box<dyn AnyStorage>
        });
        storage.downcast_mut::<T>()
    }

    fn check(&self, entity: Entity) -> Result<(), Error> {
        if self.entities.is_valid(entity) {
            Ok(())
        } else {
            Err(Error::InvalidEntity(entity))
        }
    }
}

fn missing<T: Component>(entity: Entity) -> Error {
    Error::MissingComponent { entity, component: any::type_name::<T>() }
}
