use std::any::Any;

use super::Component;
use crate::storage::SparseMap;
use crate::Entity;

/// A [`SparseMap`] with its value type erased.
pub(super) trait AnyStorage: Send + Sync {
    fn as_any(&self) -> &(dyn Any + Send + Sync);

    fn as_any_mut(&mut self) -> &mut (dyn Any + Send + Sync);

    /// Drops the component of `entity`, if any.
    fn erase(&mut self, entity: Entity) -> bool;

    fn len(&self) -> usize;

    fn clear(&mut self);
}

impl dyn AnyStorage {
    pub(super) fn downcast_ref<T: Component>(&self) -> &SparseMap<T> {
        self.as_any().downcast_ref::<SparseMap<T>>().expect("TypeId mismatch")
    }

    pub(super) fn downcast_mut<T: Component>(&mut self) -> &mut SparseMap<T> {
        self.as_any_mut().downcast_mut::<SparseMap<T>>().expect("TypeId mismatch")
    }
}

impl<T: Component> AnyStorage for SparseMap<T> {
    fn as_any(&self) -> &(dyn Any + Send + Sync) { self }

    fn as_any_mut(&mut self) -> &mut (dyn Any + Send + Sync) { self }

    fn erase(&mut self, entity: Entity) -> bool { SparseMap::erase(self, entity) }

    fn len(&self) -> usize { SparseMap::len(self) }

    fn clear(&mut self) { SparseMap::clear(self) }
}
