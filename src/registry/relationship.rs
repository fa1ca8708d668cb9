//! Parent/child links between entities, stored as an ordinary component.

use std::mem;

use super::Registry;
use crate::storage::SparseMap;
use crate::{Entity, Error};

/// Links of an entity in a parent/child hierarchy.
///
/// Children of a parent form a singly linked list through `next_sibling`.
/// [`Entity::TOMBSTONE`] marks an absent link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relationship {
    /// The parent of this entity.
    pub parent:       Entity,
    /// The next child of the same parent.
    pub next_sibling: Entity,
    /// The most recently attached child of this entity.
    pub first_child:  Entity,
}

impl Default for Relationship {
    fn default() -> Self {
        Self {
            parent:       Entity::TOMBSTONE,
            next_sibling: Entity::TOMBSTONE,
            first_child:  Entity::TOMBSTONE,
        }
    }
}

impl Registry {
    /// Makes `child` the first child of `parent`,
    /// detaching it from its previous parent if it had one.
    ///
    /// # Panics
    /// Panics if `parent == child`.
    pub fn attach_child(&mut self, parent: Entity, child: Entity) -> Result<(), Error> {
        self.check(parent)?;
        self.check(child)?;
        assert_ne!(parent, child, "an entity cannot be its own child");

        self.detach_from_parent(child);

        let parent_links = self.relationship_mut(parent);
        let previous_first = mem::replace(&mut parent_links.first_child, child);

        let child_links = self.relationship_mut(child);
        child_links.parent = parent;
        child_links.next_sibling = previous_first;

        log::trace!("Attached {child:?} to {parent:?}");
        Ok(())
    }

    /// Detaches `child` from its parent.
    ///
    /// Returns `false` if `child` had no parent.
    pub fn detach_child(&mut self, child: Entity) -> Result<bool, Error> {
        self.check(child)?;
        Ok(self.detach_from_parent(child))
    }

    /// The live parent of `child`.
    pub fn parent(&self, child: Entity) -> Option<Entity> {
        let parent = self.try_get::<Relationship>(child)?.parent;
        self.is_valid(parent).then_some(parent)
    }

    /// Iterates over the children of `parent`, most recently attached first.
    pub fn children(&self, parent: Entity) -> Children<'_> {
        let storage = self.storage::<Relationship>();
        let next = storage
            .and_then(|storage| storage.get(parent))
            .map_or(Entity::TOMBSTONE, |links| links.first_child);
        Children { storage, next }
    }

    /// Unlinks `entity` from its parent and orphans its children.
    pub(super) fn unlink_relationships(&mut self, entity: Entity) {
        self.detach_from_parent(entity);

        let Some(storage) = self.storage_mut::<Relationship>() else { return };
        let Some(links) = storage.get_mut(entity) else { return };
        let mut cursor = mem::replace(&mut links.first_child, Entity::TOMBSTONE);
        while !cursor.is_tombstone() {
            let Some(child_links) = storage.get_mut(cursor) else { break };
            child_links.parent = Entity::TOMBSTONE;
            cursor = mem::replace(&mut child_links.next_sibling, Entity::TOMBSTONE);
        }
    }

    fn detach_from_parent(&mut self, child: Entity) -> bool {
        let Some(storage) = self.storage_mut::<Relationship>() else { return false };
        let Some(links) = storage.get_mut(child) else { return false };
        if links.parent.is_tombstone() {
            return false;
        }

        let parent = mem::replace(&mut links.parent, Entity::TOMBSTONE);
        let next_sibling = mem::replace(&mut links.next_sibling, Entity::TOMBSTONE);
        unlink_sibling(storage, parent, child, next_sibling);
        true
    }

    fn relationship_mut(&mut self, entity: Entity) -> &mut Relationship {
        let storage = self.storage_or_insert::<Relationship>();
        if !storage.contains(entity) {
            storage.insert(entity, Relationship::default());
        }
        storage.get_mut(entity).expect("relationship was just inserted")
    }
}

/// Removes `child` from the sibling list of `parent`, splicing in `next_sibling`.
fn unlink_sibling(
    storage: &mut SparseMap<Relationship>,
    parent: Entity,
    child: Entity,
    next_sibling: Entity,
) {
    let Some(parent_links) = storage.get_mut(parent) else { return };
    if parent_links.first_child == child {
        parent_links.first_child = next_sibling;
        return;
    }

    let mut cursor = parent_links.first_child;
    while !cursor.is_tombstone() {
        let Some(links) = storage.get_mut(cursor) else { return };
        if links.next_sibling == child {
            links.next_sibling = next_sibling;
            return;
        }
        cursor = links.next_sibling;
    }
}

/// Iterator over the children of an entity.
pub struct Children<'t> {
    storage: Option<&'t SparseMap<Relationship>>,
    next:    Entity,
}

impl<'t> Iterator for Children<'t> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        if self.next.is_tombstone() {
            return None;
        }

        let current = self.next;
        self.next = self
            .storage
            .and_then(|storage| storage.get(current))
            .map_or(Entity::TOMBSTONE, |links| links.next_sibling);
        Some(current)
    }
}
