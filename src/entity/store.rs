//! Issues, validates and recycles entity identifiers.

use bitvec::vec::BitVec;
use xias::Xias;

use super::raw::{self, INDEX_MASK, MAX_ENTITIES};
use super::Entity;
use crate::Error;


/// The number of slots allocated at a time.
pub const ENTITIES_PER_CHUNK: usize = 4096;

static_assertions::const_assert!(ENTITIES_PER_CHUNK.is_power_of_two());
static_assertions::const_assert_eq!((MAX_ENTITIES + 1) % ENTITIES_PER_CHUNK, 0);

/// Terminates the free list. Equal to the reserved index, which is never issued.
const FREE_LIST_END: u32 = INDEX_MASK;

/// Issues entity identifiers and recycles released indices.
///
/// Every slot holds either the live entity occupying it,
/// or, if the slot is free, the index of the next free slot
/// packed together with the generation the slot will be issued with.
/// The free list is LIFO: the most recently released index is reissued first.
#[derive(Debug)]
pub struct Store {
    /// Fixed-size slot chunks, allocated on demand.
    chunks:    Vec<Box<[Entity]>>,
    /// Whether each slot is currently issued.
    occupancy: BitVec,
    /// The first free slot, or [`FREE_LIST_END`].
    free_head: u32,
    /// The number of live entities.
    len:       usize,
}

impl Default for Store {
    fn default() -> Self { Self::new() }
}

impl Store {
    /// Creates an empty store without allocating.
    pub fn new() -> Self {
        Self { chunks: Vec::new(), occupancy: BitVec::new(), free_head: FREE_LIST_END, len: 0 }
    }

    /// Creates a store that can issue `capacity` entities without allocating again.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut store = Self::new();
        store.reserve(capacity);
        store
    }

    /// The number of live entities.
    pub fn len(&self) -> usize { self.len }

    /// Whether no entities are alive.
    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// The number of entities that can be alive without allocating another chunk.
    pub fn capacity(&self) -> usize { (self.chunks.len() * ENTITIES_PER_CHUNK).min(MAX_ENTITIES) }

    /// Ensures that at least `capacity` entities can be alive without allocating again.
    ///
    /// # Panics
    /// Panics if `capacity` exceeds [`MAX_ENTITIES`].
    pub fn reserve(&mut self, capacity: usize) {
        let old_capacity = self.capacity();
        if capacity <= old_capacity {
            return;
        }
        assert!(
            capacity <= MAX_ENTITIES,
            "entity index space exhausted: cannot hold {capacity} entities, the limit is \
             {MAX_ENTITIES}"
        );

        let chunk_count = (capacity + ENTITIES_PER_CHUNK - 1) / ENTITIES_PER_CHUNK;
        log::debug!(
            "Growing entity store from {} to {} chunks",
            self.chunks.len(),
            chunk_count
        );

        while self.chunks.len() < chunk_count {
            let base = self.chunks.len() * ENTITIES_PER_CHUNK;
            let chunk = (base..base + ENTITIES_PER_CHUNK)
                .map(|index| {
                    let next = (index + 1).min(MAX_ENTITIES).small_int::<u32>();
                    Entity::from_bits(raw::pack(next, 0))
                })
                .collect();
            self.chunks.push(chunk);
        }
        self.occupancy.resize(self.chunks.len() * ENTITIES_PER_CHUNK, false);

        // The new slots already link to each other in ascending order.
        // Splice the previous free list behind the last new slot.
        let new_capacity = self.capacity();
        let previous_head = self.free_head;
        let last = self.slot_mut(new_capacity - 1);
        *last = Entity::from_bits(raw::pack(previous_head, last.generation()));
        self.free_head = old_capacity.small_int();
    }

    /// Issues a new entity, preferring the most recently released index.
    ///
    /// # Panics
    /// Panics if all [`MAX_ENTITIES`] indices are in use.
    pub fn acquire(&mut self) -> Entity {
        if self.free_head == FREE_LIST_END {
            // every slot is occupied, so this allocates exactly one more chunk
            self.reserve(self.len + 1);
        }

        let index = self.free_head;
        let slot = self.slot_mut(index.small_int());
        let link = *slot;
        let entity = Entity::from_bits(raw::pack(index, link.generation()));
        *slot = entity;

        self.free_head = link.index();
        self.occupancy.set(index.small_int(), true);
        self.len += 1;

        log::trace!("Acquired {entity:?}");
        entity
    }

    /// Releases an entity so that its index can be reissued with a newer generation.
    ///
    /// Returns [`Error::InvalidEntity`] if the entity is not alive,
    /// including when it was already released.
    pub fn release(&mut self, entity: Entity) -> Result<(), Error> {
        if !self.is_valid(entity) {
            return Err(Error::InvalidEntity(entity));
        }

        let index = entity.usize();
        let next_generation = raw::next_generation(entity.generation());
        *self.slot_mut(index) = Entity::from_bits(raw::pack(self.free_head, next_generation));
        self.free_head = entity.index();
        self.occupancy.set(index, false);
        self.len -= 1;

        log::trace!("Released {entity:?}");
        Ok(())
    }

    /// Whether `entity` is alive, i.e. issued by this store and not yet released.
    pub fn is_valid(&self, entity: Entity) -> bool {
        let index = entity.usize();
        index < self.capacity() && self.occupancy[index] && *self.slot(index) == entity
    }

    /// The generation that `index` is currently issued with,
    /// or will be issued with next if it is free.
    ///
    /// Returns `None` if the index has never been allocated.
    pub fn current_generation(&self, index: u32) -> Option<u32> {
        let index: usize = index.small_int();
        (index < self.capacity()).then(|| self.slot(index).generation())
    }

    /// Releases all live entities.
    ///
    /// Every outstanding handle becomes stale
    /// and the free list is rebuilt in ascending index order.
    pub fn clear(&mut self) {
        let capacity = self.capacity();
        for index in 0..capacity {
            let generation = self.slot(index).generation();
            let generation =
                if self.occupancy[index] { raw::next_generation(generation) } else { generation };
            let next = if index + 1 < capacity { (index + 1).small_int() } else { FREE_LIST_END };
            *self.slot_mut(index) = Entity::from_bits(raw::pack(next, generation));
        }

        self.occupancy.fill(false);
        self.free_head = if capacity > 0 { 0 } else { FREE_LIST_END };
        self.len = 0;
    }

    /// Iterates over the live entities in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.occupancy.iter_ones().map(|index| *self.slot(index))
    }

    fn slot(&self, index: usize) -> &Entity {
        let chunk = self.chunks.get(index / ENTITIES_PER_CHUNK).expect("index within capacity");
        &chunk[index % ENTITIES_PER_CHUNK]
    }

    fn slot_mut(&mut self, index: usize) -> &mut Entity {
        let chunk =
            self.chunks.get_mut(index / ENTITIES_PER_CHUNK).expect("index within capacity");
        &mut chunk[index % ENTITIES_PER_CHUNK]
    }
}
