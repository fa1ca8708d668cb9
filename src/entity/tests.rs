use std::hash;

use super::{raw, Entity, GENERATION_MASK, INDEX_MASK};

// Entities are stored in archetype columns and sparse pages as raw words.
static_assertions::assert_eq_size!(Entity, u32);
static_assertions::assert_impl_all!(Entity: Copy, Send, Sync, hash::Hash, Ord, bytemuck::Pod);

#[test]
fn test_construct_fields() {
    let entity = Entity::construct(5, 3);
    assert_eq!(entity.index(), 5);
    assert_eq!(entity.generation(), 3);
    assert_eq!(Entity::from_bits(entity.to_bits()), entity);
}

#[test]
fn test_sentinels() {
    assert_eq!(Entity::NULL.index(), INDEX_MASK);
    assert_eq!(Entity::NULL.generation(), 0);
    assert_eq!(Entity::TOMBSTONE.to_bits(), u32::MAX);
    assert_eq!(Entity::TOMBSTONE.generation(), GENERATION_MASK);

    assert!(Entity::NULL.is_null());
    assert!(!Entity::NULL.is_tombstone());
    assert!(Entity::TOMBSTONE.is_tombstone());
    assert_ne!(Entity::NULL, Entity::TOMBSTONE);
    assert_eq!(Entity::default(), Entity::NULL);
}

#[test]
fn test_generation_does_not_leak_into_index() {
    let entity = Entity::construct(INDEX_MASK - 1, GENERATION_MASK);
    assert_eq!(entity.index(), INDEX_MASK - 1);
    assert_eq!(entity.generation(), GENERATION_MASK);
    assert_eq!(raw::index_of(entity.to_bits()), INDEX_MASK - 1);
}

#[test]
#[should_panic = "is out of range"]
fn test_construct_index_overflow() { Entity::construct(INDEX_MASK + 1, 0); }

#[test]
#[should_panic = "index 1048575 is reserved for the sentinels"]
fn test_construct_reserved_index() { Entity::construct(INDEX_MASK, 0); }

#[test]
#[should_panic = "reserved for the sentinels"]
fn test_construct_tombstone_bits() { Entity::construct(INDEX_MASK, GENERATION_MASK); }

#[test]
#[should_panic = "exceeds 12 bits"]
fn test_construct_generation_overflow() { Entity::construct(0, GENERATION_MASK + 1); }

#[test]
fn test_debug_format() {
    assert_eq!(format!("{:?}", Entity::construct(7, 2)), "Entity(7v2)");
    assert_eq!(format!("{}", Entity::NULL), "Entity(null)");
    assert_eq!(format!("{}", Entity::TOMBSTONE), "Entity(tombstone)");
}
