//! Bit layout of a packed entity identifier.
//!
//! The low [`INDEX_BITS`] bits hold the index,
//! the remaining high bits hold the generation.

/// Number of bits used for the entity index.
pub const INDEX_BITS: u32 = 20;

/// Number of bits used for the generation counter.
pub const GENERATION_BITS: u32 = u32::BITS - INDEX_BITS;

/// Mask of the index field.
///
/// Also the reserved index shared by the sentinels,
/// so the largest index [`Entity::construct`](super::Entity::construct) accepts is `INDEX_MASK - 1`.
pub const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;

/// Mask of the generation field. Also the largest representable generation.
pub const GENERATION_MASK: u32 = (1 << GENERATION_BITS) - 1;

/// The number of indices that can be issued.
///
/// The largest index is reserved for the sentinels and never handed out.
pub const MAX_ENTITIES: usize = INDEX_MASK as usize;

static_assertions::const_assert!(INDEX_BITS >= 12);
static_assertions::const_assert!(GENERATION_BITS >= 8);

pub(crate) const fn pack(index: u32, generation: u32) -> u32 {
    (index & INDEX_MASK) | ((generation & GENERATION_MASK) << INDEX_BITS)
}

pub(crate) const fn index_of(bits: u32) -> u32 { bits & INDEX_MASK }

pub(crate) const fn generation_of(bits: u32) -> u32 { bits >> INDEX_BITS }

/// Increments a generation, wrapping within [`GENERATION_BITS`].
pub(crate) const fn next_generation(generation: u32) -> u32 {
    generation.wrapping_add(1) & GENERATION_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_roundtrip_extremes() {
        let bits = pack(INDEX_MASK - 1, GENERATION_MASK);
        assert_eq!(index_of(bits), INDEX_MASK - 1);
        assert_eq!(generation_of(bits), GENERATION_MASK);
    }

    #[test]
    fn test_generation_wraps() {
        assert_eq!(next_generation(0), 1);
        assert_eq!(next_generation(GENERATION_MASK), 0);
    }
}
