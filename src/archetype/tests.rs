use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Archetype, ColumnInfo, Key};
use crate::test_util::{self, Position, Velocity};
use crate::Error;

fn moving() -> Archetype {
    Archetype::new([ColumnInfo::of::<Position>(), ColumnInfo::of::<Velocity>()])
}

#[test]
fn test_growth_with_interleaved_erase() {
    test_util::init();

    let mut archetype = Archetype::with_capacity([ColumnInfo::of::<f32>()], 0);
    assert_eq!(archetype.capacity(), 0);

    let keys: Vec<Key> = (0..1000)
        .map(|i| {
            let key = archetype.allocate();
            *archetype.get_mut::<f32>(key, 0).expect("fresh key") = i as f32 * 0.5;
            key
        })
        .collect();
    assert_eq!(archetype.len(), 1000);
    assert!(archetype.capacity() >= 1000);

    for key in keys.iter().step_by(2) {
        assert!(archetype.erase(*key));
    }
    assert_eq!(archetype.len(), 500);
    archetype.validate();

    for (i, &key) in keys.iter().enumerate() {
        let value = archetype.get::<f32>(key, 0).copied();
        if i % 2 == 0 {
            assert_eq!(value, None, "key {i} was erased");
        } else {
            assert_eq!(value, Some(i as f32 * 0.5), "key {i} lost its value");
        }
    }
}

#[test]
fn test_allocate_zeroes_rows() {
    let mut archetype = moving();
    let first = archetype.allocate();
    *archetype.get_mut::<Position>(first, 0).expect("alive") = Position { x: 1.0, y: 2.0 };
    assert!(archetype.erase(first));

    let second = archetype.allocate();
    assert_eq!(archetype.get::<Position>(second, 0), Some(&Position::default()));
    assert_eq!(archetype.element_at(second, 1), Some(&[0u8; 8][..]));
}

#[test]
fn test_stale_key_rejected() {
    test_util::init();

    let mut archetype = moving();
    let key = archetype.allocate();
    assert!(archetype.erase(key));
    assert!(!archetype.erase(key), "double erase must fail");
    assert!(!archetype.is_valid(key));
    assert_eq!(archetype.element_at(key, 0), None);

    let reused = archetype.allocate();
    assert_eq!(reused.index(), key.index(), "the freed slot is reused first");
    assert_eq!(reused.generation(), key.generation() + 1);
    assert!(!archetype.is_valid(key));
    assert!(archetype.is_valid(reused));
    assert_eq!(archetype.resolve(key), Err(Error::InvalidKey(key)));
    assert_eq!(archetype.resolve(reused), Ok(0));
}

#[test]
fn test_rows_zeroed_across_growth() {
    let mut archetype = Archetype::new([ColumnInfo::of::<u64>(), ColumnInfo::from_layout(24, 8)]);
    let keys: Vec<_> = (0..40).map(|_| archetype.allocate()).collect();
    assert!(archetype.capacity() > 8, "the columns were reallocated");

    assert!(archetype.column::<u64>(0).iter().all(|&value| value == 0));
    for &key in &keys {
        assert_eq!(archetype.element_at(key, 1), Some(&[0u8; 24][..]));
    }
}

#[test]
fn test_erase_preserves_others() {
    let mut archetype = moving();
    let keys: Vec<_> = (0..5).map(|_| archetype.allocate()).collect();
    for (i, &key) in keys.iter().enumerate() {
        *archetype.get_mut::<Velocity>(key, 1).expect("alive") = Velocity { dx: i as f32, dy: 0.0 };
    }

    assert!(archetype.erase(keys[1]));
    assert_eq!(archetype.row_of(keys[4]), Some(1), "the last row fills the hole");
    archetype.validate();

    for i in [0, 2, 3, 4] {
        assert_eq!(archetype.get::<Velocity>(keys[i], 1).map(|v| v.dx), Some(i as f32));
    }
    assert_eq!(archetype.keys().collect::<Vec<_>>(), [keys[0], keys[4], keys[2], keys[3]]);
}

#[test]
fn test_erase_last_row() {
    let mut archetype = moving();
    let a = archetype.allocate();
    let b = archetype.allocate();
    assert!(archetype.erase(b));
    assert_eq!(archetype.row_of(a), Some(0));
    assert_eq!(archetype.len(), 1);
    archetype.validate();
}

#[test]
fn test_bytes_round_trip() {
    let mut archetype = Archetype::new([ColumnInfo::from_layout(12, 4)]);
    let key = archetype.allocate();
    let bytes: Vec<u8> = (1..=12).collect();
    archetype.element_at_mut(key, 0).expect("alive").copy_from_slice(&bytes);
    assert_eq!(archetype.element_at(key, 0), Some(&bytes[..]));
    assert_eq!(archetype.column_info(0).type_name(), None);
    let words = [
        u32::from_ne_bytes([1, 2, 3, 4]),
        u32::from_ne_bytes([5, 6, 7, 8]),
        u32::from_ne_bytes([9, 10, 11, 12]),
    ];
    assert_eq!(archetype.get::<[u32; 3]>(key, 0), Some(&words));
}

#[test]
fn test_column_slices() {
    let mut archetype = moving();
    let keys: Vec<_> = (0..4).map(|_| archetype.allocate()).collect();
    for (i, position) in archetype.column_mut::<Position>(0).iter_mut().enumerate() {
        position.x = i as f32;
    }
    archetype.erase(keys[0]);

    let xs: Vec<f32> = archetype.column::<Position>(0).iter().map(|p| p.x).collect();
    assert_eq!(xs, [3.0, 1.0, 2.0]);
    assert_eq!(archetype.column::<Velocity>(1).len(), 3);
}

#[test]
fn test_columns_mut_split_borrow() {
    test_util::init();

    let mut archetype = moving();
    let keys: Vec<_> = (0..5).map(|_| archetype.allocate()).collect();
    for (i, &key) in keys.iter().enumerate() {
        *archetype.get_mut::<Position>(key, 0).expect("alive") = Position { x: i as f32, y: 0.0 };
        *archetype.get_mut::<Velocity>(key, 1).expect("alive") = Velocity { dx: 1.0, dy: i as f32 };
    }
    archetype.erase(keys[2]);

    let (positions, velocities) = archetype.columns_mut::<(Position, Velocity)>([0, 1]);
    assert_eq!((positions.len(), velocities.len()), (4, 4));
    for (position, velocity) in positions.iter_mut().zip(velocities.iter()) {
        position.x += velocity.dx;
        position.y += velocity.dy;
    }

    for i in [0, 1, 3, 4] {
        let expected = Position { x: i as f32 + 1.0, y: i as f32 };
        assert_eq!(archetype.get::<Position>(keys[i], 0), Some(&expected));
    }
}

#[test]
fn test_columns_mut_reversed_order() {
    let mut archetype = moving();
    let key = archetype.allocate();
    let (velocities, positions) = archetype.columns_mut::<(Velocity, Position)>([1, 0]);
    velocities[0].dx = 3.0;
    positions[0].y = 4.0;
    assert_eq!(archetype.get::<Velocity>(key, 1).map(|v| v.dx), Some(3.0));
    assert_eq!(archetype.get::<Position>(key, 0).map(|p| p.y), Some(4.0));
}

#[test]
#[should_panic = "column 1 is borrowed twice"]
fn test_columns_mut_duplicate() {
    let mut archetype = moving();
    archetype.columns_mut::<(Velocity, Velocity)>([1, 1]);
}

#[test]
#[should_panic = "column index 5 out of bounds for an archetype with 2 columns"]
fn test_columns_mut_out_of_bounds() {
    let mut archetype = moving();
    archetype.columns_mut::<(Position, Velocity)>([0, 5]);
}

#[test]
#[should_panic = "column 1 stores `sparsec::test_util::Velocity`, not `sparsec::test_util::Position`"]
fn test_columns_mut_type_mismatch() {
    let mut archetype = moving();
    archetype.columns_mut::<(Position, Position)>([0, 1]);
}

#[test]
fn test_debug_format() {
    let mut archetype = moving();
    archetype.allocate();
    let debug = format!("{archetype:?}");
    assert!(debug.starts_with("Archetype { len: 1, capacity: 8, columns: ["), "{debug}");
    assert!(debug.contains("sparsec::test_util::Velocity"), "{debug}");
}

#[test]
fn test_reserve_avoids_growth() {
    let mut archetype = moving();
    archetype.reserve(100);
    assert_eq!(archetype.capacity(), 100);
    for _ in 0..100 {
        archetype.allocate();
    }
    assert_eq!(archetype.capacity(), 100);
    archetype.allocate();
    assert_eq!(archetype.capacity(), 200);
    archetype.validate();
}

#[test]
fn test_clear() {
    let mut archetype = moving();
    let keys: Vec<_> = (0..10).map(|_| archetype.allocate()).collect();
    archetype.clear();
    assert!(archetype.is_empty());
    assert!(keys.iter().all(|&key| !archetype.is_valid(key)));
    archetype.validate();

    let key = archetype.allocate();
    assert_eq!(key.generation(), 1);
    assert_eq!(archetype.column::<Position>(0), [Position::default()]);
}

#[test]
fn test_random_churn() {
    test_util::init();

    let mut rng = StdRng::seed_from_u64(42);
    let mut archetype = moving();
    let mut live: Vec<(Key, f32)> = Vec::new();
    let mut dead: Vec<Key> = Vec::new();

    for step in 0..4000 {
        if live.is_empty() || rng.gen_bool(0.55) {
            let key = archetype.allocate();
            let value = step as f32;
            archetype.get_mut::<Position>(key, 0).expect("fresh key").y = value;
            live.push((key, value));
        } else {
            let (key, _) = live.swap_remove(rng.gen_range(0..live.len()));
            assert!(archetype.erase(key));
            dead.push(key);
        }
    }

    archetype.validate();
    assert_eq!(archetype.len(), live.len());
    for &(key, value) in &live {
        assert_eq!(archetype.get::<Position>(key, 0).map(|p| p.y), Some(value));
    }
    assert!(dead.iter().all(|&key| !archetype.is_valid(key)));
}

#[test]
#[should_panic = "column index 2 out of bounds for an archetype with 2 columns"]
fn test_column_out_of_bounds() {
    let mut archetype = moving();
    let key = archetype.allocate();
    archetype.element_at(key, 2);
}

#[test]
#[should_panic = "stores `sparsec::test_util::Position`, not `u64`"]
fn test_column_type_mismatch() {
    let mut archetype = moving();
    let key = archetype.allocate();
    archetype.get::<u64>(key, 0);
}

#[test]
#[should_panic = "zero-sized columns are not supported"]
fn test_zero_sized_column() { ColumnInfo::of::<()>(); }
