//! An archetype stores rows of plain-old-data components in parallel columns.
//!
//! Every column of an archetype shares the same row count and capacity.
//! Rows are addressed externally through [`Key`]s,
//! which stay valid while other rows are erased and compacted.
//!
//! # Keys
//! A key is a slot index plus a generation, analogous to an [`Entity`](crate::Entity).
//! `look_back` maps each key slot to the row it currently addresses,
//! and `trampoline` maps each row back to the key that owns it.
//! Erasing a row moves the last row into the hole and patches both tables,
//! then recycles the key slot with an incremented generation,
//! so stale keys are rejected by every accessor.

use std::any::{self, TypeId};
use std::{array, cmp, fmt};

use xias::Xias;

use crate::util::DbgTypeId;
use crate::Error;

mod column;
use column::Column;

#[cfg(test)]
mod tests;

/// Terminates the free list of key slots.
const FREE_LIST_END: u32 = u32::MAX;

/// The capacity of the first allocation when growing from empty.
const MIN_GROWTH: usize = 8;

/// A stable handle to an archetype row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    index:      u32,
    generation: u32,
}

impl Key {
    /// The key slot.
    pub fn index(self) -> u32 { self.index }

    /// The generation of the key slot this key was issued with.
    pub fn generation(self) -> u32 { self.generation }
}

/// Describes the element type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnInfo {
    size:  usize,
    align: usize,
    ty:    Option<DbgTypeId>,
}

impl ColumnInfo {
    /// A column storing values of type `T`.
    ///
    /// # Panics
    /// Panics if `T` is zero-sized.
    pub fn of<T: bytemuck::Pod>() -> Self {
        let info = Self::from_layout(std::mem::size_of::<T>(), std::mem::align_of::<T>());
        Self { ty: Some(DbgTypeId::of::<T>()), ..info }
    }

    /// An untyped column of `size`-byte elements.
    ///
    /// # Panics
    /// Panics if `size` is zero, `align` is not a power of two,
    /// or `size` is not a multiple of `align`.
    pub fn from_layout(size: usize, align: usize) -> Self {
        assert!(size > 0, "zero-sized columns are not supported");
        assert!(align.is_power_of_two(), "column alignment {align} is not a power of two");
        assert_eq!(size % align, 0, "column size {size} is not a multiple of its alignment {align}");
        Self { size, align, ty: None }
    }

    /// The size of one element in bytes.
    pub fn size(&self) -> usize { self.size }

    /// The alignment of the elements.
    pub fn align(&self) -> usize { self.align }

    /// The name of the element type, if the column is typed.
    pub fn type_name(&self) -> Option<&'static str> { self.ty.map(|ty| ty.name) }

    fn assert_type<T: bytemuck::Pod>(&self, column: usize) {
        match self.ty {
            Some(ty) => assert!(
                ty.id == TypeId::of::<T>(),
                "column {column} stores `{}`, not `{}`",
                ty.name,
                any::type_name::<T>(),
            ),
            None => assert!(
                self.size == std::mem::size_of::<T>() && self.align >= std::mem::align_of::<T>(),
                "column {column} has {}-byte elements aligned to {}, incompatible with `{}`",
                self.size,
                self.align,
                any::type_name::<T>(),
            ),
        }
    }
}

/// Bookkeeping for one key slot.
#[derive(Debug, Clone, Copy)]
struct Slot {
    /// The row addressed by a live slot, or the next free slot.
    target:     u32,
    generation: u32,
}

/// Row-aligned column storage with stable keys.
pub struct Archetype {
    columns:    Vec<Column>,
    /// The key owning each row, in row order.
    trampoline: Vec<Key>,
    /// One entry per key slot. The slot count is the capacity of the columns.
    look_back:  Vec<Slot>,
    first_free: u32,
}

impl Archetype {
    /// Creates an empty archetype without allocating.
    pub fn new(columns: impl IntoIterator<Item = ColumnInfo>) -> Self {
        Self::with_capacity(columns, 0)
    }

    /// Creates an empty archetype that holds `capacity` rows without reallocating.
    pub fn with_capacity(columns: impl IntoIterator<Item = ColumnInfo>, capacity: usize) -> Self {
        let mut archetype = Self {
            columns:    columns.into_iter().map(Column::new).collect(),
            trampoline: Vec::new(),
            look_back:  Vec::new(),
            first_free: FREE_LIST_END,
        };
        archetype.reserve(capacity);
        archetype
    }

    /// The number of live rows.
    pub fn len(&self) -> usize { self.trampoline.len() }

    /// Whether there are no live rows.
    pub fn is_empty(&self) -> bool { self.trampoline.is_empty() }

    /// The number of rows that fit without reallocating the columns.
    pub fn capacity(&self) -> usize { self.look_back.len() }

    /// The number of columns.
    pub fn column_count(&self) -> usize { self.columns.len() }

    /// Describes the column at `column`.
    pub fn column_info(&self, column: usize) -> &ColumnInfo { self.column_ref(column).info() }

    /// Grows all columns to hold at least `capacity` rows.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity > self.capacity() {
            self.grow_to(capacity);
        }
    }

    fn grow_to(&mut self, capacity: usize) {
        let old_capacity = self.capacity();
        log::debug!("Growing archetype from {old_capacity} to {capacity} rows");

        // Link the new slots in ascending order in front of the existing free list.
        let last_new = capacity - 1;
        let previous_head = self.first_free;
        self.look_back.extend((old_capacity..capacity).map(|slot| Slot {
            target:     if slot == last_new { previous_head } else { (slot + 1).small_int() },
            generation: 0,
        }));
        self.first_free = old_capacity.small_int();

        self.trampoline.reserve_exact(capacity - self.trampoline.len());
        for column in &mut self.columns {
            column.grow(capacity);
        }
    }

    /// Creates a zero-initialized row and returns its key.
    pub fn allocate(&mut self) -> Key {
        if self.first_free == FREE_LIST_END {
            let capacity = self.capacity();
            self.grow_to(cmp::max(MIN_GROWTH, capacity * 2));
        }

        let index = self.first_free;
        let row = self.trampoline.len();
        let slot = &mut self.look_back[index.small_int::<usize>()];
        self.first_free = slot.target;
        slot.target = row.small_int();

        let key = Key { index, generation: slot.generation };
        self.trampoline.push(key);
        for column in &mut self.columns {
            column.zero_row(row);
        }

        key
    }

    /// Whether `key` addresses a live row.
    pub fn is_valid(&self, key: Key) -> bool { self.row_of(key).is_some() }

    /// The row currently addressed by `key`.
    pub fn row_of(&self, key: Key) -> Option<usize> {
        let slot = self.look_back.get(key.index.small_int::<usize>())?;
        if slot.generation != key.generation {
            return None;
        }

        let row = slot.target.small_int::<usize>();
        (self.trampoline.get(row) == Some(&key)).then_some(row)
    }

    /// Like [`row_of`](Self::row_of), but reports a stale key as [`Error::InvalidKey`].
    pub fn resolve(&self, key: Key) -> Result<usize, Error> {
        self.row_of(key).ok_or(Error::InvalidKey(key))
    }

    /// Erases the row addressed by `key`, moving the last row into its place.
    ///
    /// Returns `false` if `key` is stale.
    pub fn erase(&mut self, key: Key) -> bool {
        let Some(row) = self.row_of(key) else { return false };

        let last = self.trampoline.len() - 1;
        for column in &mut self.columns {
            column.copy_row(row, last);
        }
        self.trampoline.swap_remove(row);
        if let Some(&moved) = self.trampoline.get(row) {
            log::trace!("Moving {moved:?} from row {last} to row {row}");
            self.look_back[moved.index.small_int::<usize>()].target = row.small_int();
        }

        let slot = &mut self.look_back[key.index.small_int::<usize>()];
        slot.generation = slot.generation.wrapping_add(1);
        slot.target = self.first_free;
        self.first_free = key.index;
        true
    }

    /// Erases all rows, invalidating every key.
    pub fn clear(&mut self) {
        for key in self.trampoline.drain(..) {
            let slot = &mut self.look_back[key.index.small_int::<usize>()];
            slot.generation = slot.generation.wrapping_add(1);
            slot.target = self.first_free;
            self.first_free = key.index;
        }
    }

    /// The keys of all live rows, in row order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ { self.trampoline.iter().copied() }

    /// The raw bytes of the element of `key` in `column`.
    ///
    /// # Panics
    /// Panics if `column` is out of bounds.
    pub fn element_at(&self, key: Key, column: usize) -> Option<&[u8]> {
        let column = self.column_ref(column);
        let row = self.row_of(key)?;
        Some(column.row(row))
    }

    /// The mutable raw bytes of the element of `key` in `column`.
    ///
    /// # Panics
    /// Panics if `column` is out of bounds.
    pub fn element_at_mut(&mut self, key: Key, column: usize) -> Option<&mut [u8]> {
        let row = self.row_of(key);
        let column = self.column_mut_ref(column);
        Some(column.row_mut(row?))
    }

    /// The element of `key` in `column`, reinterpreted as `T`.
    ///
    /// # Panics
    /// Panics if `column` is out of bounds or does not store `T`.
    pub fn get<T: bytemuck::Pod>(&self, key: Key, column: usize) -> Option<&T> {
        self.column_ref(column).info().assert_type::<T>(column);
        self.element_at(key, column).map(bytemuck::from_bytes)
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut<T: bytemuck::Pod>(&mut self, key: Key, column: usize) -> Option<&mut T> {
        self.column_ref(column).info().assert_type::<T>(column);
        self.element_at_mut(key, column).map(bytemuck::from_bytes_mut)
    }

    /// All live elements of `column` in row order.
    ///
    /// # Panics
    /// Panics if `column` is out of bounds or does not store `T`.
    pub fn column<T: bytemuck::Pod>(&self, column: usize) -> &[T] {
        let data = self.column_ref(column);
        data.info().assert_type::<T>(column);
        bytemuck::cast_slice(data.rows(self.len()))
    }

    /// Mutable variant of [`column`](Self::column).
    pub fn column_mut<T: bytemuck::Pod>(&mut self, column: usize) -> &mut [T] {
        let len = self.len();
        let data = self.column_mut_ref(column);
        data.info().assert_type::<T>(column);
        bytemuck::cast_slice_mut(data.rows_mut(len))
    }

    /// Borrows several distinct columns mutably at once, typed as the tuple `C`.
    ///
    /// ```
    /// use sparsec::archetype::{Archetype, ColumnInfo};
    ///
    /// let mut archetype = Archetype::new([ColumnInfo::of::<f32>(), ColumnInfo::of::<f32>()]);
    /// let key = archetype.allocate();
    /// *archetype.get_mut::<f32>(key, 1).expect("alive") = 2.5;
    ///
    /// let (positions, velocities) = archetype.columns_mut::<(f32, f32)>([0, 1]);
    /// for (position, velocity) in positions.iter_mut().zip(velocities.iter()) {
    ///     *position += *velocity;
    /// }
    /// assert_eq!(archetype.get::<f32>(key, 0), Some(&2.5));
    /// ```
    ///
    /// # Panics
    /// Panics if a column is out of bounds, does not store its type in `C`,
    /// or appears more than once.
    pub fn columns_mut<'t, C: ColumnTuple<'t>>(&'t mut self, columns: C::Indices) -> C::Slices {
        C::split(self, columns)
    }

    fn many_columns_mut<const N: usize>(&mut self, columns: [usize; N]) -> [&mut Column; N] {
        let count = self.columns.len();
        for (position, &column) in columns.iter().enumerate() {
            assert!(
                column < count,
                "column index {column} out of bounds for an archetype with {count} columns"
            );
            assert!(!columns[..position].contains(&column), "column {column} is borrowed twice");
        }

        let mut borrowed: [Option<&mut Column>; N] = array::from_fn(|_| None);
        for (index, data) in self.columns.iter_mut().enumerate() {
            if let Some(position) = columns.iter().position(|&column| column == index) {
                borrowed[position] = Some(data);
            }
        }
        borrowed.map(|data| data.expect("column indices are checked in bounds"))
    }

    fn column_ref(&self, column: usize) -> &Column {
        let count = self.columns.len();
        self.columns.get(column).unwrap_or_else(|| {
            panic!("column index {column} out of bounds for an archetype with {count} columns")
        })
    }

    fn column_mut_ref(&mut self, column: usize) -> &mut Column {
        let count = self.columns.len();
        self.columns.get_mut(column).unwrap_or_else(|| {
            panic!("column index {column} out of bounds for an archetype with {count} columns")
        })
    }

    /// Asserts that the key tables agree with each other.
    #[cfg(test)]
    pub(crate) fn validate(&self) {
        for (row, &key) in self.trampoline.iter().enumerate() {
            assert_eq!(self.row_of(key), Some(row), "{key:?} should address row {row}");
        }

        let mut free = 0;
        let mut cursor = self.first_free;
        while cursor != FREE_LIST_END {
            free += 1;
            assert!(free <= self.capacity(), "free list contains a cycle");
            cursor = self.look_back[cursor.small_int::<usize>()].target;
        }
        assert_eq!(free + self.len(), self.capacity(), "every key slot is either live or free");
    }
}

impl fmt::Debug for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archetype")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("columns", &self.columns.iter().map(Column::info).collect::<Vec<_>>())
            .finish()
    }
}

static_assertions::assert_impl_all!(Archetype: Send, Sync);

/// A tuple of column element types that [`Archetype::columns_mut`] borrows together.
///
/// Implemented for tuples of up to six [`bytemuck::Pod`] types.
pub trait ColumnTuple<'t> {
    /// The column indices, one per tuple element.
    type Indices;
    /// The typed slices, one per tuple element.
    type Slices;

    /// Borrows the live rows of each column in `columns`.
    fn split(archetype: &'t mut Archetype, columns: Self::Indices) -> Self::Slices;
}

macro_rules! impl_column_tuple {
    ($count:literal; $($ty:ident $index:ident $data:ident),*) => {
        impl<'t, $($ty: bytemuck::Pod),*> ColumnTuple<'t> for ($($ty,)*) {
            type Indices = [usize; $count];
            type Slices = ($(&'t mut [$ty],)*);

            fn split(archetype: &'t mut Archetype, columns: [usize; $count]) -> Self::Slices {
                let len = archetype.len();
                let [$($data),*] = archetype.many_columns_mut(columns);
                let [$($index),*] = columns;
                ($({
                    $data.info().assert_type::<$ty>($index);
                    bytemuck::cast_slice_mut::<u8, $ty>($data.rows_mut(len))
                },)*)
            }
        }
    };
}

impl_column_tuple!(1; A a_index a_data);
impl_column_tuple!(2; A a_index a_data, B b_index b_data);
impl_column_tuple!(3; A a_index a_data, B b_index b_data, C c_index c_data);
impl_column_tuple!(4; A a_index a_data, B b_index b_data, C c_index c_data, D d_index d_data);
impl_column_tuple!(5; A a_index a_data, B b_index b_data, C c_index c_data, D d_index d_data, E e_index e_data);
impl_column_tuple!(6; A a_index a_data, B b_index b_data, C c_index c_data, D d_index d_data, E e_index e_data, F f_index f_data);
