use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};
use std::slice;

use super::ColumnInfo;

/// A raw, manually allocated buffer of fixed-size rows.
///
/// Only rows below the owning archetype's length are initialized;
/// the archetype zeroes a row before it becomes live.
pub(super) struct Column {
    info:     ColumnInfo,
    /// Aligned dangling pointer while `capacity == 0`.
    data:     NonNull<u8>,
    capacity: usize,
}

// Columns only hold bytes of `Pod` values, which carry no references.
unsafe impl Send for Column {}
unsafe impl Sync for Column {}

impl Column {
    pub(super) fn new(info: ColumnInfo) -> Self {
        let data = NonNull::new(info.align() as *mut u8).expect("alignment is nonzero");
        Self { info, data, capacity: 0 }
    }

    pub(super) fn info(&self) -> &ColumnInfo { &self.info }

    fn layout(&self, capacity: usize) -> Layout {
        let size = self.info.size().checked_mul(capacity).expect("column size overflow");
        Layout::from_size_align(size, self.info.align()).expect("column layout overflow")
    }

    /// Reallocates the buffer to hold exactly `capacity` rows.
    pub(super) fn grow(&mut self, capacity: usize) {
        assert!(capacity > self.capacity, "columns never shrink");

        let new_layout = self.layout(capacity);
        let data = if self.capacity == 0 {
            // Safety: `ColumnInfo` rejects zero-sized rows and `capacity > 0`.
            unsafe { alloc::alloc(new_layout) }
        } else {
            let old_layout = self.layout(self.capacity);
            // Safety: `data` was allocated with `old_layout` and the new size is nonzero.
            unsafe { alloc::realloc(self.data.as_ptr(), old_layout, new_layout.size()) }
        };

        self.data = NonNull::new(data).unwrap_or_else(|| alloc::handle_alloc_error(new_layout));
        self.capacity = capacity;
    }

    fn row_ptr(&self, row: usize) -> *mut u8 {
        assert!(row < self.capacity, "row {row} out of bounds for capacity {}", self.capacity);
        // Safety: the offset is within the allocation.
        unsafe { self.data.as_ptr().add(row * self.info.size()) }
    }

    /// The bytes of `row`, which must be below the archetype length.
    pub(super) fn row(&self, row: usize) -> &[u8] {
        // Safety: the row lies within the allocation, and rows below the length were zeroed on
        // allocation.
        unsafe { slice::from_raw_parts(self.row_ptr(row), self.info.size()) }
    }

    pub(super) fn row_mut(&mut self, row: usize) -> &mut [u8] {
        // Safety: as in `row`, and access is unique through `&mut self`.
        unsafe { slice::from_raw_parts_mut(self.row_ptr(row), self.info.size()) }
    }

    /// The bytes of the first `len` rows, which must all be initialized.
    pub(super) fn rows(&self, len: usize) -> &[u8] {
        assert!(len <= self.capacity);
        // Safety: the prefix lies within the allocation, or is empty with an aligned pointer.
        unsafe { slice::from_raw_parts(self.data.as_ptr(), len * self.info.size()) }
    }

    pub(super) fn rows_mut(&mut self, len: usize) -> &mut [u8] {
        assert!(len <= self.capacity);
        // Safety: as in `rows`, and access is unique through `&mut self`.
        unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), len * self.info.size()) }
    }

    /// Overwrites row `dest` with the contents of row `src`.
    pub(super) fn copy_row(&mut self, dest: usize, src: usize) {
        if dest == src {
            return;
        }

        let (src, dest) = (self.row_ptr(src), self.row_ptr(dest));
        // Safety: both rows are in bounds and distinct rows never overlap.
        unsafe { ptr::copy_nonoverlapping(src, dest, self.info.size()) }
    }

    /// Zeroes `row`, which may still be uninitialized.
    pub(super) fn zero_row(&mut self, row: usize) {
        let ptr = self.row_ptr(row);
        // Safety: the row is in bounds; writing through the raw pointer never reads the old bytes.
        unsafe { ptr::write_bytes(ptr, 0, self.info.size()) }
    }
}

impl Drop for Column {
    fn drop(&mut self) {
        if self.capacity > 0 {
            let layout = self.layout(self.capacity);
            // Safety: `data` was allocated with this layout.
            unsafe { alloc::dealloc(self.data.as_ptr(), layout) }
        }
    }
}
