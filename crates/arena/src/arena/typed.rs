//! Typed allocation helpers
//!
//! Thin wrappers turning "space for a `T`" into `(size, align)` requests.
//! Values placed in the arena are never dropped: the arena only releases
//! memory, so anything owning heap resources leaks them unless the caller
//! drops it in place first.

use std::mem;
use std::ptr;

use super::{Arena, alloc_array};

impl Arena {
    /// Moves `value` into the arena
    #[must_use = "allocated memory must be used"]
    pub fn alloc_value<T>(&self, value: T) -> &mut T {
        let ptr = self.alloc_layout(std::alloc::Layout::new::<T>()).cast::<T>();

        // SAFETY: Initializing allocated memory and creating reference.
        // - ptr is valid and aligned for T (alloc_layout guarantees)
        // - the region is fresh, nothing else refers to it
        // - lifetime is bound to &self, and reset needs &mut self
        unsafe {
            ptr.as_ptr().write(value);
            &mut *ptr.as_ptr()
        }
    }

    /// Allocates `T::default()` in the arena
    #[must_use = "allocated memory must be used"]
    pub fn alloc_default<T: Default>(&self) -> &mut T {
        self.alloc_value(T::default())
    }

    /// Copies a slice into the arena
    #[must_use = "allocated memory must be used"]
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> &mut [T] {
        let ptr = alloc_array::<T>(self, src.len());

        // SAFETY: Copying slice to allocated memory.
        // - ptr has room for src.len() elements of T
        // - source and destination cannot overlap (fresh allocation)
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), ptr.as_ptr(), src.len());
            std::slice::from_raw_parts_mut(ptr.as_ptr(), src.len())
        }
    }

    /// Clones a slice into the arena
    #[must_use = "allocated memory must be used"]
    pub fn alloc_slice_clone<T: Clone>(&self, src: &[T]) -> &mut [T] {
        self.alloc_slice_fill_with(src.len(), |i| src[i].clone())
    }

    /// Makes a slice of `len` elements, element `i` produced by `f(i)`
    #[must_use = "allocated memory must be used"]
    pub fn alloc_slice_fill_with<T>(&self, len: usize, mut f: impl FnMut(usize) -> T) -> &mut [T] {
        let ptr = alloc_array::<T>(self, len);

        for i in 0..len {
            // SAFETY: i < len, slot is uninitialized and in bounds.
            // A panicking `f` leaves earlier elements unreachable, which only
            // leaks them.
            unsafe { ptr.as_ptr().add(i).write(f(i)) };
        }

        // SAFETY: all len elements were initialized above.
        unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), len) }
    }

    /// Makes a slice of `len` default values
    #[must_use = "allocated memory must be used"]
    pub fn alloc_slice_default<T: Default>(&self, len: usize) -> &mut [T] {
        self.alloc_slice_fill_with(len, |_| T::default())
    }

    /// Copies a string into the arena
    #[must_use = "allocated memory must be used"]
    pub fn alloc_str(&self, s: &str) -> &mut str {
        let bytes = self.alloc_slice_copy(s.as_bytes());
        // SAFETY: bytes is an exact copy of valid UTF-8.
        unsafe { std::str::from_utf8_unchecked_mut(bytes) }
    }

    /// Whether `value` lives in this arena
    pub fn owns_value<T>(&self, value: &T) -> bool {
        mem::size_of::<T>() != 0 && self.owns(ptr::from_ref(value))
    }

    /// Whether the whole slice lives in this arena; empty slices never do
    pub fn owns_slice<T>(&self, slice: &[T]) -> bool {
        if slice.is_empty() || mem::size_of::<T>() == 0 {
            return false;
        }
        let first = slice.as_ptr();
        // SAFETY: slice is non-empty, so the last element is in bounds.
        let last = unsafe { first.add(slice.len() - 1) };
        self.owns(first) && self.owns(last)
    }

    /// Whether the string's bytes live in this arena; empty strings never do
    pub fn owns_str(&self, s: &str) -> bool {
        self.owns_slice(s.as_bytes())
    }
}
