//! Arena-backed growable vector
//!
//! # Safety
//!
//! [`ArenaVec`] manages a raw span of arena memory:
//! - Elements `[0, len)` are initialized, `[len, cap)` are not
//! - Growth allocates a fresh span, moves the elements bitwise and retires
//!   the old span through [`Arena::remove`]
//! - The span is never freed individually; the arena reclaims it on reset
//!
//! ## Invariants
//!
//! - `len <= cap`
//! - `cap == 0` means no span was allocated and `ptr` is dangling
//! - Zero-sized `T` never allocates and reports `cap == usize::MAX`
//!
//! ## Growth policy
//!
//! The first span holds 16 elements when that is enough, otherwise
//! `max(needed, 64)`. Later spans hold `max(2 * cap, needed)`. Under the
//! bump strategy retired spans stay unreclaimed until the arena resets.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use crate::arena::{Arena, alloc_array};

/// Capacity of the first span for small vectors
pub const SSO_CAPACITY: usize = 16;

/// Smallest first span once a vector starts out larger than [`SSO_CAPACITY`]
pub const MIN_LARGE_CAPACITY: usize = 64;

#[inline]
fn next_capacity(cap: usize, needed: usize) -> usize {
    if cap == 0 {
        if needed <= SSO_CAPACITY {
            SSO_CAPACITY
        } else {
            needed.max(MIN_LARGE_CAPACITY)
        }
    } else {
        cap.saturating_mul(2).max(needed)
    }
}

/// A growable sequence stored in arena memory
///
/// No internal synchronization: share it across threads the same way as a
/// `Vec<T>`.
///
/// # Examples
///
/// ```
/// use nebula_arena::{Arena, ArenaVec};
///
/// let arena = Arena::bump(1);
/// let mut v = ArenaVec::new_in(&arena);
/// v.extend_from_slice(&[3, 1, 2]);
/// v.sort();
/// assert_eq!(v, [1, 2, 3]);
/// assert_eq!(v.index_of(&2), Some(1));
/// ```
pub struct ArenaVec<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
    arena: &'a Arena,
    _marker: PhantomData<T>,
}

impl<'a, T> ArenaVec<'a, T> {
    const IS_ZST: bool = mem::size_of::<T>() == 0;

    /// Creates a vector with the small-size capacity already reserved
    pub fn new_in(arena: &'a Arena) -> Self {
        Self::with_capacity_in(SSO_CAPACITY, arena)
    }

    /// Creates a vector that allocates nothing until the first push
    pub const fn empty_in(arena: &'a Arena) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            cap: if Self::IS_ZST { usize::MAX } else { 0 },
            arena,
            _marker: PhantomData,
        }
    }

    /// Creates a vector able to hold at least `capacity` elements
    pub fn with_capacity_in(capacity: usize, arena: &'a Arena) -> Self {
        let mut vec = Self::empty_in(arena);
        if capacity > 0 {
            vec.grow_to(capacity);
        }
        vec
    }

    /// Clones `src` into a new arena vector
    pub fn from_slice_in(src: &[T], arena: &'a Arena) -> Self
    where
        T: Clone,
    {
        let mut vec = Self::with_capacity_in(src.len(), arena);
        vec.extend_from_slice(src);
        vec
    }

    /// Collects an iterator into a new arena vector
    pub fn from_iter_in<I: IntoIterator<Item = T>>(iter: I, arena: &'a Arena) -> Self {
        let mut vec = Self::empty_in(arena);
        vec.extend(iter);
        vec
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// The arena this vector allocates from
    #[inline]
    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: ptr is non-null and aligned; [0, len) is initialized.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and &mut self guarantees uniqueness.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Reallocates into a span of at least `needed` elements
    fn grow_to(&mut self, needed: usize) {
        if needed <= self.cap {
            return;
        }

        let new_cap = next_capacity(self.cap, needed);
        let new_ptr = alloc_array::<T>(self.arena, new_cap);

        // SAFETY: Moving elements to the new span.
        // - both spans hold at least len elements
        // - the new span is fresh, so they cannot overlap
        // - the old copies are never read again
        unsafe { ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.len) };

        if self.cap != 0 {
            // SAFETY: the old span came from this arena and is dead now.
            unsafe { self.arena.remove(self.ptr.cast()) };
        }

        self.ptr = new_ptr;
        self.cap = new_cap;
    }

    /// Ensures room for `additional` more elements
    pub fn reserve(&mut self, additional: usize) {
        let Some(needed) = self.len.checked_add(additional) else {
            panic!("capacity overflow");
        };
        self.grow_to(needed);
    }

    /// Appends one element
    pub fn push(&mut self, value: T) {
        if self.len == self.cap {
            self.reserve(1);
        }
        // SAFETY: len < cap after reserve; slot is uninitialized.
        unsafe { self.ptr.as_ptr().add(self.len).write(value) };
        self.len += 1;
    }

    /// Appends every item, reserving once from the iterator's size hint
    pub fn append<I: IntoIterator<Item = T>>(&mut self, values: I) {
        self.extend(values);
    }

    /// Appends clones of all elements of `src` with a single capacity check
    pub fn extend_from_slice(&mut self, src: &[T])
    where
        T: Clone,
    {
        self.reserve(src.len());
        for item in src {
            // SAFETY: capacity reserved above; len is bumped per element so
            // a panicking clone leaves the vector consistent.
            unsafe { self.ptr.as_ptr().add(self.len).write(item.clone()) };
            self.len += 1;
        }
    }

    /// Removes and returns the last element
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot len was initialized and is now outside [0, len).
        Some(unsafe { self.ptr.as_ptr().add(self.len).read() })
    }

    /// Replaces the element at `index`; false when out of bounds
    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self.as_mut_slice().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Inserts at `index`, shifting later elements right; false when
    /// `index > len`
    pub fn insert(&mut self, index: usize, value: T) -> bool {
        if index > self.len {
            return false;
        }
        if self.len == self.cap {
            self.reserve(1);
        }

        // SAFETY: Shifting the tail one slot right.
        // - index <= len < cap, so both ranges stay within capacity
        // - ptr::copy handles the overlap
        unsafe {
            let at = self.ptr.as_ptr().add(index);
            ptr::copy(at, at.add(1), self.len - index);
            at.write(value);
        }
        self.len += 1;
        true
    }

    /// Removes the element at `index`, shifting later elements left
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }

        // SAFETY: index < len; the hole is filled by the shifted tail.
        unsafe {
            let at = self.ptr.as_ptr().add(index);
            let value = at.read();
            ptr::copy(at.add(1), at, self.len - index - 1);
            self.len -= 1;
            Some(value)
        }
    }

    /// Removes elements matching `pred`, scanning from the back.
    ///
    /// `pred` receives each element's index and a reference to it. Stops
    /// after `limit` removals when a limit is given. Returns how many
    /// elements were removed.
    pub fn remove_by<F>(&mut self, limit: Option<usize>, mut pred: F) -> usize
    where
        F: FnMut(usize, &T) -> bool,
    {
        let limit = limit.unwrap_or(usize::MAX);
        let mut removed = 0;
        let mut i = self.len;

        while i > 0 && removed < limit {
            i -= 1;
            if pred(i, &self.as_slice()[i]) {
                drop(self.remove(i));
                removed += 1;
            }
        }
        removed
    }

    /// Shortens the vector to `len`; false when `len` exceeds the length
    pub fn truncate(&mut self, len: usize) -> bool {
        if len > self.len {
            return false;
        }

        let tail = ptr::slice_from_raw_parts_mut(
            // SAFETY: len <= self.len, in bounds.
            unsafe { self.ptr.as_ptr().add(len) },
            self.len - len,
        );
        // Shrink first so a panicking destructor cannot cause a double drop.
        self.len = len;
        // SAFETY: the tail was initialized and is no longer reachable.
        unsafe { ptr::drop_in_place(tail) };
        true
    }

    /// Drops every element, keeping the capacity
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resizes in place, filling new slots with clones of `value`
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return;
        }

        self.reserve(new_len - self.len);
        while self.len + 1 < new_len {
            self.push(value.clone());
        }
        self.push(value);
    }

    /// Resizes in place, filling new slots with `T::default()`
    pub fn resize_default(&mut self, new_len: usize)
    where
        T: Default,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return;
        }

        self.reserve(new_len - self.len);
        while self.len < new_len {
            self.push(T::default());
        }
    }

    /// Position of the first element equal to `value`
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.iter().position(|item| item == value)
    }

    /// Position of the last element equal to `value`
    pub fn last_index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.iter().rposition(|item| item == value)
    }

    /// Unstable sort driven by a strict "less than" predicate
    pub fn sort_with<F>(&mut self, mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        self.sort_unstable_by(|a, b| ordering_from_less(&mut less, a, b));
    }

    /// Stable sort driven by a strict "less than" predicate
    pub fn sort_stable_with<F>(&mut self, mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        self.sort_by(|a, b| ordering_from_less(&mut less, a, b));
    }

    /// Clones the contents into another arena
    pub fn clone_in<'b>(&self, arena: &'b Arena) -> ArenaVec<'b, T>
    where
        T: Clone,
    {
        ArenaVec::from_slice_in(self.as_slice(), arena)
    }

    /// Moves the elements to the heap so they can outlive the arena
    pub fn into_heap(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        // SAFETY: Moving len initialized elements to the heap vector.
        // - out has room for len elements
        // - self.len is zeroed so our Drop will not drop them again
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), out.as_mut_ptr(), self.len);
            out.set_len(self.len);
        }
        self.len = 0;
        out
    }
}

fn ordering_from_less<T, F>(less: &mut F, a: &T, b: &T) -> Ordering
where
    F: FnMut(&T, &T) -> bool,
{
    if less(a, b) {
        Ordering::Less
    } else if less(b, a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

impl<T> Drop for ArenaVec<'_, T> {
    fn drop(&mut self) {
        // SAFETY: [0, len) is initialized and dropped exactly once.
        unsafe { ptr::drop_in_place(self.as_mut_slice()) };
        if self.cap != 0 && !Self::IS_ZST {
            // SAFETY: the span came from this arena and dies with self.
            unsafe { self.arena.remove(self.ptr.cast()) };
        }
    }
}

impl<T> Deref for ArenaVec<'_, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for ArenaVec<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> AsRef<[T]> for ArenaVec<'_, T> {
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T> AsMut<[T]> for ArenaVec<'_, T> {
    fn as_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T: Clone> Clone for ArenaVec<'_, T> {
    fn clone(&self) -> Self {
        self.clone_in(self.arena)
    }
}

impl<T> Extend<T> for ArenaVec<'_, T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for item in iter {
            self.push(item);
        }
    }
}

impl<'v, T: Copy + 'v> Extend<&'v T> for ArenaVec<'_, T> {
    fn extend<I: IntoIterator<Item = &'v T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T: fmt::Debug> fmt::Debug for ArenaVec<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq<U>, U> PartialEq<ArenaVec<'_, U>> for ArenaVec<'_, T> {
    fn eq(&self, other: &ArenaVec<'_, U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for ArenaVec<'_, T> {}

impl<T: PartialEq<U>, U> PartialEq<[U]> for ArenaVec<'_, T> {
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq<U>, U, const N: usize> PartialEq<[U; N]> for ArenaVec<'_, T> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Hash> Hash for ArenaVec<'_, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<'v, T> IntoIterator for &'v ArenaVec<'_, T> {
    type Item = &'v T;
    type IntoIter = slice::Iter<'v, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'v, T> IntoIterator for &'v mut ArenaVec<'_, T> {
    type Item = &'v mut T;
    type IntoIter = slice::IterMut<'v, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<'a, T> IntoIterator for ArenaVec<'a, T> {
    type Item = T;
    type IntoIter = IntoIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        let this = mem::ManuallyDrop::new(self);
        IntoIter {
            ptr: this.ptr,
            cap: this.cap,
            front: 0,
            back: this.len,
            arena: this.arena,
            _marker: PhantomData,
        }
    }
}

// SAFETY: ArenaVec owns its elements like Vec<T> does.
// - The span is exclusively owned by this vector
// - &Arena is Send because Arena is Sync
unsafe impl<T: Send> Send for ArenaVec<'_, T> {}

// SAFETY: &ArenaVec only hands out &T.
unsafe impl<T: Sync> Sync for ArenaVec<'_, T> {}

/// Owning iterator over an [`ArenaVec`]
pub struct IntoIter<'a, T> {
    ptr: NonNull<T>,
    cap: usize,
    front: usize,
    back: usize,
    arena: &'a Arena,
    _marker: PhantomData<T>,
}

impl<T> Iterator for IntoIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        // SAFETY: front < back, slot is initialized and read once.
        let value = unsafe { self.ptr.as_ptr().add(self.front).read() };
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<T> DoubleEndedIterator for IntoIter<'_, T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: back >= front, slot is initialized and read once.
        Some(unsafe { self.ptr.as_ptr().add(self.back).read() })
    }
}

impl<T> ExactSizeIterator for IntoIter<'_, T> {}

impl<T> FusedIterator for IntoIter<'_, T> {}

impl<T> Drop for IntoIter<'_, T> {
    fn drop(&mut self) {
        // SAFETY: [front, back) are the elements not yet yielded.
        unsafe {
            let rest = ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr().add(self.front),
                self.back - self.front,
            );
            ptr::drop_in_place(rest);
        }
        if self.cap != 0 && mem::size_of::<T>() != 0 {
            // SAFETY: the span came from this arena and dies with the iterator.
            unsafe { self.arena.remove(self.ptr.cast()) };
        }
    }
}

// SAFETY: same ownership model as ArenaVec.
unsafe impl<T: Send> Send for IntoIter<'_, T> {}

// SAFETY: &IntoIter exposes nothing but its length.
unsafe impl<T: Sync> Sync for IntoIter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArenaConfig, Backing};
    use std::rc::Rc;

    fn arena() -> Arena {
        Arena::with_config(
            ArenaConfig::new()
                .with_page_size(4096)
                .with_backing(Backing::Heap),
        )
        .unwrap()
    }

    #[test]
    fn test_basic_operations() {
        let arena = arena();
        let mut v = ArenaVec::new_in(&arena);
        assert!(v.is_empty());
        assert_eq!(v.capacity(), SSO_CAPACITY);

        v.push(1);
        v.push(2);
        v.push(3);
        assert_eq!(v.len(), 3);
        assert_eq!(v.get(1), Some(&2));
        assert_eq!(v.get(3), None);
        assert_eq!(v.pop(), Some(3));
        assert_eq!(v, [1, 2]);
    }

    #[test]
    fn test_growth_policy() {
        let arena = arena();

        let mut small = ArenaVec::empty_in(&arena);
        assert_eq!(small.capacity(), 0);
        small.push(0u32);
        assert_eq!(small.capacity(), 16);
        for i in 1..17 {
            small.push(i);
        }
        assert_eq!(small.capacity(), 32);

        let mut large = ArenaVec::<u32>::empty_in(&arena);
        large.extend_from_slice(&[0; 20]);
        assert_eq!(large.capacity(), 64);

        let mut huge = ArenaVec::<u32>::empty_in(&arena);
        huge.extend_from_slice(&[0; 100]);
        assert_eq!(huge.capacity(), 100);
        huge.extend_from_slice(&[0; 300]);
        assert_eq!(huge.capacity(), 400);
    }

    #[test]
    fn test_growth_retires_old_span() {
        let arena = arena();
        let mut v = ArenaVec::new_in(&arena);
        let before = arena.stats().removals;
        for i in 0..17 {
            v.push(i);
        }
        assert_eq!(arena.stats().removals, before + 1);
        assert!(arena.owns(v.as_ptr()));
    }

    #[test]
    fn test_set_insert_remove() {
        let arena = arena();
        let mut v = ArenaVec::from_slice_in(&[1, 2, 4], &arena);

        assert!(v.set(0, 10));
        assert!(!v.set(3, 99));
        assert!(v.insert(2, 3));
        assert!(v.insert(4, 5));
        assert!(!v.insert(9, 0));
        assert_eq!(v, [10, 2, 3, 4, 5]);

        assert_eq!(v.remove(0), Some(10));
        assert_eq!(v.remove(10), None);
        assert_eq!(v, [2, 3, 4, 5]);
    }

    #[test]
    fn test_remove_by() {
        let arena = arena();
        let mut v = ArenaVec::from_slice_in(&[1, 2, 3, 4, 5, 6], &arena);

        let removed = v.remove_by(Some(2), |_, x| x % 2 == 0);
        assert_eq!(removed, 2);
        assert_eq!(v, [1, 2, 3, 5]);

        let removed = v.remove_by(None, |_, x| *x > 1);
        assert_eq!(removed, 3);
        assert_eq!(v, [1]);
    }

    #[test]
    fn test_remove_by_index() {
        let arena = arena();
        let mut v = ArenaVec::from_slice_in(&["a", "b", "c", "d", "e", "f"], &arena);

        let mut seen = Vec::new();
        let removed = v.remove_by(None, |i, _| {
            seen.push(i);
            i % 2 == 1
        });
        assert_eq!(removed, 3);
        assert_eq!(seen, [5, 4, 3, 2, 1, 0]);
        assert_eq!(v, ["a", "c", "e"]);

        assert_eq!(v.remove_by(Some(1), |i, s| i > 0 && *s != "x"), 1);
        assert_eq!(v, ["a", "c"]);
    }

    #[test]
    fn test_truncate_and_clear_keep_capacity() {
        let arena = arena();
        let mut v = ArenaVec::from_slice_in(&[1, 2, 3], &arena);
        let original = v.clone();

        v.extend_from_slice(&[4, 5, 6]);
        assert!(v.truncate(3));
        assert_eq!(v, original);
        assert!(!v.truncate(10));

        let cap = v.capacity();
        v.clear();
        assert!(v.is_empty());
        assert_eq!(v.capacity(), cap);
    }

    #[test]
    fn test_resize() {
        let arena = arena();
        let mut v = ArenaVec::from_slice_in(&[7u8], &arena);
        v.resize_default(4);
        assert_eq!(v, [7, 0, 0, 0]);
        v.resize(6, 9);
        assert_eq!(v, [7, 0, 0, 0, 9, 9]);
        v.resize(2, 1);
        assert_eq!(v, [7, 0]);
    }

    #[test]
    fn test_search_and_sort() {
        let arena = arena();
        let mut v = ArenaVec::from_slice_in(&["b", "a", "c", "a"], &arena);

        assert!(v.contains(&"c"));
        assert_eq!(v.index_of(&"a"), Some(1));
        assert_eq!(v.last_index_of(&"a"), Some(3));
        assert_eq!(v.index_of(&"z"), None);

        v.sort_with(|a, b| a < b);
        assert_eq!(v, ["a", "a", "b", "c"]);
        v.reverse();
        assert_eq!(v, ["c", "b", "a", "a"]);
    }

    #[test]
    fn test_stable_sort_keeps_order_of_equals() {
        let arena = arena();
        let mut v = ArenaVec::from_slice_in(&[(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')], &arena);
        v.sort_stable_with(|x, y| x.0 < y.0);
        assert_eq!(v, [(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
    }

    #[test]
    fn test_iteration() {
        let arena = arena();
        let mut v = ArenaVec::from_iter_in(0..5, &arena);

        for x in &mut v {
            *x *= 10;
        }
        let collected: Vec<_> = v.iter().copied().collect();
        assert_eq!(collected, [0, 10, 20, 30, 40]);

        let first_big = v.iter().find(|&&x| x > 15);
        assert_eq!(first_big, Some(&20));

        let mut it = v.into_iter();
        assert_eq!(it.next(), Some(0));
        assert_eq!(it.next_back(), Some(40));
        assert_eq!(it.len(), 3);
    }

    #[test]
    fn test_drops_elements() {
        let arena = arena();
        let marker = Rc::new(());
        {
            let mut v = ArenaVec::new_in(&arena);
            for _ in 0..40 {
                v.push(Rc::clone(&marker));
            }
            assert_eq!(Rc::strong_count(&marker), 41);
            v.truncate(10);
            assert_eq!(Rc::strong_count(&marker), 11);

            let mut it = v.into_iter();
            drop(it.next());
        }
        assert_eq!(Rc::strong_count(&marker), 1);
    }

    #[test]
    fn test_clone_to_heap_and_arena() {
        let arena = arena();
        let other = Arena::bump(1);
        let v = ArenaVec::from_slice_in(&[String::from("x"), String::from("y")], &arena);

        let copy = v.clone_in(&other);
        assert!(other.owns(copy.as_ptr()));
        assert_eq!(copy, v);

        let heap = v.into_heap();
        assert_eq!(heap, ["x", "y"]);
    }

    #[test]
    fn test_zero_sized_elements() {
        let arena = arena();
        let used = arena.stats().used_bytes;
        let mut v = ArenaVec::new_in(&arena);
        for _ in 0..1000 {
            v.push(());
        }
        assert_eq!(v.len(), 1000);
        assert_eq!(v.capacity(), usize::MAX);
        assert_eq!(arena.stats().used_bytes, used);
    }
}
