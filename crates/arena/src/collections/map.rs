//! Arena-backed hash map with separate chaining
//!
//! # Safety
//!
//! Both the bucket array (an [`ArenaVec`] of head links) and every entry
//! live in arena memory:
//! - Entries are singly linked `(hash, key, value, next)` nodes
//! - One `parking_lot::RwLock` guards the whole table
//! - Removed entries are dropped in place and retired through
//!   [`Arena::remove`]
//!
//! ## Invariants
//!
//! - The bucket count is a power of two and `mask == buckets - 1`
//! - Every live entry is reachable from exactly one bucket, the one at
//!   `hash & mask`
//! - `count` equals the number of reachable entries; growth re-checks this
//!   and panics if a rehash lost anything
//! - Insertion grows the table first whenever `count > 3/4 * buckets`

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash, RandomState};
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;

use parking_lot::{RwLock, RwLockReadGuard};

use super::vec::ArenaVec;
use crate::arena::Arena;

#[cfg(feature = "logging")]
use tracing::debug;

/// Bucket count of a fresh map
pub const INITIAL_BUCKETS: usize = 16;

struct Entry<K, V> {
    hash: u64,
    key: K,
    value: V,
    next: Link<K, V>,
}

type Link<K, V> = Option<NonNull<Entry<K, V>>>;

struct Table<'a, K, V> {
    buckets: ArenaVec<'a, Link<K, V>>,
    count: usize,
    mask: usize,
}

impl<'a, K, V> Table<'a, K, V> {
    fn new(buckets: usize, arena: &'a Arena) -> Self {
        debug_assert!(buckets.is_power_of_two());
        let mut heads = ArenaVec::with_capacity_in(buckets, arena);
        heads.resize(buckets, None);
        Self {
            buckets: heads,
            count: 0,
            mask: buckets - 1,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket(&self, hash: u64) -> usize {
        let idx = hash as usize & self.mask;
        assert!(
            idx < self.buckets.len(),
            "bucket index {idx} outside bucket array of {}",
            self.buckets.len()
        );
        idx
    }

    fn find<Q>(&self, hash: u64, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut cur = self.buckets[self.bucket(hash)];
        while let Some(node) = cur {
            // SAFETY: linked entries stay valid while the table holds them.
            let entry = unsafe { node.as_ref() };
            if entry.hash == hash && Borrow::<Q>::borrow(&entry.key) == key {
                return Some(node);
            }
            cur = entry.next;
        }
        None
    }

    /// Doubles the bucket array and relinks every entry
    fn grow(&mut self, arena: &'a Arena) {
        let new_cap = self.capacity() * 2;
        let mut fresh = Self::new(new_cap, arena);
        let mut moved = 0;

        for head in self.buckets.iter() {
            let mut cur = *head;
            while let Some(node) = cur {
                // SAFETY: each entry is visited once and relinked into the
                // new array before the old array is dropped.
                let entry = unsafe { &mut *node.as_ptr() };
                cur = entry.next;
                let idx = fresh.bucket(entry.hash);
                entry.next = fresh.buckets[idx];
                fresh.buckets[idx] = Some(node);
                moved += 1;
            }
        }

        assert_eq!(
            moved, self.count,
            "hash map rehash lost entries: relinked {moved} of {}",
            self.count
        );

        #[cfg(feature = "logging")]
        debug!(
            from = self.capacity(),
            to = new_cap,
            entries = moved,
            "hash map grew"
        );

        fresh.count = moved;
        *self = fresh;
    }

    /// Drops every entry and empties all buckets
    fn drop_entries(&mut self, arena: &Arena) {
        for head in self.buckets.iter_mut() {
            let mut cur = head.take();
            while let Some(node) = cur {
                // SAFETY: the chain is detached; each entry is dropped once
                // and never reached again.
                unsafe {
                    cur = (*node.as_ptr()).next;
                    ptr::drop_in_place(node.as_ptr());
                    arena.remove(node.cast());
                }
            }
        }
        self.count = 0;
    }

    fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            cur: None,
            remaining: self.count,
            _marker: PhantomData,
        }
    }
}

/// Hash map whose buckets and entries live in an [`Arena`]
///
/// Every method takes `&self`; a read-write lock serializes writers against
/// readers. Iteration order is unspecified.
///
/// # Examples
///
/// ```
/// use nebula_arena::{Arena, ArenaMap};
///
/// let arena = Arena::bump(1);
/// let map = ArenaMap::new_in(&arena);
/// map.insert("a", 1);
/// map.insert("b", 2);
/// map.remove("a");
///
/// assert_eq!(map.get("a"), None);
/// assert_eq!(map.get("b"), Some(2));
/// assert_eq!(map.len(), 1);
/// ```
pub struct ArenaMap<'a, K, V, S = RandomState> {
    table: RwLock<Table<'a, K, V>>,
    hasher: S,
    arena: &'a Arena,
}

impl<'a, K, V> ArenaMap<'a, K, V, RandomState> {
    /// Creates a map with 16 buckets and a fresh random seed
    pub fn new_in(arena: &'a Arena) -> Self {
        Self::with_hasher_in(RandomState::new(), arena)
    }
}

impl<'a, K, V, S> ArenaMap<'a, K, V, S> {
    /// Creates a map using `hasher` for bucket selection
    pub fn with_hasher_in(hasher: S, arena: &'a Arena) -> Self {
        Self {
            table: RwLock::new(Table::new(INITIAL_BUCKETS, arena)),
            hasher,
            arena,
        }
    }

    pub fn len(&self) -> usize {
        self.table.read().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current bucket count
    pub fn capacity(&self) -> usize {
        self.table.read().capacity()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// Drops every entry, keeping the bucket array
    pub fn clear(&self) {
        self.table.write().drop_entries(self.arena);
    }

    /// Visits entries until `f` returns false
    pub fn for_each_while<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let table = self.table.read();
        for (k, v) in table.iter() {
            if !f(k, v) {
                break;
            }
        }
    }

    /// Locks the map for reading and returns a guard for iteration
    pub fn read(&self) -> MapReadGuard<'_, 'a, K, V> {
        MapReadGuard {
            table: self.table.read(),
        }
    }

    /// Heap copy of all keys
    pub fn keys_vec(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.read().keys().cloned().collect()
    }

    /// Heap copy of all values
    pub fn values_vec(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.read().values().cloned().collect()
    }
}

impl<'a, K, V, S> ArenaMap<'a, K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts or updates; returns the previous value for `key`
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let hash = self.hasher.hash_one(&key);
        let mut table = self.table.write();

        if table.count > table.capacity() * 3 / 4 {
            table.grow(self.arena);
        }

        if let Some(node) = table.find(hash, &key) {
            // SAFETY: the write lock gives exclusive access to the entry.
            let entry = unsafe { &mut *node.as_ptr() };
            return Some(mem::replace(&mut entry.value, value));
        }

        let idx = table.bucket(hash);
        let node = NonNull::from(self.arena.alloc_value(Entry {
            hash,
            key,
            value,
            next: table.buckets[idx],
        }));
        table.buckets[idx] = Some(node);
        table.count += 1;
        None
    }

    /// Clone of the value for `key`
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    /// Applies `f` to the value for `key` under the read lock
    pub fn get_with<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> R,
    {
        let hash = self.hasher.hash_one(key);
        let table = self.table.read();
        let node = table.find(hash, key)?;
        // SAFETY: the read lock keeps the entry alive and unaliased by writers.
        Some(f(unsafe { &node.as_ref().value }))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);
        self.table.read().find(hash, key).is_some()
    }

    /// Removes `key`, returning its value; absent keys are a no-op
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);
        let mut guard = self.table.write();
        let table = &mut *guard;
        let idx = table.bucket(hash);
        let mut link: *mut Link<K, V> = &mut table.buckets[idx];

        // SAFETY: Unlinking under the write lock.
        // - link always points at a live head slot or a live entry's next
        // - the matched entry is detached before it is read out, so it is
        //   dropped exactly once
        unsafe {
            while let Some(node) = *link {
                let entry = node.as_ptr();
                if (*entry).hash == hash && Borrow::<Q>::borrow(&(*entry).key) == key {
                    *link = (*entry).next;
                    table.count -= 1;
                    let Entry { value, .. } = ptr::read(entry);
                    self.arena.remove(node.cast());
                    return Some(value);
                }
                link = &raw mut (*entry).next;
            }
        }
        None
    }

    /// Heap copy of the whole map
    pub fn to_hash_map(&self) -> HashMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let table = self.table.read();
        let mut out = HashMap::with_capacity(table.count);
        for (k, v) in table.iter() {
            out.insert(k.clone(), v.clone());
        }
        out
    }
}

impl<K, V, S> Drop for ArenaMap<'_, K, V, S> {
    fn drop(&mut self) {
        self.table.get_mut().drop_entries(self.arena);
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for ArenaMap<'_, K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.read().iter()).finish()
    }
}

// SAFETY: ArenaMap owns its keys and values.
// - Entries are only reachable through this map
// - &Arena is Send because Arena is Sync
unsafe impl<K: Send, V: Send, S: Send> Send for ArenaMap<'_, K, V, S> {}

// SAFETY: Shared access is mediated by the RwLock.
// - Writers move K/V in and out through &self, hence Send
// - Readers hand out &K/&V to several threads, hence Sync
unsafe impl<K: Send + Sync, V: Send + Sync, S: Sync> Sync for ArenaMap<'_, K, V, S> {}

/// Read-locked view of an [`ArenaMap`]
pub struct MapReadGuard<'g, 'a, K, V> {
    table: RwLockReadGuard<'g, Table<'a, K, V>>,
}

impl<K, V> MapReadGuard<'_, '_, K, V> {
    pub fn len(&self) -> usize {
        self.table.count
    }

    pub fn is_empty(&self) -> bool {
        self.table.count == 0
    }

    /// All entries in unspecified order
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.table.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<'r, K, V> IntoIterator for &'r MapReadGuard<'_, '_, K, V> {
    type Item = (&'r K, &'r V);
    type IntoIter = Iter<'r, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a read-locked map
pub struct Iter<'t, K, V> {
    buckets: slice::Iter<'t, Link<K, V>>,
    cur: Link<K, V>,
    remaining: usize,
    _marker: PhantomData<&'t (K, V)>,
}

impl<'t, K, V> Iterator for Iter<'t, K, V> {
    type Item = (&'t K, &'t V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.cur {
                // SAFETY: the read guard behind 't keeps entries alive.
                let entry = unsafe { &*node.as_ptr() };
                self.cur = entry.next;
                self.remaining -= 1;
                return Some((&entry.key, &entry.value));
            }
            self.cur = *self.buckets.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
