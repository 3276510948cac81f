//! Arena-backed skip list
//!
//! An ordered map balanced by coin flips: a node reaches level `n` with
//! probability `0.5^n`, capped at [`MAX_LEVEL`].
//!
//! # Safety
//!
//! Nodes and their forward arrays are allocated from the arena:
//! - The head sentinel is a bare forward array of `MAX_LEVEL + 1` links
//! - A node of level `l` owns a forward array of `l + 1` links
//! - Traversal keeps a pointer to the predecessor's forward array, so the
//!   head and real nodes are handled the same way
//! - One `parking_lot::RwLock` guards the whole structure
//!
//! ## Invariants
//!
//! - At every level the forward chain visits strictly increasing keys
//! - Level 0 links every node, so it is the fully sorted sequence
//! - `level` is the highest non-empty level (0 when empty) and never
//!   exceeds `MAX_LEVEL`; removal lowers it while the top level is empty

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use parking_lot::{RwLock, RwLockReadGuard};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::arena::Arena;

/// Highest level a node can reach
pub const MAX_LEVEL: usize = 16;

/// Probability of promoting a node one more level
const PROMOTE_P: f64 = 0.5;

type Link<K, V> = Option<NonNull<Node<K, V>>>;

/// Pointer to a forward array (the head's or a node's)
type Forward<K, V> = NonNull<Link<K, V>>;

struct Node<K, V> {
    key: K,
    value: V,
    level: usize,
    forward: Forward<K, V>,
}

/// Reads link `i` of a forward array
///
/// # Safety
///
/// `fwd` must point to a live forward array longer than `i`.
#[inline]
unsafe fn link<K, V>(fwd: Forward<K, V>, i: usize) -> Link<K, V> {
    unsafe { *fwd.as_ptr().add(i) }
}

/// Writes link `i` of a forward array
///
/// # Safety
///
/// As for [`link`], plus exclusive access to the array.
#[inline]
unsafe fn set_link<K, V>(fwd: Forward<K, V>, i: usize, to: Link<K, V>) {
    unsafe { *fwd.as_ptr().add(i) = to };
}

fn alloc_forward<K, V>(arena: &Arena, len: usize) -> Forward<K, V> {
    let links = arena.alloc_slice_fill_with(len, |_| None::<NonNull<Node<K, V>>>);
    NonNull::from(links).cast()
}

struct Inner<K, V> {
    head: Forward<K, V>,
    level: usize,
    len: usize,
    rng: SmallRng,
}

impl<K, V> Inner<K, V> {
    fn random_level(&mut self) -> usize {
        let mut level = 0;
        while level < MAX_LEVEL && self.rng.random_bool(PROMOTE_P) {
            level += 1;
        }
        level
    }

    /// Fills `update` with the predecessor at each level and returns the
    /// level-0 successor, the first node whose key is not less than `key`.
    fn find<Q>(&self, key: &Q, update: &mut [Forward<K, V>; MAX_LEVEL + 1]) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut x = self.head;
        for i in (0..=self.level).rev() {
            // SAFETY: x is the head or a node reached at level >= i, so its
            // forward array has more than i links; nodes stay live under
            // the lock held by the caller.
            unsafe {
                while let Some(next) = link(x, i) {
                    let node = next.as_ref();
                    if Borrow::<Q>::borrow(&node.key) < key {
                        x = node.forward;
                    } else {
                        break;
                    }
                }
            }
            update[i] = x;
        }
        // SAFETY: every forward array has a level-0 link.
        unsafe { link(x, 0) }
    }

    fn lookup<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut update = [self.head; MAX_LEVEL + 1];
        let candidate = self.find(key, &mut update)?;
        // SAFETY: candidate is a live node.
        let node = unsafe { candidate.as_ref() };
        (Borrow::<Q>::borrow(&node.key) == key).then_some(candidate)
    }

    fn first(&self) -> Link<K, V> {
        // SAFETY: the head array has MAX_LEVEL + 1 links.
        unsafe { link(self.head, 0) }
    }

    fn last(&self) -> Link<K, V> {
        let mut x = self.head;
        let mut last = None;
        for i in (0..=self.level).rev() {
            // SAFETY: same reasoning as in find.
            unsafe {
                while let Some(next) = link(x, i) {
                    last = Some(next);
                    x = next.as_ref().forward;
                }
            }
        }
        last
    }

    /// Drops every node and empties the head
    fn drop_nodes(&mut self, arena: &Arena) {
        let mut cur = self.first();
        while let Some(node) = cur {
            // SAFETY: each node is visited once along level 0, read out and
            // never reached again because the head is cleared below.
            unsafe {
                cur = link(node.as_ref().forward, 0);
                let Node { forward, .. } = ptr::read(node.as_ptr());
                arena.remove(forward.cast());
                arena.remove(node.cast());
            }
        }
        for i in 0..=MAX_LEVEL {
            // SAFETY: the head array has MAX_LEVEL + 1 links.
            unsafe { set_link(self.head, i, None) };
        }
        self.level = 0;
        self.len = 0;
    }

    fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            cur: self.first(),
            remaining: self.len,
            _marker: PhantomData,
        }
    }
}

/// Ordered map over arena-allocated nodes
///
/// Reads (`get`, `for_each_while`, iteration through [`ArenaSkipList::read`])
/// share a read lock; `insert`, `remove` and `clear` take the write lock.
///
/// # Examples
///
/// ```
/// use nebula_arena::{Arena, ArenaSkipList};
///
/// let arena = Arena::bump(1);
/// let list = ArenaSkipList::new_in(&arena);
/// for k in [10, 5, 15, 3, 20] {
///     list.insert(k, k * 100);
/// }
/// assert_eq!(list.min(), Some((3, 300)));
/// assert_eq!(list.max(), Some((20, 2000)));
/// assert_eq!(list.read().keys().copied().collect::<Vec<_>>(), [3, 5, 10, 15, 20]);
/// ```
pub struct ArenaSkipList<'a, K, V> {
    inner: RwLock<Inner<K, V>>,
    arena: &'a Arena,
}

impl<'a, K, V> ArenaSkipList<'a, K, V> {
    /// Creates an empty list seeded from OS entropy
    pub fn new_in(arena: &'a Arena) -> Self {
        Self::with_rng_in(SmallRng::from_os_rng(), arena)
    }

    /// Creates an empty list with a deterministic level sequence
    pub fn with_seed_in(seed: u64, arena: &'a Arena) -> Self {
        Self::with_rng_in(SmallRng::seed_from_u64(seed), arena)
    }

    fn with_rng_in(rng: SmallRng, arena: &'a Arena) -> Self {
        Self {
            inner: RwLock::new(Inner {
                head: alloc_forward(arena, MAX_LEVEL + 1),
                level: 0,
                len: 0,
                rng,
            }),
            arena,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current height (highest non-empty level)
    pub fn level(&self) -> usize {
        self.inner.read().level
    }

    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// Drops every entry
    pub fn clear(&self) {
        self.inner.write().drop_nodes(self.arena);
    }

    /// Visits entries in ascending key order until `f` returns false
    pub fn for_each_while<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let inner = self.inner.read();
        for (k, v) in inner.iter() {
            if !f(k, v) {
                break;
            }
        }
    }

    /// Locks the list for reading and returns a guard for iteration
    pub fn read(&self) -> SkipListReadGuard<'_, K, V> {
        SkipListReadGuard {
            inner: self.inner.read(),
        }
    }

    /// Smallest entry
    pub fn min(&self) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.read().min().map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Largest entry
    pub fn max(&self) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.read().max().map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Heap copy of all entries in ascending order
    pub fn to_vec(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K: Ord, V> ArenaSkipList<'_, K, V> {
    /// Inserts or updates; returns the previous value for `key`
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let mut inner = self.inner.write();
        let mut update = [inner.head; MAX_LEVEL + 1];

        if let Some(candidate) = inner.find(&key, &mut update) {
            // SAFETY: the write lock gives exclusive access to the node.
            let node = unsafe { &mut *candidate.as_ptr() };
            if node.key == key {
                return Some(mem::replace(&mut node.value, value));
            }
        }

        let level = inner.random_level();
        if level > inner.level {
            for slot in &mut update[inner.level + 1..=level] {
                *slot = inner.head;
            }
            inner.level = level;
        }

        let forward = alloc_forward(self.arena, level + 1);
        let node = NonNull::from(self.arena.alloc_value(Node {
            key,
            value,
            level,
            forward,
        }));

        for (i, pred) in update.iter().enumerate().take(level + 1) {
            // SAFETY: Splicing at level i.
            // - pred is the head or a node of level >= i
            // - forward has level + 1 links
            // - the write lock excludes every reader
            unsafe {
                set_link(forward, i, link(*pred, i));
                set_link(*pred, i, Some(node));
            }
        }

        inner.len += 1;
        None
    }

    /// Clone of the value for `key`
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    /// Applies `f` to the value for `key` under the read lock
    pub fn get_with<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        F: FnOnce(&V) -> R,
    {
        let inner = self.inner.read();
        let node = inner.lookup(key)?;
        // SAFETY: the read lock keeps the node alive.
        Some(f(unsafe { &node.as_ref().value }))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.read().lookup(key).is_some()
    }

    /// Removes `key`, returning its value; absent keys are a no-op
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let mut update = [inner.head; MAX_LEVEL + 1];

        let candidate = inner.find(key, &mut update)?;
        // SAFETY: candidate is live under the write lock.
        let (level, forward) = unsafe {
            let node = candidate.as_ref();
            if Borrow::<Q>::borrow(&node.key) != key {
                return None;
            }
            (node.level, node.forward)
        };

        for (i, pred) in update.iter().enumerate().take(level + 1) {
            // SAFETY: level <= inner.level, so update[i] is the real
            // predecessor at level i; both arrays are long enough.
            unsafe {
                if link(*pred, i) == Some(candidate) {
                    set_link(*pred, i, link(forward, i));
                }
            }
        }

        // SAFETY: the head array has MAX_LEVEL + 1 links.
        while inner.level > 0 && unsafe { link(inner.head, inner.level) }.is_none() {
            inner.level -= 1;
        }
        inner.len -= 1;

        // SAFETY: the node is unlinked from every level and read out once.
        unsafe {
            let Node { value, .. } = ptr::read(candidate.as_ptr());
            self.arena.remove(forward.cast());
            self.arena.remove(candidate.cast());
            Some(value)
        }
    }

    /// Heap copy as an ordered map
    pub fn to_btree_map(&self) -> BTreeMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K, V> Drop for ArenaSkipList<'_, K, V> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        inner.drop_nodes(self.arena);
        // SAFETY: the head array came from this arena and nothing links to
        // it once the list is gone.
        unsafe { self.arena.remove(inner.head.cast()) };
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ArenaSkipList<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.read().iter()).finish()
    }
}

// SAFETY: the list owns its keys and values; &Arena is Send since Arena is
// Sync.
unsafe impl<K: Send, V: Send> Send for ArenaSkipList<'_, K, V> {}

// SAFETY: Shared access goes through the RwLock.
// - Writers move K/V in and out through &self, hence Send
// - Readers hand out &K/&V to several threads, hence Sync
unsafe impl<K: Send + Sync, V: Send + Sync> Sync for ArenaSkipList<'_, K, V> {}

/// Read-locked view of an [`ArenaSkipList`]
pub struct SkipListReadGuard<'g, K, V> {
    inner: RwLockReadGuard<'g, Inner<K, V>>,
}

impl<K, V> SkipListReadGuard<'_, K, V> {
    pub fn len(&self) -> usize {
        self.inner.len
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Entries in ascending key order
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.inner.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn min(&self) -> Option<(&K, &V)> {
        // SAFETY: the guard keeps the node alive for the borrow.
        self.inner.first().map(|n| unsafe {
            let node = n.as_ref();
            (&node.key, &node.value)
        })
    }

    pub fn max(&self) -> Option<(&K, &V)> {
        // SAFETY: as in min.
        self.inner.last().map(|n| unsafe {
            let node = n.as_ref();
            (&node.key, &node.value)
        })
    }
}

impl<'r, K, V> IntoIterator for &'r SkipListReadGuard<'_, K, V> {
    type Item = (&'r K, &'r V);
    type IntoIter = Iter<'r, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over a read-locked skip list
pub struct Iter<'t, K, V> {
    cur: Link<K, V>,
    remaining: usize,
    _marker: PhantomData<&'t (K, V)>,
}

impl<'t, K, V> Iterator for Iter<'t, K, V> {
    type Item = (&'t K, &'t V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cur?;
        // SAFETY: the read guard behind 't keeps nodes alive.
        let node = unsafe { &*node.as_ptr() };
        // SAFETY: every node has a level-0 link.
        self.cur = unsafe { link(node.forward, 0) };
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

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

    fn keys<K: Clone, V>(list: &ArenaSkipList<'_, K, V>) -> Vec<K> {
        list.read().keys().cloned().collect()
    }

    #[test]
    fn test_insert_and_search() {
        let arena = arena();
        let list = ArenaSkipList::new_in(&arena);
        for k in [30, 10, 20] {
            assert_eq!(list.insert(k, k.to_string()), None);
        }
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(&20), Some("20".to_string()));
        assert_eq!(list.get(&25), None);
        assert_eq!(keys(&list), [10, 20, 30]);
    }

    #[test]
    fn test_update_in_place() {
        let arena = arena();
        let list = ArenaSkipList::new_in(&arena);
        list.insert(1, "a");
        assert_eq!(list.insert(1, "b"), Some("a"));
        assert_eq!(list.get(&1), Some("b"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove() {
        let arena = arena();
        let list = ArenaSkipList::with_seed_in(7, &arena);
        for k in 0..100 {
            list.insert(k, k);
        }
        for k in (0..100).step_by(2) {
            assert_eq!(list.remove(&k), Some(k));
        }
        assert_eq!(list.remove(&0), None);
        assert_eq!(list.remove(&1000), None);
        assert_eq!(list.len(), 50);
        assert_eq!(keys(&list), (1..100).step_by(2).collect::<Vec<_>>());
    }

    #[test]
    fn test_level_shrinks_when_emptied() {
        let arena = arena();
        let list = ArenaSkipList::with_seed_in(42, &arena);
        for k in 0..200 {
            list.insert(k, ());
        }
        assert!(list.level() > 0);
        assert!(list.level() <= MAX_LEVEL);
        for k in 0..200 {
            list.remove(&k);
        }
        assert_eq!(list.level(), 0);
        assert!(list.is_empty());
    }

    #[test]
    fn test_min_max() {
        let arena = arena();
        let list = ArenaSkipList::new_in(&arena);
        assert_eq!(list.min(), None);
        assert_eq!(list.max(), None);

        for k in [10, 5, 15, 3, 20] {
            list.insert(k, k * 2);
        }
        assert_eq!(list.min(), Some((3, 6)));
        assert_eq!(list.max(), Some((20, 40)));
    }

    #[test]
    fn test_contains() {
        let arena = arena();
        let list = ArenaSkipList::new_in(&arena);
        list.insert(String::from("apple"), 1);
        list.insert(String::from("banana"), 2);
        assert!(list.contains_key("apple"));
        assert!(!list.contains_key("cherry"));
        assert_eq!(list.get_with("banana", |v| v + 1), Some(3));
    }

    #[test]
    fn test_for_each_while_is_ordered_and_stops() {
        let arena = arena();
        let list = ArenaSkipList::new_in(&arena);
        for k in [5, 1, 4, 2, 3] {
            list.insert(k, ());
        }
        let mut seen = Vec::new();
        list.for_each_while(|k, _| {
            seen.push(*k);
            *k < 3
        });
        assert_eq!(seen, [1, 2, 3]);
    }

    #[test]
    fn test_clear_and_reuse() {
        let arena = arena();
        let list = ArenaSkipList::new_in(&arena);
        for k in 0..50 {
            list.insert(k, k);
        }
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.level(), 0);
        assert_eq!(list.min(), None);
        list.insert(7, 7);
        assert_eq!(keys(&list), [7]);
    }

    #[test]
    fn test_heap_copies() {
        let arena = arena();
        let list = ArenaSkipList::new_in(&arena);
        for k in [3, 1, 2] {
            list.insert(k, k * 10);
        }
        assert_eq!(list.to_vec(), [(1, 10), (2, 20), (3, 30)]);
        let map = list.to_btree_map();
        assert_eq!(map.len(), 3);
        assert_eq!(map[&2], 20);
    }

    #[test]
    fn test_guard_views() {
        let arena = arena();
        let list = ArenaSkipList::new_in(&arena);
        for k in [2, 1, 3] {
            list.insert(k, k as f64 / 2.0);
        }
        let guard = list.read();
        assert_eq!(guard.len(), 3);
        assert_eq!(guard.min(), Some((&1, &0.5)));
        assert_eq!(guard.max(), Some((&3, &1.5)));
        let values: Vec<f64> = guard.values().copied().collect();
        assert_eq!(values, [0.5, 1.0, 1.5]);
        assert_eq!((&guard).into_iter().count(), 3);
    }

    #[test]
    fn test_drop_retires_every_span() {
        let arena = arena();
        let before = arena.stats().removals;
        {
            let list = ArenaSkipList::new_in(&arena);
            for k in 0..10 {
                list.insert(k, k);
            }
        }
        // A node and its forward array per entry, plus the head array
        assert_eq!(arena.stats().removals - before, 2 * 10 + 1);
    }

    #[test]
    fn test_drops_keys_and_values() {
        let arena = arena();
        let marker = Rc::new(());
        {
            let list = ArenaSkipList::new_in(&arena);
            for k in 0..30 {
                list.insert(k, Rc::clone(&marker));
            }
            drop(list.remove(&10));
            assert_eq!(Rc::strong_count(&marker), 30);
        }
        assert_eq!(Rc::strong_count(&marker), 1);
    }
}
