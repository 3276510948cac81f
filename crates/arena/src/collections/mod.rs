//! Containers backed by an [`Arena`](crate::Arena)
//!
//! Every container borrows its arena for `'a` and drops its own elements;
//! the memory itself is only reclaimed by resetting or deleting the arena.
//!
//! - [`ArenaVec`]: growable array with a small first allocation
//! - [`ArenaMap`]: separate-chaining hash map behind an `RwLock`
//! - [`ArenaSkipList`]: ordered map behind an `RwLock`

pub mod map;
pub mod skiplist;
pub mod vec;

pub use map::{ArenaMap, MapReadGuard};
pub use skiplist::{ArenaSkipList, SkipListReadGuard};
pub use vec::ArenaVec;
