//! # nebula-arena
//!
//! Region-based allocation for workloads that build many short-lived
//! objects and throw them away together.
//!
//! An [`Arena`] hands out memory from page-sized chunks and reclaims it all
//! at once on [`Arena::reset`] or [`Arena::delete`]. Containers borrow the
//! arena, so the borrow checker guarantees none of them outlive a reset.
//!
//! ## Quick Start
//!
//! ```rust
//! use nebula_arena::prelude::*;
//!
//! let mut arena = Arena::bump(1);
//! {
//!     let mut numbers = ArenaVec::new_in(&arena);
//!     numbers.extend_from_slice(&[5, 3, 8]);
//!     numbers.sort_with(|a, b| a < b);
//!     assert_eq!(numbers, [3, 5, 8]);
//!
//!     let ages = ArenaMap::new_in(&arena);
//!     ages.insert("alice", 30);
//!     assert_eq!(ages.get("alice"), Some(30));
//!
//!     let ordered = ArenaSkipList::new_in(&arena);
//!     ordered.insert(2, "two");
//!     ordered.insert(1, "one");
//!     assert_eq!(ordered.min(), Some((1, "one")));
//! }
//! arena.reset();
//! ```
//!
//! ## Features
//!
//! - `logging` (default): structured `tracing` events on chunk growth,
//!   reset, delete and table rehash
//!
//! ## Strategies
//!
//! [`AllocatorKind::Bump`] is the working strategy. `Slab` and `Buddy` are
//! accepted by the configuration but every allocation through them fails
//! with [`ArenaError::NotSupported`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
// Raw memory management is this crate's job
#![allow(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// Arena allocation hands out &mut T from &self
#![allow(clippy::mut_from_ref)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::elidable_lifetime_names)]
#![allow(clippy::return_self_not_must_use)]

pub mod allocator;
pub mod arena;
pub mod collections;
pub mod config;
pub mod error;
pub mod page;
pub mod stats;
pub mod utils;

pub use allocator::{Allocator, BuddyAllocator, BumpAllocator, SlabAllocator, Strategy};
pub use arena::Arena;
pub use collections::{ArenaMap, ArenaSkipList, ArenaVec};
pub use config::{AllocatorKind, ArenaConfig, Backing};
pub use error::{ArenaError, ArenaResult};
#[cfg(unix)]
pub use page::MmapPages;
pub use page::{HeapPages, PageSource, Pages};
pub use stats::ArenaStats;

/// Common imports
pub mod prelude {
    pub use crate::arena::Arena;
    pub use crate::collections::{ArenaMap, ArenaSkipList, ArenaVec};
    pub use crate::config::{AllocatorKind, ArenaConfig};
    pub use crate::error::{ArenaError, ArenaResult};
}
