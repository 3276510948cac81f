//! Allocation strategies
//!
//! Every strategy honors the same contract ([`Allocator`]); an arena owns
//! exactly one of them through the closed [`Strategy`] enum. Only
//! [`BumpAllocator`] actually hands out memory, [`SlabAllocator`] and
//! [`BuddyAllocator`] are placeholders whose allocations always fail.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::config::{AllocatorKind, ArenaConfig};
use crate::error::ArenaResult;
use crate::page::PageSource;
use crate::stats::ArenaStats;

mod buddy;
mod bump;
mod slab;

pub use buddy::BuddyAllocator;
pub use bump::BumpAllocator;
pub use slab::SlabAllocator;

/// Contract shared by all allocation strategies
pub trait Allocator: Send + Sync {
    /// Which strategy this is
    fn kind(&self) -> AllocatorKind;

    /// Allocates `layout.size()` bytes aligned to `layout.align()`.
    ///
    /// Memory is zero-initialized the first time it is handed out; after a
    /// reset it holds whatever was written before unless the strategy was
    /// configured to zero on reset.
    fn try_alloc(&self, layout: Layout) -> ArenaResult<NonNull<u8>>;

    /// Hints that the region starting at `ptr` is dead.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `try_alloc` on this allocator since
    /// the last reset, and must not be used afterwards.
    unsafe fn remove(&self, ptr: NonNull<u8>);

    /// Whether `addr` lies inside memory this allocator currently manages
    fn owns(&self, addr: usize) -> bool;

    /// Logically discards every allocation, keeping pages for reuse
    fn reset(&mut self);

    /// Returns every page to its source
    fn delete(&mut self);

    /// Usage snapshot
    fn stats(&self) -> ArenaStats;
}

/// The strategy owned by an arena
#[derive(Debug)]
pub enum Strategy {
    Bump(BumpAllocator),
    Slab(SlabAllocator),
    Buddy(BuddyAllocator),
}

impl Strategy {
    /// Builds the strategy selected in `config`
    pub fn from_config(config: &ArenaConfig, source: Box<dyn PageSource>) -> ArenaResult<Self> {
        Ok(match config.strategy {
            AllocatorKind::Bump => Self::Bump(BumpAllocator::new(config, source)?),
            AllocatorKind::Slab => Self::Slab(SlabAllocator::new(config.slab_block_size)),
            AllocatorKind::Buddy => Self::Buddy(BuddyAllocator::new(config.buddy_block_size)?),
        })
    }

    #[inline]
    fn as_dyn(&self) -> &dyn Allocator {
        match self {
            Self::Bump(a) => a,
            Self::Slab(a) => a,
            Self::Buddy(a) => a,
        }
    }

    #[inline]
    fn as_dyn_mut(&mut self) -> &mut dyn Allocator {
        match self {
            Self::Bump(a) => a,
            Self::Slab(a) => a,
            Self::Buddy(a) => a,
        }
    }
}

impl Allocator for Strategy {
    fn kind(&self) -> AllocatorKind {
        self.as_dyn().kind()
    }

    #[inline]
    fn try_alloc(&self, layout: Layout) -> ArenaResult<NonNull<u8>> {
        // Bump is the hot path; skip the vtable for it.
        match self {
            Self::Bump(a) => a.try_alloc(layout),
            other => other.as_dyn().try_alloc(layout),
        }
    }

    unsafe fn remove(&self, ptr: NonNull<u8>) {
        // SAFETY: forwarded caller contract.
        unsafe { self.as_dyn().remove(ptr) }
    }

    fn owns(&self, addr: usize) -> bool {
        self.as_dyn().owns(addr)
    }

    fn reset(&mut self) {
        self.as_dyn_mut().reset();
    }

    fn delete(&mut self) {
        self.as_dyn_mut().delete();
    }

    fn stats(&self) -> ArenaStats {
        self.as_dyn().stats()
    }
}

/// Dangling but well-aligned pointer for zero-sized requests
#[inline]
pub(crate) fn dangling_for(layout: Layout) -> NonNull<u8> {
    NonNull::new(std::ptr::without_provenance_mut(layout.align())).unwrap_or(NonNull::dangling())
}
