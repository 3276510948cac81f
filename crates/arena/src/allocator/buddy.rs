//! Buddy strategy placeholder
//!
//! Validates its power-of-two block size and otherwise behaves like an
//! empty allocator: allocation fails, nothing is owned.

use std::alloc::Layout;
use std::ptr::NonNull;

use super::Allocator;
use crate::config::AllocatorKind;
use crate::error::{ArenaError, ArenaResult};
use crate::stats::ArenaStats;

/// Power-of-two buddy system (not implemented)
#[derive(Debug, Clone)]
pub struct BuddyAllocator {
    block_size: usize,
}

impl BuddyAllocator {
    pub fn new(block_size: usize) -> ArenaResult<Self> {
        if !block_size.is_power_of_two() {
            return Err(ArenaError::invalid_config(
                "buddy block size must be a power of two",
            ));
        }
        Ok(Self { block_size })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

impl Allocator for BuddyAllocator {
    fn kind(&self) -> AllocatorKind {
        AllocatorKind::Buddy
    }

    fn try_alloc(&self, _layout: Layout) -> ArenaResult<NonNull<u8>> {
        Err(ArenaError::not_supported(AllocatorKind::Buddy.name(), "alloc"))
    }

    unsafe fn remove(&self, _ptr: NonNull<u8>) {}

    fn owns(&self, _addr: usize) -> bool {
        false
    }

    fn reset(&mut self) {}

    fn delete(&mut self) {}

    fn stats(&self) -> ArenaStats {
        ArenaStats::default()
    }
}
