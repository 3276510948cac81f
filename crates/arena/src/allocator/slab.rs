//! Slab strategy placeholder
//!
//! Records a fixed block size but never hands out memory: `try_alloc`
//! always fails with [`ArenaError::NotSupported`] and `owns` is always
//! false. It exists so arenas can be built against the full strategy set.

use std::alloc::Layout;
use std::ptr::NonNull;

use super::Allocator;
use crate::config::{AllocatorKind, MIN_SLAB_BLOCK_SIZE};
use crate::error::{ArenaError, ArenaResult};
use crate::stats::ArenaStats;
use crate::utils::align_up;

/// Fixed block size slab (not implemented)
#[derive(Debug, Clone)]
pub struct SlabAllocator {
    block_size: usize,
}

impl SlabAllocator {
    /// Block sizes are rounded up to 16 bytes, with 16 as the minimum
    pub fn new(block_size: usize) -> Self {
        let block_size = align_up(block_size.max(MIN_SLAB_BLOCK_SIZE), MIN_SLAB_BLOCK_SIZE);
        Self { block_size }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

impl Allocator for SlabAllocator {
    fn kind(&self) -> AllocatorKind {
        AllocatorKind::Slab
    }

    fn try_alloc(&self, _layout: Layout) -> ArenaResult<NonNull<u8>> {
        Err(ArenaError::not_supported(AllocatorKind::Slab.name(), "alloc"))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size_normalization() {
        assert_eq!(SlabAllocator::new(0).block_size(), 16);
        assert_eq!(SlabAllocator::new(17).block_size(), 32);
        assert_eq!(SlabAllocator::new(256).block_size(), 256);
    }

    #[test]
    fn test_alloc_is_unsupported() {
        let slab = SlabAllocator::new(64);
        let err = slab.try_alloc(Layout::new::<u64>()).unwrap_err();
        assert!(matches!(err, ArenaError::NotSupported { strategy: "slab", .. }));
        assert!(!slab.owns(0x1000));
    }
}
