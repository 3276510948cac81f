//! Arena configuration

use crate::error::{ArenaError, ArenaResult};
use crate::utils::system_page_size;

/// Default block size recorded by the slab strategy
pub const DEFAULT_SLAB_BLOCK_SIZE: usize = 256;

/// Smallest slab block size; block sizes are rounded to this granularity
pub const MIN_SLAB_BLOCK_SIZE: usize = 16;

/// Default block size recorded by the buddy strategy
pub const DEFAULT_BUDDY_BLOCK_SIZE: usize = 4096;

/// Allocation strategy owned by an arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AllocatorKind {
    /// Linear bump allocation over page-backed chunks
    #[default]
    Bump,
    /// Fixed block size slab (placeholder: allocation is not supported)
    Slab,
    /// Power-of-two buddy system (placeholder: allocation is not supported)
    Buddy,
}

impl AllocatorKind {
    /// Short lowercase name used in errors and logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bump => "bump",
            Self::Slab => "slab",
            Self::Buddy => "buddy",
        }
    }
}

/// Where chunk memory comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backing {
    /// Anonymous private mappings (`mmap`/`munmap`)
    #[cfg(unix)]
    Mmap,
    /// Page-aligned zeroed blocks from the global allocator
    Heap,
}

impl Default for Backing {
    fn default() -> Self {
        #[cfg(unix)]
        {
            Self::Mmap
        }
        #[cfg(not(unix))]
        {
            Self::Heap
        }
    }
}

/// Configuration for arena construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Number of pages in the first chunk (0 is treated as 1)
    pub pages: usize,
    /// Page granularity used for every chunk; must be a power of two
    pub page_size: usize,
    /// Allocation strategy
    pub strategy: AllocatorKind,
    /// Chunk memory source
    pub backing: Backing,
    /// Whether `reset` zeroes the memory handed out so far
    pub zero_on_reset: bool,
    /// Block size for the slab strategy
    pub slab_block_size: usize,
    /// Block size for the buddy strategy; must be a power of two
    pub buddy_block_size: usize,
}

impl ArenaConfig {
    /// Creates new config with default values
    pub fn new() -> Self {
        Self {
            pages: 1,
            page_size: system_page_size(),
            strategy: AllocatorKind::Bump,
            backing: Backing::default(),
            zero_on_reset: false,
            slab_block_size: DEFAULT_SLAB_BLOCK_SIZE,
            buddy_block_size: DEFAULT_BUDDY_BLOCK_SIZE,
        }
    }

    /// Production configuration - larger first chunk, no zeroing
    pub fn production() -> Self {
        Self {
            pages: 16, // 64KB with 4KB pages
            ..Self::new()
        }
    }

    /// Debug configuration - heap-backed, zeroed on reset
    pub fn debug() -> Self {
        Self {
            backing: Backing::Heap,
            zero_on_reset: true,
            ..Self::new()
        }
    }

    /// Smallest possible arena: a single page
    pub fn tiny() -> Self {
        Self::new()
    }

    /// Sets the number of pages in the first chunk
    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = pages;
        self
    }

    /// Sets the page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the allocation strategy
    pub fn with_strategy(mut self, strategy: AllocatorKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the chunk backing
    pub fn with_backing(mut self, backing: Backing) -> Self {
        self.backing = backing;
        self
    }

    /// Enables or disables zeroing on reset
    pub fn with_zero_on_reset(mut self, zero: bool) -> Self {
        self.zero_on_reset = zero;
        self
    }

    /// Sets the slab block size
    pub fn with_slab_block_size(mut self, size: usize) -> Self {
        self.slab_block_size = size;
        self
    }

    /// Sets the buddy block size
    pub fn with_buddy_block_size(mut self, size: usize) -> Self {
        self.buddy_block_size = size;
        self
    }

    /// Page count with the zero-means-one rule applied
    pub fn effective_pages(&self) -> usize {
        self.pages.max(1)
    }

    /// Size in bytes of the first chunk
    pub fn initial_chunk_size(&self) -> ArenaResult<usize> {
        self.effective_pages()
            .checked_mul(self.page_size)
            .ok_or_else(|| ArenaError::size_overflow("initial chunk size"))
    }

    /// Validates the configuration
    pub fn validate(&self) -> ArenaResult<()> {
        if self.page_size == 0 || !self.page_size.is_power_of_two() {
            return Err(ArenaError::invalid_config(
                "page_size must be a non-zero power of two",
            ));
        }

        self.initial_chunk_size()?;

        if self.strategy == AllocatorKind::Buddy && !self.buddy_block_size.is_power_of_two() {
            return Err(ArenaError::invalid_config(
                "buddy_block_size must be a power of two",
            ));
        }

        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}
