//! The arena facade
//!
//! An [`Arena`] owns exactly one allocation strategy and forwards the
//! `alloc` / `remove` / `owns` / `reset` / `delete` contract to it. All
//! containers in [`crate::collections`] consume only this facade.
//!
//! # Examples
//!
//! ```rust
//! use nebula_arena::{AllocatorKind, Arena};
//!
//! let mut arena = Arena::new(1, AllocatorKind::Bump);
//! let ptr = arena.alloc(64, 16);
//! assert_eq!(ptr.as_ptr() as usize % 16, 0);
//! assert!(arena.owns(ptr.as_ptr()));
//!
//! arena.reset();
//! assert_eq!(arena.generation(), 1);
//! ```
//!
//! ## Lifetimes
//!
//! Everything allocated from an arena borrows it. `reset` takes `&mut self`
//! and `delete` takes `self`, so the borrow checker rejects any container,
//! reference or slice that would outlive either. Raw pointers obtained from
//! [`Arena::alloc`] are not tracked; [`Arena::generation`] changes on every
//! reset so callers holding addresses can detect staleness.

use std::alloc::{Layout, handle_alloc_error};
use std::ptr::NonNull;

use crate::allocator::{Allocator, Strategy};
use crate::config::{AllocatorKind, ArenaConfig};
use crate::error::{ArenaError, ArenaResult};
use crate::page::{PageSource, page_source_for};
use crate::stats::ArenaStats;

#[cfg(feature = "logging")]
use tracing::debug;

mod typed;

/// Region allocator with a single collective lifetime
#[derive(Debug)]
pub struct Arena {
    strategy: Strategy,
    config: ArenaConfig,
    generation: u64,
}

impl Arena {
    /// Creates an arena whose first chunk spans `pages` pages (0 means 1).
    ///
    /// # Panics
    ///
    /// Panics if the first chunk cannot be acquired; use
    /// [`Arena::with_config`] for a recoverable constructor.
    pub fn new(pages: usize, kind: AllocatorKind) -> Self {
        let config = ArenaConfig::new().with_pages(pages).with_strategy(kind);
        match Self::with_config(config) {
            Ok(arena) => arena,
            Err(err) => panic!("failed to create arena: {err}"),
        }
    }

    /// Bump arena with `pages` pages in its first chunk
    pub fn bump(pages: usize) -> Self {
        Self::new(pages, AllocatorKind::Bump)
    }

    /// Creates an arena from a validated configuration
    pub fn with_config(config: ArenaConfig) -> ArenaResult<Self> {
        config.validate()?;
        let source = page_source_for(config.backing, config.page_size);
        Self::with_page_source(config, source)
    }

    /// Creates an arena drawing chunks from a custom page source.
    ///
    /// The source's page size overrides `config.page_size`.
    pub fn with_page_source(
        mut config: ArenaConfig,
        source: Box<dyn PageSource>,
    ) -> ArenaResult<Self> {
        config.page_size = source.page_size();
        config.validate()?;
        let strategy = Strategy::from_config(&config, source)?;

        #[cfg(feature = "logging")]
        debug!(
            strategy = config.strategy.name(),
            pages = config.effective_pages(),
            page_size = config.page_size,
            "arena created"
        );

        Ok(Self {
            strategy,
            config,
            generation: 0,
        })
    }

    /// Allocates `size` bytes aligned to `align`.
    ///
    /// # Panics
    ///
    /// Panics when `align` is not a power of two or the strategy cannot
    /// allocate; running out of pages aborts through
    /// [`handle_alloc_error`].
    #[must_use = "allocated memory must be used"]
    pub fn alloc(&self, size: usize, align: usize) -> NonNull<u8> {
        match layout_for(size, align) {
            Ok(layout) => self.alloc_layout(layout),
            Err(err) => panic!("invalid arena allocation request: {err}"),
        }
    }

    /// Fallible variant of [`Arena::alloc`]
    pub fn try_alloc(&self, size: usize, align: usize) -> ArenaResult<NonNull<u8>> {
        self.try_alloc_layout(layout_for(size, align)?)
    }

    /// Allocates memory fitting `layout`, aborting on page exhaustion
    #[must_use = "allocated memory must be used"]
    pub fn alloc_layout(&self, layout: Layout) -> NonNull<u8> {
        match self.strategy.try_alloc(layout) {
            Ok(ptr) => ptr,
            Err(err) if err.is_fatal() => handle_alloc_error(layout),
            Err(err) => panic!("arena allocation failed: {err}"),
        }
    }

    /// Fallible variant of [`Arena::alloc_layout`]
    #[inline]
    pub fn try_alloc_layout(&self, layout: Layout) -> ArenaResult<NonNull<u8>> {
        self.strategy.try_alloc(layout)
    }

    /// Hints that a region is dead. A no-op under the bump strategy: the
    /// space only comes back on [`Arena::reset`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from this arena since the last reset and must not be
    /// used afterwards.
    #[inline]
    pub unsafe fn remove(&self, ptr: NonNull<u8>) {
        // SAFETY: forwarded caller contract.
        unsafe { self.strategy.remove(ptr) }
    }

    /// Whether `ptr` points into memory this arena currently manages
    pub fn owns<T: ?Sized>(&self, ptr: *const T) -> bool {
        self.strategy.owns(ptr.cast::<u8>() as usize)
    }

    /// Logically discards every allocation and keeps the pages for reuse
    pub fn reset(&mut self) {
        self.strategy.reset();
        self.generation = self.generation.wrapping_add(1);

        #[cfg(feature = "logging")]
        debug!(generation = self.generation, "arena reset");
    }

    /// Releases every page back to the page source
    pub fn delete(mut self) {
        self.strategy.delete();

        #[cfg(feature = "logging")]
        debug!(generation = self.generation, "arena deleted");
    }

    /// Number of resets so far
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn kind(&self) -> AllocatorKind {
        self.strategy.kind()
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Usage snapshot
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            generation: self.generation,
            ..self.strategy.stats()
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::bump(1)
    }
}

fn layout_for(size: usize, align: usize) -> ArenaResult<Layout> {
    if !align.is_power_of_two() {
        return Err(ArenaError::invalid_alignment(align));
    }
    Layout::from_size_align(size, align).map_err(|_| ArenaError::size_overflow("layout"))
}

/// Space for `len` values of `T`; panics on layout overflow
#[inline]
pub(crate) fn alloc_array<T>(arena: &Arena, len: usize) -> NonNull<T> {
    match Layout::array::<T>(len) {
        Ok(layout) => arena.alloc_layout(layout).cast(),
        Err(_) => panic!("capacity overflow"),
    }
}
