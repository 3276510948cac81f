//! Bump allocator over a list of page-backed chunks
//!
//! # Safety
//!
//! This module hands out raw pointers into chunks acquired from a
//! [`PageSource`]:
//! - One `parking_lot::Mutex` serializes every allocation
//! - Chunks are only released by `delete` (or drop), which needs `&mut self`
//! - `remove` never touches memory, it only counts the hint
//!
//! ## Invariants
//!
//! - `offset <= chunks[current].len()` whenever `chunks` is non-empty
//! - Chunks `0..=current` are the ones used since the last reset, chunks
//!   after `current` are retained from before and reused in order
//! - `by_address` holds the same chunks as `chunks`, sorted by base address,
//!   so ownership lookups never depend on the order the OS hands out pages
//! - Allocated ranges never overlap within a generation

use std::alloc::Layout;
use std::fmt;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::{Allocator, dangling_for};
use crate::config::{AllocatorKind, ArenaConfig};
use crate::error::{ArenaError, ArenaResult};
use crate::page::{PageSource, Pages};
use crate::stats::ArenaStats;
use crate::utils::{checked_align_up, is_aligned_ptr};

#[cfg(feature = "logging")]
use tracing::debug;

struct BumpState {
    /// Chunks in use order
    chunks: Vec<Pages>,
    /// Same chunks sorted by base address
    by_address: Vec<Pages>,
    current: usize,
    offset: usize,
    used: usize,
    allocations: u64,
    resets: u64,
}

impl BumpState {
    const fn empty() -> Self {
        Self {
            chunks: Vec::new(),
            by_address: Vec::new(),
            current: 0,
            offset: 0,
            used: 0,
            allocations: 0,
            resets: 0,
        }
    }

    fn reserved(&self) -> usize {
        self.chunks.iter().map(Pages::len).sum()
    }

    fn track(&mut self, pages: Pages, at: usize) {
        self.chunks.insert(at, pages);
        let pos = self
            .by_address
            .partition_point(|p| p.start() < pages.start());
        self.by_address.insert(pos, pages);
    }
}

/// Where a request lands inside a chunk: `(aligned offset, end offset)`
#[inline]
fn fit(chunk: &Pages, offset: usize, size: usize, align: usize) -> Option<(usize, usize)> {
    let base = chunk.start();
    let addr = checked_align_up(base.checked_add(offset)?, align)?;
    let aligned = addr - base;
    let end = aligned.checked_add(size)?;
    (end <= chunk.len()).then_some((aligned, end))
}

/// Linear allocator over page-backed chunks
pub struct BumpAllocator {
    state: Mutex<BumpState>,
    source: Box<dyn PageSource>,
    first_chunk_len: usize,
    zero_on_reset: bool,
    removals: AtomicU64,
}

impl BumpAllocator {
    /// Creates an allocator and eagerly acquires its first chunk
    pub fn new(config: &ArenaConfig, source: Box<dyn PageSource>) -> ArenaResult<Self> {
        config.validate()?;
        let initial = config.initial_chunk_size()?;
        let first = source.acquire(initial)?;
        if first.len() < initial {
            // SAFETY: first came from source and is not referenced elsewhere.
            unsafe { source.release(first) };
            return Err(ArenaError::corruption(
                "page source",
                "first chunk shorter than requested",
            ));
        }

        #[cfg(feature = "logging")]
        debug!(
            len = first.len(),
            page_size = source.page_size(),
            "bump allocator created"
        );

        let mut state = BumpState::empty();
        state.track(first, 0);

        Ok(Self {
            state: Mutex::new(state),
            first_chunk_len: first.len(),
            source,
            zero_on_reset: config.zero_on_reset,
            removals: AtomicU64::new(0),
        })
    }

    /// Size of the first chunk; the floor for every later chunk
    pub fn first_chunk_len(&self) -> usize {
        self.first_chunk_len
    }

    /// Number of chunks currently held
    pub fn chunk_count(&self) -> usize {
        self.state.lock().chunks.len()
    }

    fn bump(&self, state: &mut BumpState, layout: Layout) -> ArenaResult<NonNull<u8>> {
        let (size, align) = (layout.size(), layout.align());

        if let Some(chunk) = state.chunks.get(state.current)
            && let Some((start, end)) = fit(chunk, state.offset, size, align)
        {
            let base = chunk.as_non_null();
            state.used += end - state.offset;
            state.offset = end;
            // SAFETY: start < chunk.len(), so the pointer stays in the chunk.
            return Ok(unsafe { base.add(start) });
        }

        // A chunk retained by an earlier reset may still fit.
        let next = if state.chunks.is_empty() {
            0
        } else {
            state.current + 1
        };
        if let Some(chunk) = state.chunks.get(next)
            && let Some((start, end)) = fit(chunk, 0, size, align)
        {
            let base = chunk.as_non_null();
            state.current = next;
            state.offset = end;
            state.used += end;
            // SAFETY: start < chunk.len().
            return Ok(unsafe { base.add(start) });
        }

        let (pages, start, end) = self.acquire_fitting(size, align)?;

        #[cfg(feature = "logging")]
        debug!(
            len = pages.len(),
            request = size,
            chunks = state.chunks.len() + 1,
            "bump allocator grew"
        );

        state.track(pages, next);
        state.current = next;
        state.offset = end;
        state.used += end;
        // SAFETY: start < pages.len().
        Ok(unsafe { pages.as_non_null().add(start) })
    }

    /// Acquires a chunk able to hold `size` bytes at `align`.
    ///
    /// Sources only promise bases aligned to the OS page, which can be
    /// smaller than their `page_size` (an mmap source configured with
    /// 64 KiB pages on a 4 KiB host). A chunk whose base misses the
    /// alignment is released and replaced by one padded with `align - 1`
    /// bytes.
    fn acquire_fitting(&self, size: usize, align: usize) -> ArenaResult<(Pages, usize, usize)> {
        let slack = if align > self.source.page_size() {
            align - 1
        } else {
            0
        };
        let pages = self.acquire_at_least(size, slack)?;
        if let Some((start, end)) = fit(&pages, 0, size, align) {
            return Ok((pages, start, end));
        }

        #[cfg(feature = "logging")]
        debug!(
            base = pages.start(),
            align, "chunk base under-aligned, retrying with padding"
        );

        // SAFETY: pages came from self.source and was never handed out.
        unsafe { self.source.release(pages) };

        let pages = self.acquire_at_least(size, align - 1)?;
        match fit(&pages, 0, size, align) {
            Some((start, end)) => Ok((pages, start, end)),
            None => {
                // SAFETY: as above.
                unsafe { self.source.release(pages) };
                Err(ArenaError::allocation_failed(size, align))
            }
        }
    }

    fn acquire_at_least(&self, size: usize, slack: usize) -> ArenaResult<Pages> {
        let request = size
            .checked_add(slack)
            .ok_or_else(|| ArenaError::size_overflow("chunk size"))?
            .max(self.first_chunk_len);
        self.source.acquire(request)
    }
}

impl Allocator for BumpAllocator {
    fn kind(&self) -> AllocatorKind {
        AllocatorKind::Bump
    }

    fn try_alloc(&self, layout: Layout) -> ArenaResult<NonNull<u8>> {
        if layout.size() == 0 {
            return Ok(dangling_for(layout));
        }

        let mut state = self.state.lock();
        let ptr = self.bump(&mut state, layout)?;
        state.allocations += 1;
        debug_assert!(is_aligned_ptr(ptr.as_ptr(), layout.align()));
        Ok(ptr)
    }

    unsafe fn remove(&self, _ptr: NonNull<u8>) {
        // Bump allocation never reclaims individual objects.
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    fn owns(&self, addr: usize) -> bool {
        let state = self.state.lock();
        let idx = state.by_address.partition_point(|p| p.start() <= addr);
        idx > 0 && state.by_address[idx - 1].contains(addr)
    }

    fn reset(&mut self) {
        let state = self.state.get_mut();

        if self.zero_on_reset && !state.chunks.is_empty() {
            for chunk in &state.chunks[..state.current] {
                // SAFETY: &mut self means no allocation is in flight; the
                // chunk is live and len bytes long.
                unsafe { ptr::write_bytes(chunk.as_ptr(), 0, chunk.len()) };
            }
            let current = &state.chunks[state.current];
            // SAFETY: offset <= current.len().
            unsafe { ptr::write_bytes(current.as_ptr(), 0, state.offset) };
        }

        state.current = 0;
        state.offset = 0;
        state.used = 0;
        state.resets += 1;

        #[cfg(feature = "logging")]
        debug!(
            chunks = state.chunks.len(),
            resets = state.resets,
            "bump allocator reset"
        );
    }

    fn delete(&mut self) {
        let state = self.state.get_mut();
        let released = state.chunks.len();

        for pages in state.chunks.drain(..) {
            // SAFETY: every chunk came from self.source and is released once;
            // by_address is cleared below so nothing refers to it afterwards.
            unsafe { self.source.release(pages) };
        }
        state.by_address.clear();
        state.current = 0;
        state.offset = 0;
        state.used = 0;

        #[cfg(feature = "logging")]
        if released > 0 {
            debug!(chunks = released, "bump allocator released its chunks");
        }
        #[cfg(not(feature = "logging"))]
        let _ = released;
    }

    fn stats(&self) -> ArenaStats {
        let state = self.state.lock();
        ArenaStats {
            chunks: state.chunks.len(),
            reserved_bytes: state.reserved(),
            used_bytes: state.used,
            allocations: state.allocations,
            removals: self.removals.load(Ordering::Relaxed),
            resets: state.resets,
            generation: 0,
        }
    }
}

impl Drop for BumpAllocator {
    fn drop(&mut self) {
        self.delete();
    }
}

impl fmt::Debug for BumpAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BumpAllocator")
            .field("chunks", &state.chunks.len())
            .field("current", &state.current)
            .field("offset", &state.offset)
            .field("first_chunk_len", &self.first_chunk_len)
            .finish_non_exhaustive()
    }
}
