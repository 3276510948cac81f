//! Page sources backing arena chunks
//!
//! # Safety
//!
//! A [`PageSource`] hands out raw, zero-initialized memory:
//! - [`MmapPages`] maps anonymous private memory with `libc::mmap`
//! - [`HeapPages`] asks the global allocator for page-aligned zeroed blocks
//!
//! ## Invariants
//!
//! - Every [`Pages`] returned by `acquire` is non-empty and zero-filled,
//!   and its length is a multiple of the page size
//! - Bases are only guaranteed to be aligned to the OS page; [`MmapPages`]
//!   configured with a larger page size returns OS-page-aligned mappings
//! - `release` is called at most once per [`Pages`], on the source that
//!   produced it

use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::fmt;
use std::ptr::NonNull;

use crate::config::Backing;
use crate::error::{ArenaError, ArenaResult};
use crate::utils::round_to_pages;

#[cfg(feature = "logging")]
use tracing::trace;

/// A contiguous, page-granular block of memory
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Pages {
    ptr: NonNull<u8>,
    len: usize,
}

impl Pages {
    /// Wraps a raw block.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` bytes until the
    /// block is released.
    pub const unsafe fn from_raw_parts(ptr: NonNull<u8>, len: usize) -> Self {
        Self { ptr, len }
    }

    #[inline]
    pub const fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub const fn as_non_null(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Base address
    #[inline]
    pub fn start(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// One-past-the-end address
    #[inline]
    pub fn end(&self) -> usize {
        self.start() + self.len
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `addr` falls inside `[start, end)`
    #[inline]
    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.start() && addr < self.end()
    }
}

impl fmt::Debug for Pages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pages")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

// SAFETY: Pages is a plain (pointer, length) descriptor.
// - It owns nothing by itself; ownership lives with the allocator that
//   acquired it
// - Access to the memory is synchronized by that allocator
unsafe impl Send for Pages {}

// SAFETY: Pages exposes no interior mutability.
unsafe impl Sync for Pages {}

/// Source of zero-initialized, page-granular memory
pub trait PageSource: Send + Sync {
    /// Page granularity of this source
    fn page_size(&self) -> usize;

    /// Acquires at least `size` bytes, rounded up to whole pages
    fn acquire(&self, size: usize) -> ArenaResult<Pages>;

    /// Returns pages to the source.
    ///
    /// # Safety
    ///
    /// `pages` must come from `acquire` on this source, must not have been
    /// released before, and nothing may access the memory afterwards.
    unsafe fn release(&self, pages: Pages);
}

/// Builds the page source selected by `backing`
pub fn page_source_for(backing: Backing, page_size: usize) -> Box<dyn PageSource> {
    match backing {
        #[cfg(unix)]
        Backing::Mmap => Box::new(MmapPages::new(page_size)),
        Backing::Heap => Box::new(HeapPages::new(page_size)),
    }
}

// ============================================================================
// mmap-backed pages
// ============================================================================

/// Anonymous private mappings
#[cfg(unix)]
#[derive(Debug, Clone, Copy)]
pub struct MmapPages {
    page_size: usize,
}

#[cfg(unix)]
impl MmapPages {
    pub fn new(page_size: usize) -> Self {
        debug_assert!(page_size.is_power_of_two());
        Self { page_size }
    }
}

#[cfg(unix)]
impl PageSource for MmapPages {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn acquire(&self, size: usize) -> ArenaResult<Pages> {
        use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, mmap};

        let len = round_to_pages(size, self.page_size)
            .ok_or_else(|| ArenaError::size_overflow("page rounding"))?;

        // SAFETY: Requesting a fresh anonymous mapping.
        // - addr is null, so the kernel picks the placement
        // - fd is -1 and offset 0 as required for MAP_ANONYMOUS
        // - Anonymous mappings are zero-filled by the kernel
        let raw = unsafe {
            mmap(
                std::ptr::null_mut(),
                len,
                PROT_READ | PROT_WRITE,
                MAP_PRIVATE | MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if raw == MAP_FAILED {
            let err = std::io::Error::last_os_error();
            return Err(ArenaError::page_acquisition(len, err.to_string()));
        }

        let ptr = NonNull::new(raw.cast::<u8>())
            .ok_or_else(|| ArenaError::page_acquisition(len, "mmap returned null"))?;

        #[cfg(feature = "logging")]
        trace!(len, addr = ?ptr, "mapped pages");

        // SAFETY: The mapping is readable and writable for len bytes.
        Ok(unsafe { Pages::from_raw_parts(ptr, len) })
    }

    unsafe fn release(&self, pages: Pages) {
        // SAFETY: Unmapping a region we mapped.
        // - pages came from acquire() on this source (caller contract)
        // - len is the exact mapped length
        let rc = unsafe { libc::munmap(pages.as_ptr().cast(), pages.len()) };
        debug_assert_eq!(rc, 0, "munmap failed");

        #[cfg(feature = "logging")]
        trace!(len = pages.len(), "unmapped pages");
    }
}

// ============================================================================
// Heap-backed pages
// ============================================================================

/// Page-aligned zeroed blocks from the global allocator
#[derive(Debug, Clone, Copy)]
pub struct HeapPages {
    page_size: usize,
}

impl HeapPages {
    pub fn new(page_size: usize) -> Self {
        debug_assert!(page_size.is_power_of_two());
        Self { page_size }
    }

    fn layout(&self, len: usize) -> ArenaResult<Layout> {
        Layout::from_size_align(len, self.page_size)
            .map_err(|_| ArenaError::size_overflow("page layout"))
    }
}

impl PageSource for HeapPages {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn acquire(&self, size: usize) -> ArenaResult<Pages> {
        let len = round_to_pages(size, self.page_size)
            .ok_or_else(|| ArenaError::size_overflow("page rounding"))?;
        let layout = self.layout(len)?;

        // SAFETY: layout has non-zero size (round_to_pages never returns 0)
        // and a power-of-two alignment.
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw)
            .ok_or_else(|| ArenaError::page_acquisition(len, "global allocator returned null"))?;

        // SAFETY: alloc_zeroed returned len readable/writable bytes.
        Ok(unsafe { Pages::from_raw_parts(ptr, len) })
    }

    unsafe fn release(&self, pages: Pages) {
        // SAFETY: Deallocating a block allocated by acquire().
        // - Same size and page alignment as the original layout
        // - Caller guarantees single release
        unsafe {
            dealloc(
                pages.as_ptr(),
                Layout::from_size_align_unchecked(pages.len(), self.page_size),
            );
        }
    }
}
