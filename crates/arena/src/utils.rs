//! Alignment and page arithmetic helpers

/// Fallback page size when the platform cannot be queried
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Aligns a value up to the nearest multiple of alignment
///
/// # Examples
/// ```
/// use nebula_arena::utils::align_up;
/// assert_eq!(align_up(13, 8), 16);
/// assert_eq!(align_up(16, 8), 16);
/// ```
#[inline(always)]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Overflow-checked variant of [`align_up`]
#[inline(always)]
pub const fn checked_align_up(value: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    match value.checked_add(alignment - 1) {
        Some(v) => Some(v & !(alignment - 1)),
        None => None,
    }
}

/// Aligns a value down to the nearest multiple of alignment
///
/// # Examples
/// ```
/// use nebula_arena::utils::align_down;
/// assert_eq!(align_down(13, 8), 8);
/// ```
#[inline(always)]
pub const fn align_down(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    value & !(alignment - 1)
}

/// Checks if a value is aligned to the given alignment
///
/// # Examples
/// ```
/// use nebula_arena::utils::is_aligned;
/// assert!(is_aligned(64, 16));
/// assert!(!is_aligned(65, 16));
/// ```
#[inline(always)]
pub const fn is_aligned(value: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    value & (alignment - 1) == 0
}

/// Checks pointer alignment
#[inline]
pub fn is_aligned_ptr<T: ?Sized>(ptr: *const T, alignment: usize) -> bool {
    is_aligned(ptr.cast::<u8>() as usize, alignment)
}

/// Rounds `size` up to whole pages, never returning less than one page
#[inline]
pub const fn round_to_pages(size: usize, page_size: usize) -> Option<usize> {
    let size = if size == 0 { 1 } else { size };
    checked_align_up(size, page_size)
}

/// Queries the operating system page size.
///
/// Called when a configuration is built; the value is stored in the config
/// and never cached process-wide.
pub fn system_page_size() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no memory-safety preconditions.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 && (size as usize).is_power_of_two() {
            return size as usize;
        }
    }

    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_aligned_ptr() {
        let words = [0u64; 4];
        let base = words.as_ptr();
        assert!(is_aligned_ptr(base, 8));
        assert!(!is_aligned_ptr(base.cast::<u8>().wrapping_add(1), 2));
        assert!(is_aligned_ptr(base.cast::<u8>().wrapping_add(4), 4));
        assert!(is_aligned_ptr(std::ptr::dangling::<u128>(), 16));
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(9, 4096), 4096);
    }

    #[test]
    fn test_checked_align_up_overflow() {
        assert_eq!(checked_align_up(usize::MAX, 8), None);
        assert_eq!(checked_align_up(7, 8), Some(8));
    }

    #[test]
    fn test_round_to_pages() {
        assert_eq!(round_to_pages(0, 4096), Some(4096));
        assert_eq!(round_to_pages(1, 4096), Some(4096));
        assert_eq!(round_to_pages(4097, 4096), Some(8192));
        assert_eq!(round_to_pages(usize::MAX, 4096), None);
    }

    #[test]
    fn test_system_page_size_is_power_of_two() {
        assert!(system_page_size().is_power_of_two());
    }
}
