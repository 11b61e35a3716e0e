//! An `mmap`-backed pool source for Unix-like targets.
use core::ptr::NonNull;

use super::PoolSource;
use crate::{
    utils::{nonnull_slice_from_raw_parts, nonnull_slice_len},
    Init,
};

/// A [`PoolSource`] drawing anonymous pages directly from the operating
/// system with `mmap`.
///
/// Requested sizes are rounded up to the page size, so pools obtained
/// through this source are page-aligned at both ends, which satisfies
/// the [`PoolSource`] alignment contract with a wide margin.
#[derive(Default, Debug, Copy, Clone)]
pub struct MmapPoolSource;

impl Init for MmapPoolSource {
    const INIT: Self = Self;
}

#[inline]
fn page_mask() -> usize {
    // Safety: `sysconf` is async-signal-safe and has no memory effects.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    debug_assert!(page_size.is_power_of_two());
    page_size - 1
}

unsafe impl PoolSource for MmapPoolSource {
    unsafe fn alloc_pool(&mut self, min_size: usize) -> Option<NonNull<[u8]>> {
        let len = min_size.checked_add(page_mask())? & !page_mask();

        let ptr = libc::mmap(
            core::ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_ANONYMOUS | libc::MAP_PRIVATE,
            -1,
            0,
        );
        if ptr == libc::MAP_FAILED {
            return None;
        }

        // Safety: a successful `mmap` never returns null.
        Some(nonnull_slice_from_raw_parts(
            NonNull::new_unchecked(ptr as *mut u8),
            len,
        ))
    }

    unsafe fn dealloc_pool(&mut self, pool: NonNull<[u8]>) {
        // Safety: `pool` is a whole mapping established by `alloc_pool`.
        libc::munmap(pool.as_ptr() as *mut _, nonnull_slice_len(pool));
    }
}
