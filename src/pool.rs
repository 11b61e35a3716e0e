//! An allocator that owns its memory pools.
use core::{mem, ptr::NonNull};

use crate::{
    tlsf::{Tlsf, ALIGN, HEADER_SIZE},
    utils::{nonnull_slice_end, nonnull_slice_from_raw_parts, nonnull_slice_len, nonnull_slice_start},
    Init,
};

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub use self::unix::MmapPoolSource;
    }
}

/// The trait for memory suppliers that can back [`PooledTlsf`].
///
/// # Safety
///
/// A region returned by [`Self::alloc_pool`] must be valid for reads and
/// writes, at least `min_size` bytes long with both bounds aligned to
/// [`ALIGN`] bytes, and must not be touched by the source (nor handed out
/// again) until it is passed back to [`Self::dealloc_pool`].
pub unsafe trait PoolSource {
    /// Obtain a memory region of at least `min_size` bytes.
    ///
    /// # Safety
    ///
    /// `min_size` must be non-zero and a multiple of [`ALIGN`].
    unsafe fn alloc_pool(&mut self, min_size: usize) -> Option<NonNull<[u8]>>;

    /// Return a region previously obtained from [`Self::alloc_pool`].
    ///
    /// # Safety
    ///
    /// `pool` must denote, bounds included, exactly one live region
    /// returned by this source.
    unsafe fn dealloc_pool(&mut self, pool: NonNull<[u8]>);
}

/// Wraps [`core::alloc::GlobalAlloc`] to implement the [`PoolSource`]
/// trait.
#[derive(Default, Debug, Copy, Clone)]
pub struct GlobalAllocAsPoolSource<A>(pub A);

impl<A: Init> Init for GlobalAllocAsPoolSource<A> {
    const INIT: Self = Self(A::INIT);
}

unsafe impl<A: core::alloc::GlobalAlloc> PoolSource for GlobalAllocAsPoolSource<A> {
    #[inline]
    unsafe fn alloc_pool(&mut self, min_size: usize) -> Option<NonNull<[u8]>> {
        // Padding to the alignment keeps the region's end aligned too.
        let layout = core::alloc::Layout::from_size_align(min_size, ALIGN)
            .ok()?
            .pad_to_align();
        let start = NonNull::new(self.0.alloc(layout))?;
        Some(nonnull_slice_from_raw_parts(start, layout.size()))
    }

    #[inline]
    unsafe fn dealloc_pool(&mut self, pool: NonNull<[u8]>) {
        // Safety: this layout was checked for validity during allocation
        let layout =
            core::alloc::Layout::from_size_align_unchecked(nonnull_slice_len(pool), ALIGN);
        self.0.dealloc(pool.as_ptr() as *mut u8, layout);
    }
}

/// Roster link stored inside a pool's sentinel header.
///
/// The sentinel never enters a free list, so its two list-link words are
/// dead storage the engine will not touch; they are exactly large enough
/// to record the previous pool's whereabouts, forming a singly-linked
/// roster with no allocation of its own.
#[repr(C)]
#[derive(Copy, Clone)]
struct PoolLink {
    prev_pool: Option<NonNull<[u8]>>,
}

const _: () = assert!(mem::size_of::<PoolLink>() <= 2 * mem::size_of::<usize>());
const _: () = assert!(mem::align_of::<PoolLink>() <= ALIGN);

impl PoolLink {
    /// The link slot of the pool `pool`: the first list-link word of the
    /// sentinel header sitting at the pool's end.
    #[inline]
    fn slot(pool: NonNull<[u8]>) -> *mut PoolLink {
        (nonnull_slice_end(pool) as usize - HEADER_SIZE + mem::size_of::<usize>())
            as *mut PoolLink
    }
}

/// A [`Tlsf`] that owns the memory pools backing it.
///
/// Pools are obtained from a [`PoolSource`] with [`Self::supply`] and
/// kept on an intrusive roster; [`Self::destruct`] (also run on drop)
/// walks the roster and returns every pool to the source.
#[derive(Debug)]
pub struct PooledTlsf<S: PoolSource> {
    source: S,
    tlsf: Tlsf<'static>,
    /// Roster head: the most recently supplied pool.
    last_pool: Option<NonNull<[u8]>>,
}

// Safety: the roster pointers are owned by this object just like the
//         engine's block headers.
unsafe impl<S: PoolSource + Send> Send for PooledTlsf<S> {}
unsafe impl<S: PoolSource + Sync> Sync for PooledTlsf<S> {}

/// Initialization with a [`PoolSource`] provided by [`Default::default`]
impl<S: PoolSource + Default> Default for PooledTlsf<S> {
    #[inline]
    fn default() -> Self {
        Self::new(S::default())
    }
}

/// Initialization with a [`PoolSource`] provided by [`Init::INIT`]
impl<S: PoolSource + Init> Init for PooledTlsf<S> {
    const INIT: Self = Self {
        source: S::INIT,
        tlsf: Tlsf::INIT,
        last_pool: None,
    };
}

impl<S: PoolSource> PooledTlsf<S> {
    /// Construct a new `PooledTlsf` object.
    #[inline]
    pub fn new(source: S) -> Self {
        Self {
            source,
            tlsf: Tlsf::INIT,
            last_pool: None,
        }
    }

    /// Borrow the contained `PoolSource`.
    #[inline]
    pub fn source_ref(&self) -> &S {
        &self.source
    }

    /// Obtain a fresh pool with at least `min_size` usable payload bytes
    /// from the source and hand it to the engine.
    ///
    /// Returns `None` when the source declines or produces a region the
    /// engine cannot use as a single pool; such a region is returned to
    /// the source immediately.
    pub fn supply(&mut self, min_size: usize) -> Option<()> {
        // The pool carries its own header and the sentinel, and the
        // engine insists on at least one granule of payload.
        let request = min_size
            .checked_add(HEADER_SIZE * 2 + ALIGN)?
            .checked_add(ALIGN - 1)?
            & !(ALIGN - 1);

        // Safety: `request` is non-zero and a multiple of `ALIGN`.
        let pool = unsafe { self.source.alloc_pool(request)? };
        debug_assert_eq!(nonnull_slice_start(pool).as_ptr() as usize % ALIGN, 0);
        debug_assert_eq!(nonnull_slice_len(pool) % ALIGN, 0);

        if nonnull_slice_len(pool) > crate::tlsf::MAX_POOL_SIZE {
            // Longer than the index can describe as a single block; the
            // engine would trim it and orphan the tail from the roster.
            unsafe { self.source.dealloc_pool(pool) };
            return None;
        }

        // Safety: the region was just obtained from the source, whose
        //         contract makes it exclusively ours until dealloc.
        match unsafe { self.tlsf.insert_free_block_ptr(pool) } {
            Some([start, end]) => {
                debug_assert_eq!(start.as_ptr(), nonnull_slice_start(pool).as_ptr());
                debug_assert_eq!(end.as_ptr(), nonnull_slice_end(pool));

                // Thread the pool onto the roster through its sentinel.
                // Safety: the slot lies inside the sentinel header of the
                //         pool we own.
                unsafe {
                    *PoolLink::slot(pool) = PoolLink {
                        prev_pool: self.last_pool,
                    };
                }
                self.last_pool = Some(pool);
                Some(())
            }
            None => {
                // The source returned less than the engine minimum.
                unsafe { self.source.dealloc_pool(pool) };
                None
            }
        }
    }

    /// Attempt to allocate `size` bytes.
    ///
    /// Returns the starting address of the payload on success; `None`
    /// when `size` is zero or no pool has a fitting free block. Pools are
    /// never grown implicitly; add memory with [`Self::supply`].
    #[inline]
    pub fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
        self.tlsf.allocate(size)
    }

    /// Deallocate a previously allocated memory block.
    ///
    /// # Safety
    ///
    /// `ptr` must denote a live memory block previously returned by
    /// [`Self::allocate`] on `self`.
    #[inline]
    pub unsafe fn deallocate(&mut self, ptr: NonNull<u8>) {
        self.tlsf.deallocate(ptr)
    }

    /// The number of bytes managed on behalf of callers.
    #[inline]
    pub fn total_memory(&self) -> usize {
        self.tlsf.total_memory()
    }

    /// The number of bytes currently held in free blocks.
    #[inline]
    pub fn free_memory(&self) -> usize {
        self.tlsf.free_memory()
    }

    /// Return every pool to the source and reset the manager to its
    /// freshly constructed state. Outstanding allocations become dangling;
    /// the manager can be supplied and used again afterwards.
    pub fn destruct(&mut self) {
        let mut cur = self.last_pool.take();
        while let Some(pool) = cur {
            // Read the roster link before the pool goes away.
            // Safety: the slot lies inside the sentinel header of a pool
            //         we still own; the pool itself came from the source.
            unsafe {
                cur = (*PoolLink::slot(pool)).prev_pool;
                self.source.dealloc_pool(pool);
            }
        }
        self.tlsf = Tlsf::INIT;
    }
}

impl<S: PoolSource> Drop for PooledTlsf<S> {
    fn drop(&mut self) {
        self.destruct();
    }
}
