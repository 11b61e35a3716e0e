//! This crate implements the TLSF (Two-Level Segregated Fit) dynamic memory
//! allocation algorithm¹.
//!
//!  - **Bounded execution time.** Every allocation and deallocation completes
//!    in a constant number of bit scans and pointer updates, making the
//!    allocator usable where the worst-case latency of a general-purpose
//!    heap is unacceptable.
//!
//!  - **The memory pools are provided by an application.** A pool can be a
//!    `static` array, a region carved out of another allocator, or anything
//!    else that satisfies [`Tlsf::insert_free_block_ptr`]'s contract. The
//!    [`PooledTlsf`] wrapper additionally keeps a roster of the pools it
//!    obtained from a [`PoolSource`] and returns them wholesale on teardown.
//!
//!  - **This crate supports `#![no_std]`.** It can be used in bare-metal and
//!    RTOS-based applications.
//!
//! <sub>¹ M. Masmano, I. Ripoll, A. Crespo and J. Real, "TLSF: a new dynamic
//! memory allocator for real-time systems," *Proceedings. 16th Euromicro
//! Conference on Real-Time Systems*, 2004. ECRTS 2004., Catania, Italy, 2004,
//! pp. 79-88, doi: 10.1109/EMRTS.2004.1311009.</sub>
//!
//! # Examples
//!
//! ## `Tlsf`: Core API
//!
//! ```rust
//! use segfit::Tlsf;
//! use std::mem::MaybeUninit;
//!
//! // `'pool` represents the memory pool's lifetime (`pool` in this case).
//! let mut pool = [MaybeUninit::uninit(); 65536];
//! let mut tlsf = Tlsf::new();
//! tlsf.insert_free_block(&mut pool);
//!
//! unsafe {
//!     let mut ptr1 = tlsf.allocate(4).unwrap().cast::<u32>();
//!     let mut ptr2 = tlsf.allocate(4).unwrap().cast::<u32>();
//!     *ptr1.as_mut() = 42;
//!     *ptr2.as_mut() = 56;
//!     assert_eq!(*ptr1.as_ref(), 42);
//!     assert_eq!(*ptr2.as_ref(), 56);
//!     tlsf.deallocate(ptr1.cast());
//!     tlsf.deallocate(ptr2.cast());
//! }
//! ```
//!
//! ## `PooledTlsf`: Owned pools
//!
//! ```rust
//! use segfit::{GlobalAllocAsPoolSource, PooledTlsf};
//!
//! let mut tlsf = PooledTlsf::new(GlobalAllocAsPoolSource(std::alloc::System));
//! tlsf.supply(65536).unwrap();
//!
//! let ptr = tlsf.allocate(256).unwrap();
//! assert_eq!(ptr.as_ptr() as usize % segfit::ALIGN, 0);
//! unsafe { tlsf.deallocate(ptr) };
//! // dropping `tlsf` returns every pool to `System`
//! ```
//!
//! # Details
//!
//! ## Changes from the Original Algorithm
//!
//!  - The end of each memory pool is capped by a sentinel block (a
//!    zero-sized, permanently occupied header) instead of a normal block
//!    with a last-block-in-pool flag. The sentinel doubles as the walk
//!    terminator and, in [`PooledTlsf`], as storage for the pool roster.
//!
//! ## Alignment
//!
//! Payload pointers are aligned to [`ALIGN`] bytes: 4 bytes on 32-bit
//! targets, widened to the block header's own alignment (8 bytes) on 64-bit
//! targets. Requests with a stronger alignment requirement are not
//! supported.
#![no_std]
#![cfg_attr(feature = "doc_cfg", feature(doc_cfg))]

mod bits;
mod init;
mod pool;
mod tlsf;
mod utils;
pub use self::{
    init::Init,
    pool::*,
    tlsf::{Tlsf, ALIGN, FL_LEN, HEADER_SIZE, SL_LEN},
};

#[cfg(any(test, feature = "std"))]
extern crate std;

#[cfg(test)]
mod tests;
