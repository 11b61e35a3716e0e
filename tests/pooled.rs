//! End-to-end exercise of the public API.
use segfit::{GlobalAllocAsPoolSource, PooledTlsf, Tlsf, ALIGN, HEADER_SIZE};
use std::mem::MaybeUninit;

#[test]
fn borrowed_pool() {
    let mut pool = [MaybeUninit::uninit(); 65536];
    let mut tlsf = Tlsf::new();
    tlsf.insert_free_block(&mut pool);

    let initial = tlsf.free_memory();
    assert_eq!(initial, tlsf.total_memory());

    let ptr = tlsf.allocate(128).unwrap();
    assert_eq!(ptr.as_ptr() as usize % ALIGN, 0);
    assert_eq!(tlsf.free_memory(), initial - 128 - HEADER_SIZE);

    unsafe { tlsf.deallocate(ptr) };
    assert_eq!(tlsf.free_memory(), initial);
}

#[test]
fn owned_pools() {
    let mut tlsf = PooledTlsf::new(GlobalAllocAsPoolSource(std::alloc::System));
    tlsf.supply(1 << 16).unwrap();
    tlsf.supply(1 << 16).unwrap();

    // Payloads must be disjoint, aligned, writable memory.
    let mut live = Vec::new();
    for i in 0..64u8 {
        let ptr = tlsf.allocate(777).unwrap();
        unsafe { core::ptr::write_bytes(ptr.as_ptr(), i, 777) };
        live.push((ptr, i));
    }
    for &(ptr, i) in &live {
        unsafe {
            assert_eq!(*ptr.as_ptr(), i);
            assert_eq!(*ptr.as_ptr().add(776), i);
        }
    }
    for (ptr, _) in live.drain(..) {
        unsafe { tlsf.deallocate(ptr) };
    }
    assert_eq!(tlsf.free_memory(), tlsf.total_memory());

    tlsf.destruct();
    assert_eq!(tlsf.total_memory(), 0);
}
