//! Shared test harness.
use std::{collections::BTreeMap, ops::Range, prelude::v1::*, ptr::NonNull};

use crate::ALIGN;

/// Mirrors every operation performed on a real manager, tracking which
/// kind of region each address belongs to, and panics on any
/// disagreement: payloads overlapping each other, allocations landing
/// outside pool memory, or misaligned pointers.
pub struct ShadowAllocator {
    /// Boundaries of maximal same-kind runs; the entry at `a` gives the
    /// kind of every address in `[a, next boundary)`.
    regions: BTreeMap<usize, SaRegion>,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SaRegion {
    Free,
    Used,
    Invalid,
}

impl Default for ShadowAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadowAllocator {
    pub fn new() -> Self {
        Self {
            regions: Some((0, SaRegion::Invalid)).into_iter().collect(),
        }
    }

    pub fn convert_range(&mut self, range: Range<usize>, old: SaRegion, new: SaRegion) {
        if range.len() == 0 {
            return;
        }

        assert_ne!(old, new);
        log::trace!("sa: converting {:?} from {:?} to {:?}", range, old, new);

        // The whole range must lie inside one run of kind `old`: the last
        // boundary below `range.end` may not sit inside the range, and it
        // must carry `old`.
        let (&addr, &kind) = self.regions.range(..range.end).next_back().unwrap();
        assert!(
            addr <= range.start,
            "range {:?} straddles a region boundary at {:#x}",
            range,
            addr
        );
        assert_eq!(
            kind, old,
            "range {:?} is {:?} (expected {:?})",
            range, kind, old
        );

        // Move the boundary at `range.start`, folding it into an
        // equal-kind predecessor.
        if addr == range.start {
            *self.regions.get_mut(&addr).unwrap() = new;
        } else {
            self.regions.insert(range.start, new);
        }
        if let Some((_, &before)) = self.regions.range(..range.start).next_back() {
            if before == new {
                self.regions.remove(&range.start);
            }
        }

        // Same at `range.end`: the remainder of the old run continues
        // there unless an equal-kind run already does.
        match self.regions.get(&range.end) {
            Some(&after) if after == new => {
                self.regions.remove(&range.end);
            }
            Some(_) => {}
            None => {
                self.regions.insert(range.end, old);
            }
        }
    }

    pub fn insert_free_block(&mut self, start: NonNull<u8>, len: usize) {
        let start = start.as_ptr() as usize;
        self.convert_range(start..start + len, SaRegion::Invalid, SaRegion::Free);
    }

    pub fn allocate(&mut self, size: usize, start: NonNull<u8>) {
        let start = start.as_ptr() as usize;
        assert!(
            start % ALIGN == 0,
            "{:#x} is not aligned to {} bytes",
            start,
            ALIGN
        );
        self.convert_range(start..start + size, SaRegion::Free, SaRegion::Used);
    }

    pub fn deallocate(&mut self, size: usize, start: NonNull<u8>) {
        let start = start.as_ptr() as usize;
        self.convert_range(start..start + size, SaRegion::Used, SaRegion::Free);
    }
}
