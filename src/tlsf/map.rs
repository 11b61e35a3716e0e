//! Size-to-index mapping for the two-level free-list matrix.
use super::{FL_BASE, FL_LEN, HEADER_SIZE, SL_LEN_LOG2, SMALL_LIMIT, SMALL_STRIDE, SMALL_STRIDE_LOG2};
use crate::bits::msb;

/// Map a block size to the `(fl, sl)` cell whose free list stores blocks
/// of that size. Returns `None` when the size exceeds the indexable
/// range.
#[inline]
pub(super) fn map_block(size: usize) -> Option<(usize, usize)> {
    if size < SMALL_LIMIT {
        Some((0, size >> SMALL_STRIDE_LOG2))
    } else {
        let k = msb(size);
        let fl = (k - FL_BASE) as usize;
        if fl >= FL_LEN {
            return None;
        }

        // The SL_LEN_LOG2 bits right below the leading one; the xor
        // strips the leading one itself.
        let sl = (size >> (k - SL_LEN_LOG2)) ^ (1 << SL_LEN_LOG2);
        Some((fl, sl))
    }
}

/// Map a payload request to the cell where the good-fit search starts.
///
/// The request grows by the header it will be stored behind, then by one
/// second-level stride at its magnitude, so that *any* block found at or
/// above the returned cell is large enough. This trades a bounded amount
/// of internal fragmentation for a search that never scans a list.
#[inline]
pub(super) fn map_request(size: usize) -> Option<(usize, usize)> {
    let mut size = size.checked_add(HEADER_SIZE)?;
    if size >= SMALL_LIMIT {
        size = size.checked_add((1 << (msb(size) - SL_LEN_LOG2)) - 1)?;
    } else {
        size += SMALL_STRIDE;
    }
    map_block(size)
}
