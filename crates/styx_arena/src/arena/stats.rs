//! # Arena Statistics
//!
//! Diagnostic snapshot of arena occupancy, produced by
//! [`BlockArena::stats`](crate::BlockArena::stats).

/// Occupancy snapshot of a block arena.
///
/// Produced by walking the address-ordered chain, so it is exact at the
/// moment of the call. Intended for diagnostics, budget overlays, and
/// tests; not for per-allocation hot paths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Total managed capacity in bytes.
    pub capacity: u32,
    /// Bytes in Free blocks, available to allocate.
    pub free_bytes: u32,
    /// Bytes in blocks currently owned by callers.
    pub allocated_bytes: u32,
    /// Bytes released but still aging in quarantine.
    pub quarantined_bytes: u32,
    /// Number of Free blocks.
    pub free_blocks: usize,
    /// Number of Allocated blocks.
    pub allocated_blocks: usize,
    /// Number of Quarantined blocks.
    pub quarantined_blocks: usize,
    /// Descriptor slots currently unused (the dead list).
    pub dead_slots: usize,
    /// Size of the largest single Free block, in bytes. The upper bound on
    /// what the next allocation can get.
    pub largest_free_block: u32,
}

impl ArenaStats {
    /// Total bytes tracked across all live blocks.
    ///
    /// Equals [`capacity`](Self::capacity) at all times; anything else
    /// means the chain has been corrupted.
    #[inline]
    #[must_use]
    pub const fn tracked_bytes(&self) -> u32 {
        self.free_bytes + self.allocated_bytes + self.quarantined_bytes
    }

    /// Number of blocks currently representing a byte range.
    #[inline]
    #[must_use]
    pub const fn live_blocks(&self) -> usize {
        self.free_blocks + self.allocated_blocks + self.quarantined_blocks
    }
}
