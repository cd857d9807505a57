//! # Block Arena
//!
//! The allocator itself: segregated free lists over a fixed descriptor
//! table, with quarantine-deferred reclamation.

use crate::config::ArenaConfig;
use crate::error::{ArenaError, ArenaResult};

use super::block::{Block, BlockHandle, BlockState, BlockView, NIL};
use super::size_class::{class_count_for, class_of, round_up, MIN_BLOCK_SIZE};
use super::stats::ArenaStats;

/// Default number of ticks a released block stays in quarantine.
///
/// Two cycles covers the standard producer/consumer overlap: the consumer
/// reading frame N's data while the producer records frame N+1.
pub const DEFAULT_QUARANTINE_CYCLES: u32 = 2;

/// A fixed-capacity sub-allocator over one pre-reserved byte range.
///
/// The arena partitions `[0, capacity)` into variably-sized blocks and
/// hands out offsets into it. All bookkeeping memory (the descriptor
/// table, bucket heads, and dead-slot stack) is allocated once at
/// construction and never resized; no operation touches a general-purpose
/// allocator afterwards.
///
/// Released blocks are not reusable immediately: they sit in a quarantine
/// queue for a fixed number of [`tick`](Self::tick) calls first, so a
/// consumer still reading the range (a later pipeline stage, the GPU) is
/// never handed aliasing data. Reclamation happens only inside `tick`,
/// where aged-out blocks are coalesced with free physical neighbors.
///
/// # Capacity
///
/// The arena never grows. [`allocate`](Self::allocate) returning
/// [`ArenaError::OutOfSpace`] is an ordinary outcome the caller must
/// handle, not a failure of the arena.
///
/// # Thread Safety
///
/// The arena performs no locking. All methods take `&mut self`; wrap the
/// arena in whatever mutual exclusion the owning system already has if it
/// must be shared.
///
/// # Teardown
///
/// Dropping the arena releases all bookkeeping at once. Outstanding
/// blocks are not individually finalized; their handles simply die with
/// the arena.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = BlockArena::new(64 * 1024 * 1024, 4096, 256);
///
/// let handle = arena.allocate(16 * 1024)?;
/// let view = arena.get(handle).unwrap();
/// upload_buffer[view.offset as usize..][..view.size as usize]
///     .copy_from_slice(&staging);
///
/// arena.release(handle);
/// // ... once per cycle, after the consumer has moved on:
/// arena.tick();
/// ```
pub struct BlockArena {
    /// The fixed descriptor table. Sole source and sink of blocks.
    blocks: Box<[Block]>,
    /// Head descriptor index per size class, `NIL` when empty.
    bucket_heads: Box<[u32]>,
    /// Stack of unused descriptor slots. Pre-reserved; never reallocates.
    dead: Vec<u32>,
    /// Oldest entry of the quarantine FIFO.
    quarantine_head: u32,
    /// Newest entry of the quarantine FIFO.
    quarantine_tail: u32,
    /// First descriptor of the address-ordered chain. Never retired: the
    /// block at offset zero has no physical predecessor to merge into.
    chain_head: u32,
    /// Total managed capacity in bytes.
    capacity: u32,
    /// Alignment minus one, for mask rounding.
    align_mask: u32,
    /// Ticks a released block ages before its bytes may be reused.
    quarantine_cycles: u32,
}

impl BlockArena {
    /// Creates an arena managing `capacity` bytes with a descriptor table
    /// of `max_blocks` slots, rounding every request up to `alignment`.
    ///
    /// Uses [`DEFAULT_QUARANTINE_CYCLES`]; build from an [`ArenaConfig`]
    /// to choose a different quarantine depth.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or not a multiple of `alignment`, if
    /// `max_blocks` is zero, or if `alignment` is not a power of two.
    /// These are trusted preconditions of the owning system, not
    /// recoverable conditions.
    #[must_use]
    pub fn new(capacity: u32, max_blocks: u32, alignment: u32) -> Self {
        Self::build(capacity, max_blocks, alignment, DEFAULT_QUARANTINE_CYCLES)
    }

    /// Creates an arena from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] if the configuration fails
    /// [`ArenaConfig::validate`].
    pub fn from_config(config: &ArenaConfig) -> ArenaResult<Self> {
        config.validate()?;
        Ok(Self::build(
            config.capacity,
            config.max_blocks,
            config.alignment,
            config.quarantine_cycles,
        ))
    }

    fn build(capacity: u32, max_blocks: u32, alignment: u32, quarantine_cycles: u32) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(max_blocks >= 1, "At least one block descriptor is required");
        assert!(
            alignment.is_power_of_two(),
            "Alignment must be a power of two"
        );
        assert!(
            capacity % alignment == 0,
            "Capacity must be a multiple of the alignment"
        );
        assert!(
            quarantine_cycles >= 1,
            "Quarantine depth must be at least one tick"
        );

        // Pre-allocate the descriptor table; slot 0 spans the whole range.
        let mut blocks: Vec<Block> = (0..max_blocks).map(|_| Block::dead()).collect();
        blocks[0] = Block::spanning(capacity);

        // Remaining slots go on the dead stack, lowest index on top.
        let dead: Vec<u32> = (1..max_blocks).rev().collect();

        let class_count = class_count_for(capacity);
        let mut arena = Self {
            blocks: blocks.into_boxed_slice(),
            bucket_heads: vec![NIL; class_count].into_boxed_slice(),
            dead,
            quarantine_head: NIL,
            quarantine_tail: NIL,
            chain_head: 0,
            capacity,
            align_mask: alignment - 1,
            quarantine_cycles,
        };
        arena.register(0);
        arena
    }

    /// Returns the total managed capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns the allocation alignment in bytes.
    #[inline]
    #[must_use]
    pub const fn alignment(&self) -> u32 {
        self.align_mask + 1
    }

    /// Returns the number of ticks a released block stays quarantined.
    #[inline]
    #[must_use]
    pub const fn quarantine_cycles(&self) -> u32 {
        self.quarantine_cycles
    }

    /// Allocates a block of at least `size` bytes.
    ///
    /// The request is rounded up to the alignment boundary; the handle's
    /// [`BlockView::size`] reports the rounded size. The search is a
    /// first-fit scan of the request's own size class followed by the
    /// first block of the first nonempty larger class. Not a global best
    /// fit: search cost stays bounded by the class count, at the price of
    /// some packing slack.
    ///
    /// When the descriptor table has no spare slot to carve a remainder,
    /// the whole found block is handed out unsplit. That degrades packing
    /// but never correctness, and heals once quarantined blocks return
    /// their descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::OutOfSpace`] when no free block can hold the
    /// rounded request. Recoverable: space may reappear after
    /// [`tick`](Self::tick) drains the quarantine.
    pub fn allocate(&mut self, size: u32) -> ArenaResult<BlockHandle> {
        let Some(rounded) = round_up(size, self.align_mask) else {
            return Err(ArenaError::OutOfSpace { requested: size });
        };
        let class = class_of(rounded, self.bucket_heads.len());

        // Own class first: sizes in here straddle the request, so scan.
        let mut cursor = self.bucket_heads[class];
        while cursor != NIL {
            let block = &self.blocks[cursor as usize];
            if block.size >= rounded {
                return Ok(self.split(cursor, rounded));
            }
            cursor = block.free_next;
        }

        // Any block in a strictly larger class is big enough; take the
        // first one found rather than hunting for the tightest fit.
        for larger in class + 1..self.bucket_heads.len() {
            let head = self.bucket_heads[larger];
            if head != NIL {
                return Ok(self.split(head, rounded));
            }
        }

        Err(ArenaError::OutOfSpace { requested: size })
    }

    /// Releases a block back to the arena.
    ///
    /// The block is queued in quarantine, not freed: its bytes stay
    /// untouched for [`quarantine_cycles`](Self::quarantine_cycles) ticks
    /// so any consumer still reading them finishes safely. Physical
    /// reclamation and coalescing happen later, inside
    /// [`tick`](Self::tick).
    ///
    /// # Returns
    ///
    /// `true` if the block entered quarantine; `false` (with no state
    /// change) if the handle is stale — already released, never issued by
    /// this arena, or outliving a recycled descriptor slot.
    pub fn release(&mut self, handle: BlockHandle) -> bool {
        let index = handle.index();
        let Some(block) = self.blocks.get_mut(index as usize) else {
            return false;
        };
        if block.state != BlockState::Allocated || block.generation != handle.generation() {
            return false;
        }

        block.state = BlockState::Quarantined;
        block.age = self.quarantine_cycles;
        block.quarantine_next = NIL;

        let tail = self.quarantine_tail;
        if tail == NIL {
            self.quarantine_head = index;
        } else {
            self.blocks[tail as usize].quarantine_next = index;
        }
        self.quarantine_tail = index;
        true
    }

    /// Ages the quarantine queue. Call once per cycle, after the slowest
    /// consumer of the previous cycle's data has moved on.
    ///
    /// Every queued block's age drops by one; blocks reaching zero are
    /// unlinked, coalesced with free physical neighbors, and become
    /// allocatable again. This is the only place reclamation happens:
    /// calling it less often only widens the safe-reuse delay.
    pub fn tick(&mut self) {
        let mut prev = NIL;
        let mut cursor = self.quarantine_head;
        while cursor != NIL {
            let next = self.blocks[cursor as usize].quarantine_next;
            let age = {
                let block = &mut self.blocks[cursor as usize];
                debug_assert_eq!(block.state, BlockState::Quarantined);
                debug_assert!(block.age > 0, "quarantined block already aged out");
                block.age -= 1;
                block.age
            };
            if age == 0 {
                if prev == NIL {
                    self.quarantine_head = next;
                } else {
                    self.blocks[prev as usize].quarantine_next = next;
                }
                if self.quarantine_tail == cursor {
                    self.quarantine_tail = prev;
                }
                self.blocks[cursor as usize].quarantine_next = NIL;
                self.reclaim(cursor);
            } else {
                prev = cursor;
            }
            cursor = next;
        }
    }

    /// Resolves a handle to its current placement.
    ///
    /// # Returns
    ///
    /// The block's offset and rounded size while the handle is live;
    /// `None` once the block has been released or the handle is stale.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: BlockHandle) -> Option<BlockView> {
        let block = self.blocks.get(handle.index() as usize)?;
        if block.state != BlockState::Allocated || block.generation != handle.generation() {
            return None;
        }
        Some(BlockView {
            offset: block.start,
            size: block.size,
        })
    }

    /// Takes an occupancy snapshot by walking the address-ordered chain.
    ///
    /// O(live blocks); meant for diagnostics and tests, not hot paths.
    /// Debug builds verify chain contiguity during the walk.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        let mut stats = ArenaStats {
            capacity: self.capacity,
            dead_slots: self.dead.len(),
            ..ArenaStats::default()
        };

        let mut expected_start = 0u32;
        let mut cursor = self.chain_head;
        while cursor != NIL {
            let block = &self.blocks[cursor as usize];
            debug_assert_eq!(block.start, expected_start, "chain has a gap or overlap");
            expected_start = block.start + block.size;

            match block.state {
                BlockState::Free => {
                    stats.free_bytes += block.size;
                    stats.free_blocks += 1;
                    stats.largest_free_block = stats.largest_free_block.max(block.size);
                }
                BlockState::Allocated => {
                    stats.allocated_bytes += block.size;
                    stats.allocated_blocks += 1;
                }
                BlockState::Quarantined => {
                    stats.quarantined_bytes += block.size;
                    stats.quarantined_blocks += 1;
                }
                BlockState::Dead => {
                    debug_assert!(false, "dead descriptor linked into the chain");
                }
            }
            cursor = block.chain_next;
        }
        debug_assert_eq!(expected_start, self.capacity, "chain must cover the capacity");

        stats
    }

    // =========================================================================
    // Free-list bookkeeping
    // =========================================================================

    /// Pushes a Free block onto the head of its size-class bucket.
    fn register(&mut self, index: u32) {
        debug_assert_eq!(self.blocks[index as usize].state, BlockState::Free);
        let class = class_of(self.blocks[index as usize].size, self.bucket_heads.len());
        let head = self.bucket_heads[class];
        {
            let block = &mut self.blocks[index as usize];
            block.free_prev = NIL;
            block.free_next = head;
        }
        if head != NIL {
            self.blocks[head as usize].free_prev = index;
        }
        self.bucket_heads[class] = index;
    }

    /// Unlinks a Free block from its size-class bucket.
    ///
    /// Must run before the block's size changes: the bucket is derived
    /// from the size it was registered under.
    fn unregister(&mut self, index: u32) {
        let (free_prev, free_next, size) = {
            let block = &self.blocks[index as usize];
            debug_assert_eq!(block.state, BlockState::Free);
            (block.free_prev, block.free_next, block.size)
        };

        if free_prev == NIL {
            let class = class_of(size, self.bucket_heads.len());
            debug_assert_eq!(self.bucket_heads[class], index, "bucket head mismatch");
            self.bucket_heads[class] = free_next;
        } else {
            self.blocks[free_prev as usize].free_next = free_next;
        }
        if free_next != NIL {
            self.blocks[free_next as usize].free_prev = free_prev;
        }

        let block = &mut self.blocks[index as usize];
        block.free_prev = NIL;
        block.free_next = NIL;
    }

    /// Marks a descriptor Dead and returns its slot to the dead stack.
    /// The generation survives so stale handles to the slot stay stale.
    fn retire(&mut self, index: u32) {
        let block = &mut self.blocks[index as usize];
        let generation = block.generation;
        *block = Block::dead();
        block.generation = generation;
        self.dead.push(index);
    }

    // =========================================================================
    // Split and coalesce
    // =========================================================================

    /// Converts a Free block into an Allocated one of `rounded` bytes,
    /// carving the remainder into a new Free block when worthwhile.
    ///
    /// The remainder is only carved when it meets the minimum block size
    /// AND a spare descriptor slot exists; otherwise the whole block goes
    /// out at its original size.
    fn split(&mut self, index: u32, rounded: u32) -> BlockHandle {
        debug_assert!(self.blocks[index as usize].size >= rounded);
        self.unregister(index);

        let leftover = self.blocks[index as usize].size - rounded;
        if leftover >= MIN_BLOCK_SIZE {
            if let Some(spare) = self.dead.pop() {
                let (start, chain_next) = {
                    let block = &self.blocks[index as usize];
                    (block.start, block.chain_next)
                };
                {
                    let remainder = &mut self.blocks[spare as usize];
                    remainder.start = start + rounded;
                    remainder.size = leftover;
                    remainder.state = BlockState::Free;
                    remainder.chain_prev = index;
                    remainder.chain_next = chain_next;
                }
                if chain_next != NIL {
                    self.blocks[chain_next as usize].chain_prev = spare;
                }
                {
                    let block = &mut self.blocks[index as usize];
                    block.chain_next = spare;
                    block.size = rounded;
                }
                self.register(spare);
            } else {
                tracing::debug!(
                    "descriptor table exhausted, handing out {} spare bytes unsplit",
                    leftover
                );
            }
        }

        let block = &mut self.blocks[index as usize];
        block.state = BlockState::Allocated;
        block.generation = block.generation.wrapping_add(1);
        BlockHandle::new(index, block.generation)
    }

    /// Returns an aged-out quarantined block to circulation, merging it
    /// with whichever physical neighbors are Free.
    ///
    /// Neighbors are maximal free runs by invariant, so one local check
    /// suffices; merging never cascades.
    fn reclaim(&mut self, index: u32) {
        let (chain_prev, chain_next) = {
            let block = &self.blocks[index as usize];
            debug_assert_eq!(block.state, BlockState::Quarantined);
            (block.chain_prev, block.chain_next)
        };
        let prev_free =
            chain_prev != NIL && self.blocks[chain_prev as usize].state == BlockState::Free;
        let next_free =
            chain_next != NIL && self.blocks[chain_next as usize].state == BlockState::Free;

        match (prev_free, next_free) {
            (true, true) => {
                // prev absorbs this block and next; two slots come back.
                self.unregister(chain_prev);
                self.unregister(chain_next);
                let absorbed =
                    self.blocks[index as usize].size + self.blocks[chain_next as usize].size;
                let after = self.blocks[chain_next as usize].chain_next;
                {
                    let prev = &mut self.blocks[chain_prev as usize];
                    prev.size += absorbed;
                    prev.chain_next = after;
                }
                if after != NIL {
                    self.blocks[after as usize].chain_prev = chain_prev;
                }
                self.retire(index);
                self.retire(chain_next);
                self.register(chain_prev);
                tracing::trace!("reclaimed block merged with both neighbors");
            }
            (false, true) => {
                // This block absorbs next.
                self.unregister(chain_next);
                let next_size = self.blocks[chain_next as usize].size;
                let after = self.blocks[chain_next as usize].chain_next;
                {
                    let block = &mut self.blocks[index as usize];
                    block.size += next_size;
                    block.chain_next = after;
                    block.state = BlockState::Free;
                }
                if after != NIL {
                    self.blocks[after as usize].chain_prev = index;
                }
                self.retire(chain_next);
                self.register(index);
                tracing::trace!("reclaimed block merged with following neighbor");
            }
            (true, false) => {
                // prev absorbs this block.
                self.unregister(chain_prev);
                let size = self.blocks[index as usize].size;
                {
                    let prev = &mut self.blocks[chain_prev as usize];
                    prev.size += size;
                    prev.chain_next = chain_next;
                }
                if chain_next != NIL {
                    self.blocks[chain_next as usize].chain_prev = chain_prev;
                }
                self.retire(index);
                self.register(chain_prev);
                tracing::trace!("reclaimed block merged with preceding neighbor");
            }
            (false, false) => {
                self.blocks[index as usize].state = BlockState::Free;
                self.register(index);
            }
        }
    }
}
