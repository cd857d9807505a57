//! # Arena Internals
//!
//! The block arena is built from four pieces:
//! - A fixed descriptor table ([`block`]) linked by indices: one
//!   address-ordered chain over every block, per-class free lists, and a
//!   quarantine queue.
//! - Size-class math ([`size_class`]) bucketing free blocks by
//!   power-of-two ranges for O(class-count) lookup.
//! - The allocator itself ([`arena`]): allocate/split, release into
//!   quarantine, and the per-cycle tick that ages and coalesces.
//! - Diagnostics ([`stats`]): chain-walk occupancy snapshots.

mod arena;
mod block;
mod size_class;
mod stats;

pub use arena::{BlockArena, DEFAULT_QUARANTINE_CYCLES};
pub use block::{BlockHandle, BlockView};
pub use stats::ArenaStats;
