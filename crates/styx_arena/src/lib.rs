//! # STYX Arena
//!
//! Fixed-capacity block arena for streaming memory regions: upload
//! buffers, per-cycle transient storage, anything carved out of one large
//! pre-reserved range that must never touch a general-purpose allocator
//! after startup.
//!
//! ## Architecture Rules
//!
//! 1. **One allocation, at construction** - descriptor table, buckets,
//!    and dead stack are sized once and never resized
//! 2. **Cheap allocation** - segregated power-of-two free lists, first
//!    fit, bounded search
//! 3. **Deferred reclamation** - released blocks sit in quarantine for a
//!    fixed number of ticks before their bytes can be reused, so in-flight
//!    consumers never read recycled data
//!
//! ## Example
//!
//! ```rust,ignore
//! use styx_arena::{ArenaConfig, BlockArena};
//!
//! let mut arena = BlockArena::from_config(&ArenaConfig::upload_heap())?;
//!
//! let handle = arena.allocate(vertex_bytes.len() as u32)?;
//! let view = arena.get(handle).unwrap();
//! // write vertex_bytes at view.offset in the mapped upload buffer ...
//!
//! arena.release(handle);   // consumer may still be reading
//! arena.tick();            // once per cycle: age quarantine, coalesce
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod arena;
pub mod config;
pub mod error;

pub use arena::{ArenaStats, BlockArena, BlockHandle, BlockView, DEFAULT_QUARANTINE_CYCLES};
pub use config::ArenaConfig;
pub use error::{ArenaError, ArenaResult};
