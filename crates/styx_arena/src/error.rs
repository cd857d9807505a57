//! # Arena Error Types
//!
//! All errors that can occur in the block arena.

use thiserror::Error;

/// Errors that can occur in the block arena.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// No sufficiently large free block exists for the request.
    ///
    /// This is an ordinary, recoverable outcome under load: the arena never
    /// grows, and nothing is logged or escalated internally. Retrying after
    /// a tick, or falling back to another arena, is the caller's decision.
    #[error("out of space: no free block can hold {requested} bytes")]
    OutOfSpace {
        /// The requested size in bytes, before alignment rounding.
        requested: u32,
    },

    /// An [`ArenaConfig`](crate::config::ArenaConfig) failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for arena operations.
pub type ArenaResult<T> = Result<T, ArenaError>;
