//! # Arena Configuration
//!
//! Construction parameters for a [`BlockArena`](crate::BlockArena),
//! loadable from the engine's TOML startup configuration.

use serde::{Deserialize, Serialize};

use crate::arena::DEFAULT_QUARANTINE_CYCLES;
use crate::error::{ArenaError, ArenaResult};

/// Construction parameters for a block arena.
///
/// All sizing happens once, at construction. The arena never grows and
/// never allocates after it is built, so these numbers must be chosen for
/// the worst case the owning system expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Total managed capacity in bytes.
    pub capacity: u32,
    /// Maximum number of simultaneously existing blocks. This sizes the
    /// descriptor table; when exhausted, allocations stop splitting and
    /// hand out whole blocks until quarantined blocks are reclaimed.
    pub max_blocks: u32,
    /// Allocation alignment in bytes. Must be a power of two; every
    /// requested size is rounded up to a multiple of this.
    pub alignment: u32,
    /// Number of ticks a released block stays in quarantine before its
    /// bytes may be reused. Must match the deepest consumer pipeline that
    /// can still be reading a released block.
    pub quarantine_cycles: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            capacity: 64 * 1024 * 1024,
            max_blocks: 4096,
            alignment: 256,
            quarantine_cycles: DEFAULT_QUARANTINE_CYCLES,
        }
    }
}

impl ArenaConfig {
    /// Configuration for the per-frame GPU upload heap.
    ///
    /// Sized for worst-case streaming bursts (full chunk remesh plus
    /// instance data). Alignment matches the 256-byte uniform/storage
    /// buffer offset requirement common to desktop GPUs.
    #[must_use]
    pub fn upload_heap() -> Self {
        Self {
            capacity: 256 * 1024 * 1024,
            max_blocks: 16 * 1024,
            alignment: 256,
            quarantine_cycles: DEFAULT_QUARANTINE_CYCLES,
        }
    }

    /// Configuration for per-cycle transient scratch storage.
    ///
    /// Small blocks, high churn, released every cycle. Cache-line
    /// alignment is enough since nothing here is GPU-visible.
    #[must_use]
    pub fn per_cycle_scratch() -> Self {
        Self {
            capacity: 16 * 1024 * 1024,
            max_blocks: 1024,
            alignment: 64,
            quarantine_cycles: DEFAULT_QUARANTINE_CYCLES,
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] naming the violated
    /// constraint: zero capacity, zero block count, non-power-of-two
    /// alignment, capacity not a multiple of the alignment, or a zero
    /// quarantine depth.
    pub fn validate(&self) -> ArenaResult<()> {
        if self.capacity == 0 {
            return Err(ArenaError::InvalidConfig("capacity must be non-zero".into()));
        }
        if self.max_blocks == 0 {
            return Err(ArenaError::InvalidConfig("max_blocks must be at least 1".into()));
        }
        if !self.alignment.is_power_of_two() {
            return Err(ArenaError::InvalidConfig(format!(
                "alignment must be a power of two, got {}",
                self.alignment
            )));
        }
        if self.capacity % self.alignment != 0 {
            return Err(ArenaError::InvalidConfig(format!(
                "capacity {} is not a multiple of alignment {}",
                self.capacity, self.alignment
            )));
        }
        if self.quarantine_cycles == 0 {
            return Err(ArenaError::InvalidConfig(
                "quarantine_cycles must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ArenaConfig::default().validate().is_ok());
        assert!(ArenaConfig::upload_heap().validate().is_ok());
        assert!(ArenaConfig::per_cycle_scratch().validate().is_ok());
    }

    #[test]
    fn test_invalid_alignment_rejected() {
        let config = ArenaConfig {
            alignment: 48,
            ..ArenaConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ArenaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_capacity_must_cover_alignment() {
        let config = ArenaConfig {
            capacity: 1000,
            alignment: 256,
            ..ArenaConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let config: ArenaConfig = toml::from_str(
            r#"
            capacity = 65536
            max_blocks = 64
            alignment = 16
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.capacity, 65536);
        assert_eq!(config.max_blocks, 64);
        assert_eq!(config.alignment, 16);
        // Missing fields fall back to defaults.
        assert_eq!(config.quarantine_cycles, DEFAULT_QUARANTINE_CYCLES);
    }
}
