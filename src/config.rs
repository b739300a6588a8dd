//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;

use crate::error::{ConfigError, Result};

// == Defaults ==
/// Default entry time-to-live in milliseconds
pub const DEFAULT_TTL_MS: u64 = 5_000;

/// Default cap on distinct keys a single set_multi call may register
pub const DEFAULT_MAX_KEYS_PER_INSERT: usize = 64;

/// Default global entry capacity
pub const DEFAULT_MAX_TOTAL_ENTRIES: usize = 100;

/// Default background sweep interval in seconds
pub const DEFAULT_SWEEP_INTERVAL: u64 = 30;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entry time-to-live in milliseconds; older entries read as absent
    pub ttl_millis: u64,
    /// A single set_multi call registering more distinct keys than this is
    /// dropped wholesale
    pub max_keys_per_insert: usize,
    /// Global entry capacity; exceeding it triggers LFU eviction
    pub max_total_entries: usize,
    /// Background sweep task interval in seconds
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_MS` - Entry TTL in milliseconds (default: 5000)
    /// - `CACHE_MAX_KEYS_PER_INSERT` - Per-call key cap (default: 64)
    /// - `CACHE_MAX_TOTAL_ENTRIES` - Global entry capacity (default: 100)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 30)
    pub fn from_env() -> Self {
        Self {
            ttl_millis: env::var("CACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TTL_MS),
            max_keys_per_insert: env::var("CACHE_MAX_KEYS_PER_INSERT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_KEYS_PER_INSERT),
            max_total_entries: env::var("CACHE_MAX_TOTAL_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_TOTAL_ENTRIES),
            sweep_interval_secs: env::var("CACHE_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SWEEP_INTERVAL),
        }
    }

    /// Checks the configuration for values that cannot work at runtime.
    ///
    /// Fails fast at construction time rather than degrading silently later:
    /// a zero TTL, capacity or batch limit would turn every operation into a
    /// no-op.
    pub fn validate(&self) -> Result<()> {
        if self.ttl_millis == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        if self.max_total_entries == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.max_keys_per_insert == 0 {
            return Err(ConfigError::ZeroBatchLimit);
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_millis: DEFAULT_TTL_MS,
            max_keys_per_insert: DEFAULT_MAX_KEYS_PER_INSERT,
            max_total_entries: DEFAULT_MAX_TOTAL_ENTRIES,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL,
        }
    }
}
