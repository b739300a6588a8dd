//! Error types for the cache
//!
//! Provides unified error handling using thiserror.
//!
//! The cache itself never surfaces runtime errors: missing keys, expired
//! entries, over-capacity batches and evictions all degrade to cache misses
//! or silent no-ops. The only failures are malformed configuration values,
//! rejected at construction time.

use thiserror::Error;

// == Config Error Enum ==
/// Configuration errors raised when constructing a cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// TTL of zero would expire every entry immediately
    #[error("ttl_millis must be greater than zero")]
    ZeroTtl,

    /// A capacity of zero cannot hold any entry
    #[error("max_total_entries must be greater than zero")]
    ZeroCapacity,

    /// A batch limit of zero would reject every insertion
    #[error("max_keys_per_insert must be greater than zero")]
    ZeroBatchLimit,
}

// == Result Type Alias ==
/// Convenience Result type for cache construction.
pub type Result<T> = std::result::Result<T, ConfigError>;
