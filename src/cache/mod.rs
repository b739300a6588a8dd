//! Cache Module
//!
//! Provides a multi-key in-memory cache with TTL expiration and LFU eviction.

mod deriver;
mod entry;
mod index;
mod lfu;
mod stats;
mod store;


// Re-export public types
pub use deriver::KeyDeriver;
pub use entry::{current_timestamp_ms, CacheEntry, Cached, EntryId};
pub use stats::CacheStats;
pub use store::InMemoryCache;
