//! Sidecache - a bounded in-process multi-key cache
//!
//! Provides TTL expiration, secondary-key aliasing and LFU eviction for use
//! as a best-effort cache in front of an expensive data source.

pub mod cache;
pub mod config;
pub mod error;
pub mod shared;
pub mod tasks;

pub use cache::{Cached, InMemoryCache, KeyDeriver};
pub use config::CacheConfig;
pub use shared::SharedCache;
pub use tasks::spawn_sweep_task;
