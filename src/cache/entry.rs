//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and their metadata.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

// == Entry Id ==
/// Identifies one stored entry within a cache instance.
///
/// Ids increase monotonically and are never reused, so they double as a
/// creation-order tie-break when two entries share a millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u64);

// == Cached Payload ==
/// A cached payload: a single value, or an ordered list snapshot.
///
/// Values are shared with the caller through `Arc` rather than deep-copied;
/// a list snapshot holds the value handles that were current when it was
/// registered and does not follow later invalidation of the per-item entries.
#[derive(Debug)]
pub enum Cached<V> {
    /// A single cached value
    Item(Arc<V>),
    /// An ordered snapshot of several values, materialized at insertion
    List(Vec<Arc<V>>),
}

impl<V> Cached<V> {
    /// Returns the single value, or None for a list payload.
    pub fn as_item(&self) -> Option<&Arc<V>> {
        match self {
            Cached::Item(value) => Some(value),
            Cached::List(_) => None,
        }
    }

    /// Returns the list snapshot, or None for a single-value payload.
    pub fn as_list(&self) -> Option<&[Arc<V>]> {
        match self {
            Cached::Item(_) => None,
            Cached::List(values) => Some(values),
        }
    }

    /// Consumes the payload, returning the single value if it is one.
    pub fn into_item(self) -> Option<Arc<V>> {
        match self {
            Cached::Item(value) => Some(value),
            Cached::List(_) => None,
        }
    }

    /// Consumes the payload, returning the list snapshot if it is one.
    pub fn into_list(self) -> Option<Vec<Arc<V>>> {
        match self {
            Cached::Item(_) => None,
            Cached::List(values) => Some(values),
        }
    }
}

// A derived Clone would demand V: Clone; only the Arc handles are cloned.
impl<V> Clone for Cached<V> {
    fn clone(&self) -> Self {
        match self {
            Cached::Item(value) => Cached::Item(Arc::clone(value)),
            Cached::List(values) => Cached::List(values.clone()),
        }
    }
}

// == Cache Entry ==
/// One stored payload plus its bookkeeping metadata.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored payload
    pub payload: Cached<V>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Number of successful lookups that resolved to this entry
    pub access_count: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped with the given creation time.
    ///
    /// The store passes one timestamp per insertion batch so all entries of
    /// a batch age together.
    pub fn new(payload: Cached<V>, now: u64) -> Self {
        Self {
            payload,
            created_at: now,
            access_count: 0,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has outlived the cache TTL.
    ///
    /// Boundary condition: an entry is expired once `now - created_at`
    /// reaches the TTL, so an entry read exactly at the TTL boundary is
    /// already absent.
    pub fn is_expired(&self, now: u64, ttl_millis: u64) -> bool {
        now.saturating_sub(self.created_at) >= ttl_millis
    }

    // == Touch ==
    /// Records a successful lookup, strengthening the entry against eviction.
    pub fn touch(&mut self) {
        self.access_count += 1;
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
