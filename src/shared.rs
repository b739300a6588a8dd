//! Shared Cache Handle
//!
//! Wraps the cache behind a single lock for concurrent use. The entry store,
//! key index and reverse map mutate together, and even lookups bump access
//! counters, so every operation that touches entries takes the write lock.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::{CacheStats, Cached, InMemoryCache, KeyDeriver};
use crate::config::CacheConfig;
use crate::error::Result;

// == Shared Cache ==
/// Cloneable, thread-safe handle to an `InMemoryCache`.
///
/// Construct one at application startup and hand clones to collaborators;
/// all clones see the same entries.
#[derive(Debug)]
pub struct SharedCache<V> {
    inner: Arc<RwLock<InMemoryCache<V>>>,
}

// A derived Clone would demand V: Clone; only the Arc handle is cloned.
impl<V> Clone for SharedCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> SharedCache<V> {
    // == Constructor ==
    /// Creates a shared cache from a validated configuration.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(RwLock::new(InMemoryCache::new(config)?)),
        })
    }

    // == Get ==
    /// Looks up a key. See `InMemoryCache::get`.
    pub async fn get(&self, key: &str) -> Option<Cached<V>> {
        self.inner.write().await.get(key)
    }

    // == Set Multi ==
    /// Caches a batch of values. See `InMemoryCache::set_multi`.
    pub async fn set_multi<D>(&self, values: &[Arc<V>], deriver: &D, list_key: Option<&str>)
    where
        D: KeyDeriver<V> + ?Sized,
    {
        self.inner.write().await.set_multi(values, deriver, list_key);
    }

    // == Delete Multi ==
    /// Invalidates the entries the given keys resolve to, aliases included.
    pub async fn delete_multi<S>(&self, keys: &[S])
    where
        S: AsRef<str>,
    {
        self.inner.write().await.delete_multi(keys);
    }

    // == Clear ==
    /// Drops all entries and index registrations.
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    // == Purge Expired ==
    /// Removes all entries past their TTL, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.inner.write().await.purge_expired()
    }

    // == Stats ==
    /// Returns a snapshot of current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }

    // == Length ==
    /// Returns the current number of entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    // == Is Empty ==
    /// Returns true if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
