//! Cache Store Module
//!
//! The cache façade: entry storage, key index, TTL handling and capacity
//! eviction behind the get / set_multi / delete_multi / clear contract.
//!
//! Every abnormal runtime condition is absorbed as a miss or no-op. The
//! cache is a best-effort accelerator; callers fall back to their real data
//! source on a miss, so failing to cache must never fail the caller.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::cache::deriver::KeyDeriver;
use crate::cache::entry::{current_timestamp_ms, CacheEntry, Cached, EntryId};
use crate::cache::index::KeyIndex;
use crate::cache::lfu;
use crate::cache::stats::CacheStats;
use crate::config::CacheConfig;
use crate::error::Result;

// == In-Memory Cache ==
/// Bounded in-memory cache with multi-key aliasing, TTL expiration and LFU
/// eviction.
///
/// Entries, key index and reverse map form one consistency unit; all methods
/// take `&mut self`, and concurrent use goes through a single lock (see
/// `SharedCache`).
#[derive(Debug)]
pub struct InMemoryCache<V> {
    /// Live entries by id
    entries: HashMap<EntryId, CacheEntry<V>>,
    /// Key aliasing across entries
    index: KeyIndex,
    /// Performance statistics
    stats: CacheStats,
    /// Next entry id, monotonic within this instance
    next_id: u64,
    /// Entry time-to-live in milliseconds
    ttl_millis: u64,
    /// Cap on distinct keys registered by a single set_multi call
    max_keys_per_insert: usize,
    /// Global entry capacity
    max_total_entries: usize,
}

impl<V> InMemoryCache<V> {
    // == Constructor ==
    /// Creates a new cache from a validated configuration.
    ///
    /// Malformed configuration (zero TTL, capacity or batch limit) is the
    /// only error this type ever raises, and it is raised here rather than
    /// at runtime.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        config.validate()?;

        debug!(
            ttl_millis = config.ttl_millis,
            max_keys_per_insert = config.max_keys_per_insert,
            max_total_entries = config.max_total_entries,
            "cache constructed"
        );

        Ok(Self {
            entries: HashMap::new(),
            index: KeyIndex::new(),
            stats: CacheStats::new(),
            next_id: 0,
            ttl_millis: config.ttl_millis,
            max_keys_per_insert: config.max_keys_per_insert,
            max_total_entries: config.max_total_entries,
        })
    }

    // == Get ==
    /// Looks up a key.
    ///
    /// Returns None for an unknown key, an expired entry (reclaimed on
    /// observation) or anything previously deleted or evicted. A hit
    /// increments the entry's access count, so reads extend survival under
    /// the eviction policy.
    pub fn get(&mut self, key: &str) -> Option<Cached<V>> {
        self.lookup(key, current_timestamp_ms())
    }

    /// Lookup against an explicit clock reading.
    pub(crate) fn lookup(&mut self, key: &str, now: u64) -> Option<Cached<V>> {
        let id = match self.index.resolve(key) {
            Some(id) => id,
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        let expired = self
            .entries
            .get(&id)
            .map_or(true, |entry| entry.is_expired(now, self.ttl_millis));

        if expired {
            // Lazy expiry: reclaim the entry and all its aliases now
            if self.remove_entry(id) {
                self.stats.record_expiration();
            }
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            return None;
        }

        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.touch();
                self.stats.record_hit();
                Some(entry.payload.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set Multi ==
    /// Caches a batch of values, each registered under the keys its deriver
    /// produces.
    ///
    /// Each value becomes one entry; all of its derived keys alias that
    /// entry. With `list_key` set, the full ordered value sequence is
    /// additionally stored as an independent list entry under that key; the
    /// list does not follow later invalidation of the per-item entries and
    /// must be invalidated explicitly.
    ///
    /// The total number of distinct keys the call would register, list key
    /// included, is checked against `max_keys_per_insert`; a call over the
    /// cap is dropped wholesale, caching nothing and raising nothing. If the
    /// insertion pushes the store over `max_total_entries`, least-accessed
    /// entries are evicted until it is back under the limit.
    pub fn set_multi<D>(&mut self, values: &[Arc<V>], deriver: &D, list_key: Option<&str>)
    where
        D: KeyDeriver<V> + ?Sized,
    {
        let key_sets: Vec<Vec<String>> = values
            .iter()
            .map(|value| deriver.derive_keys(value))
            .collect();

        let mut distinct: HashSet<&str> = key_sets
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        if let Some(list_key) = list_key {
            distinct.insert(list_key);
        }

        if distinct.len() > self.max_keys_per_insert {
            debug!(
                keys = distinct.len(),
                limit = self.max_keys_per_insert,
                "batch exceeds per-insert key cap, dropping entire call"
            );
            self.stats.record_rejected_batch();
            return;
        }

        let now = current_timestamp_ms();
        for (value, keys) in values.iter().zip(&key_sets) {
            // A value whose deriver produced no keys would be unreachable
            if keys.is_empty() {
                continue;
            }
            self.insert_entry(Cached::Item(Arc::clone(value)), keys, now);
        }

        if let Some(list_key) = list_key {
            let snapshot: Vec<Arc<V>> = values.iter().map(Arc::clone).collect();
            let list_keys = [list_key.to_string()];
            self.insert_entry(Cached::List(snapshot), &list_keys, now);
        }

        self.evict_over_capacity();
        self.stats.set_total_entries(self.entries.len());
    }

    // == Delete Multi ==
    /// Removes the entries the given keys resolve to, sweeping every alias
    /// of each removed entry. Unknown keys are no-ops.
    pub fn delete_multi<S>(&mut self, keys: &[S])
    where
        S: AsRef<str>,
    {
        for key in keys {
            if let Some(id) = self.index.resolve(key.as_ref()) {
                self.remove_entry(id);
            }
        }
        self.stats.set_total_entries(self.entries.len());
    }

    // == Clear ==
    /// Drops all entries and index registrations, returning the cache to
    /// its empty state.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.stats.set_total_entries(0);
    }

    // == Purge Expired ==
    /// Removes all entries past their TTL.
    ///
    /// Expiry is already enforced lazily on every lookup; this exists so a
    /// periodic sweep can reclaim memory for entries nobody reads anymore.
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(current_timestamp_ms())
    }

    /// Purge against an explicit clock reading.
    pub(crate) fn purge_expired_at(&mut self, now: u64) -> usize {
        let expired: Vec<EntryId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, self.ttl_millis))
            .map(|(id, _)| *id)
            .collect();

        let count = expired.len();
        for id in expired {
            self.remove_entry(id);
            self.stats.record_expiration();
        }
        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Stats ==
    /// Returns a snapshot of current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Key Count ==
    /// Returns the current number of registered keys across all entries.
    pub fn key_count(&self) -> usize {
        self.index.len()
    }

    /// Stores one entry and registers its keys.
    ///
    /// A key that already aliased another entry is re-pointed; an entry left
    /// with no aliases is dropped, keeping every live entry reachable.
    fn insert_entry(&mut self, payload: Cached<V>, keys: &[String], now: u64) {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, CacheEntry::new(payload, now));

        for key in keys {
            if let Some(orphan) = self.index.register(key, id) {
                self.entries.remove(&orphan);
            }
        }
    }

    /// Evicts least-accessed entries until the store is back under its
    /// capacity. Ties go to the oldest entry, then to creation order.
    fn evict_over_capacity(&mut self) {
        while self.entries.len() > self.max_total_entries {
            let victim = lfu::select_victim(self.entries.iter().map(|(id, entry)| (*id, entry)));
            match victim {
                Some(id) => {
                    self.remove_entry(id);
                    self.stats.record_eviction();
                    debug!("evicted least-frequently-used entry");
                }
                None => break,
            }
        }
    }

    /// Removes an entry and every key aliasing it.
    ///
    /// Returns true when the entry was present.
    fn remove_entry(&mut self, id: EntryId) -> bool {
        let removed = self.entries.remove(&id).is_some();
        self.index.unregister_all_for(id);
        removed
    }

    /// Asserts the store/index invariants hold.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let live: HashSet<EntryId> = self.entries.keys().copied().collect();
        assert!(
            self.index.is_consistent(&live),
            "key index out of sync with entry store"
        );
        assert!(
            self.entries.len() <= self.max_total_entries,
            "entry count {} exceeds capacity {}",
            self.entries.len(),
            self.max_total_entries
        );
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn config(ttl_millis: u64, max_keys_per_insert: usize, max_total_entries: usize) -> CacheConfig {
        CacheConfig {
            ttl_millis,
            max_keys_per_insert,
            max_total_entries,
            sweep_interval_secs: 30,
        }
    }

    fn cache(max_keys_per_insert: usize, max_total_entries: usize) -> InMemoryCache<String> {
        InMemoryCache::new(&config(60_000, max_keys_per_insert, max_total_entries)).unwrap()
    }

    /// Keys every value under "id-<value>" and "alias-<value>".
    fn two_keys(value: &String) -> Vec<String> {
        vec![format!("id-{}", value), format!("alias-{}", value)]
    }

    fn set_one(cache: &mut InMemoryCache<String>, value: &str, keys: &[&str]) {
        let owned: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let deriver = move |_: &String| owned.clone();
        cache.set_multi(&[Arc::new(value.to_string())], &deriver, None);
    }

    #[test]
    fn test_new_rejects_malformed_config() {
        assert_eq!(
            InMemoryCache::<String>::new(&config(0, 8, 8)).err(),
            Some(ConfigError::ZeroTtl)
        );
        assert_eq!(
            InMemoryCache::<String>::new(&config(1_000, 8, 0)).err(),
            Some(ConfigError::ZeroCapacity)
        );
        assert_eq!(
            InMemoryCache::<String>::new(&config(1_000, 0, 8)).err(),
            Some(ConfigError::ZeroBatchLimit)
        );
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache = cache(8, 8);
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.key_count(), 0);
    }

    #[test]
    fn test_all_derived_keys_resolve_to_same_value() {
        let mut cache = cache(8, 8);
        let value = Arc::new("payload".to_string());

        cache.set_multi(&[Arc::clone(&value)], &two_keys, None);

        let by_id = cache.get("id-payload").unwrap().into_item().unwrap();
        let by_alias = cache.get("alias-payload").unwrap().into_item().unwrap();

        // One entry, shared by reference under both keys
        assert!(Arc::ptr_eq(&by_id, &value));
        assert!(Arc::ptr_eq(&by_alias, &value));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.key_count(), 2);
    }

    #[test]
    fn test_get_miss_has_no_side_effects() {
        let mut cache = cache(8, 8);
        set_one(&mut cache, "v", &["key"]);

        assert!(cache.get("never-inserted").is_none());
        assert!(cache.get("never-inserted").is_none());

        let stats = cache.stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 0);
        assert_eq!(cache.len(), 1);
        cache.assert_consistent();
    }

    #[test]
    fn test_delete_one_alias_removes_all() {
        let mut cache = cache(8, 8);
        set_one(&mut cache, "v", &["first", "second"]);

        cache.delete_multi(&["first"]);

        assert!(cache.get("first").is_none());
        assert!(cache.get("second").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.key_count(), 0);
        cache.assert_consistent();
    }

    #[test]
    fn test_delete_unknown_key_is_noop() {
        let mut cache = cache(8, 8);
        set_one(&mut cache, "v", &["key"]);

        cache.delete_multi(&["unknown"]);

        assert!(cache.get("key").is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_repointed_key_drops_unreachable_entry() {
        let mut cache = cache(8, 8);
        set_one(&mut cache, "old", &["key"]);
        set_one(&mut cache, "new", &["key"]);

        assert_eq!(cache.len(), 1);
        let value = cache.get("key").unwrap().into_item().unwrap();
        assert_eq!(*value, "new");
        cache.assert_consistent();
    }

    #[test]
    fn test_repointed_key_keeps_entry_with_other_aliases() {
        let mut cache = cache(8, 8);
        set_one(&mut cache, "old", &["a", "b"]);
        set_one(&mut cache, "new", &["b"]);

        assert_eq!(*cache.get("a").unwrap().into_item().unwrap(), "old");
        assert_eq!(*cache.get("b").unwrap().into_item().unwrap(), "new");
        assert_eq!(cache.len(), 2);
        cache.assert_consistent();
    }

    #[test]
    fn test_ttl_expiry_removes_all_aliases() {
        let mut cache = InMemoryCache::new(&config(500, 8, 8)).unwrap();
        set_one(&mut cache, "v", &["first", "second"]);

        let later = current_timestamp_ms() + 500;
        assert!(cache.lookup("first", later).is_none());
        assert!(cache.lookup("second", later).is_none());

        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 2);
        assert!(cache.is_empty());
        cache.assert_consistent();
    }

    #[test]
    fn test_entry_alive_before_ttl_elapses() {
        let mut cache = InMemoryCache::new(&config(10_000, 8, 8)).unwrap();
        set_one(&mut cache, "v", &["key"]);

        let almost = current_timestamp_ms() + 9_000;
        assert!(cache.lookup("key", almost).is_some());
    }

    #[test]
    fn test_list_registration_is_independent() {
        let mut cache = cache(16, 16);
        let values: Vec<Arc<String>> = ["a", "b", "c"]
            .iter()
            .map(|v| Arc::new(v.to_string()))
            .collect();

        cache.set_multi(&values, &two_keys, Some("all-items"));

        // Deleting one underlying item leaves the list snapshot in place
        cache.delete_multi(&["id-b"]);

        assert!(cache.get("id-b").is_none());
        let list = cache.get("all-items").unwrap().into_list().unwrap();
        assert_eq!(list.len(), 3);
        assert!(Arc::ptr_eq(&list[0], &values[0]));
        assert!(Arc::ptr_eq(&list[1], &values[1]));
        assert!(Arc::ptr_eq(&list[2], &values[2]));

        // And the list is removed only through its own key
        cache.delete_multi(&["all-items"]);
        assert!(cache.get("all-items").is_none());
        cache.assert_consistent();
    }

    #[test]
    fn test_batch_within_cap_is_cached() {
        let mut cache = cache(8, 16);
        let values = vec![Arc::new("x".to_string()), Arc::new("y".to_string())];

        // 2 values x 2 keys = 4 distinct keys, under the cap of 8
        cache.set_multi(&values, &two_keys, None);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("id-x").is_some());
        assert!(cache.get("alias-y").is_some());
    }

    #[test]
    fn test_oversized_batch_is_rejected_wholesale() {
        let mut cache = cache(8, 16);
        let five_keys = |value: &String| {
            (0..5).map(|i| format!("{}-{}", value, i)).collect::<Vec<_>>()
        };
        let values = vec![Arc::new("x".to_string()), Arc::new("y".to_string())];

        // 2 values x 5 keys = 10 distinct keys, over the cap of 8
        cache.set_multi(&values, &five_keys, None);

        assert!(cache.is_empty());
        assert_eq!(cache.key_count(), 0);
        assert!(cache.get("x-0").is_none());
        assert!(cache.get("y-4").is_none());
        assert_eq!(cache.stats().rejected_batches, 1);
        cache.assert_consistent();
    }

    #[test]
    fn test_list_key_counts_toward_batch_cap() {
        let mut cache = cache(4, 16);
        let values = vec![Arc::new("x".to_string()), Arc::new("y".to_string())];

        // 4 item keys alone fit the cap; the list key makes 5 and rejects
        cache.set_multi(&values, &two_keys, Some("the-list"));

        assert!(cache.is_empty());
        assert!(cache.get("the-list").is_none());
        assert_eq!(cache.stats().rejected_batches, 1);
    }

    #[test]
    fn test_duplicate_derived_keys_count_once() {
        let mut cache = cache(2, 16);
        let same_keys = |_: &String| vec!["dup".to_string(), "dup".to_string()];

        cache.set_multi(&[Arc::new("v".to_string())], &same_keys, None);

        // Two occurrences of one key are one distinct key, under the cap
        assert_eq!(cache.len(), 1);
        assert!(cache.get("dup").is_some());
        cache.assert_consistent();
    }

    #[test]
    fn test_capacity_holds_then_evicts_one() {
        let mut cache = cache(8, 8);
        let names = [
            "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth",
        ];
        for name in names {
            set_one(&mut cache, name, &[name]);
        }
        assert_eq!(cache.len(), 8);

        set_one(&mut cache, "ninth", &["ninth"]);

        assert_eq!(cache.len(), 8);
        assert_eq!(cache.stats().evictions, 1);
        assert!(cache.get("ninth").is_some());
        cache.assert_consistent();
    }

    #[test]
    fn test_reads_extend_survival_under_eviction() {
        let mut cache = cache(8, 6);

        set_one(&mut cache, "first", &["first"]);
        set_one(&mut cache, "second", &["second"]);
        set_one(&mut cache, "third", &["third"]);
        set_one(&mut cache, "fourth", &["fourth"]);

        // Reads bump access counts, so these two outlive the untouched ones
        assert!(cache.get("first").is_some());
        assert!(cache.get("third").is_some());

        set_one(&mut cache, "fifth", &["fifth"]);
        set_one(&mut cache, "sixth", &["sixth"]);
        set_one(&mut cache, "seventh", &["seventh"]);
        set_one(&mut cache, "eighth", &["eighth"]);

        assert_eq!(cache.len(), 6);
        assert!(cache.get("first").is_some());
        assert!(cache.get("third").is_some());
        assert!(cache.get("second").is_none());
        assert!(cache.get("fourth").is_none());
        cache.assert_consistent();
    }

    #[test]
    fn test_same_batch_overflow_ends_under_capacity() {
        let mut cache = cache(16, 4);
        let values: Vec<Arc<String>> = (0..6).map(|i| Arc::new(format!("v{}", i))).collect();
        let by_index = |value: &String| vec![format!("key-{}", value)];

        // One batch larger than the whole capacity still settles under it;
        // which of the fresh entries survive is not pinned down
        cache.set_multi(&values, &by_index, None);

        assert!(cache.len() <= 4);
        assert_eq!(cache.stats().evictions, 2);
        cache.assert_consistent();
    }

    #[test]
    fn test_eviction_sweeps_aliases() {
        let mut cache = cache(8, 2);
        set_one(&mut cache, "a", &["a-1", "a-2"]);
        set_one(&mut cache, "b", &["b-1"]);
        set_one(&mut cache, "c", &["c-1"]);

        // "a" was never read; both of its keys must be gone after eviction
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a-1").is_none());
        assert!(cache.get("a-2").is_none());
        cache.assert_consistent();
    }

    #[test]
    fn test_clear_resets_fully() {
        let mut cache = cache(16, 16);
        let values = vec![Arc::new("x".to_string()), Arc::new("y".to_string())];
        cache.set_multi(&values, &two_keys, Some("the-list"));

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.key_count(), 0);
        assert!(cache.get("id-x").is_none());
        assert!(cache.get("alias-y").is_none());
        assert!(cache.get("the-list").is_none());
        assert_eq!(cache.stats().total_entries, 0);
        cache.assert_consistent();
    }

    #[test]
    fn test_purge_expired_removes_only_stale_entries() {
        let mut cache = InMemoryCache::new(&config(500, 8, 8)).unwrap();
        set_one(&mut cache, "stale", &["stale"]);

        let later = current_timestamp_ms() + 500;
        let removed = cache.purge_expired_at(later);

        assert_eq!(removed, 1);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expirations, 1);

        set_one(&mut cache, "fresh", &["fresh"]);
        assert_eq!(cache.purge_expired_at(current_timestamp_ms()), 0);
        assert_eq!(cache.len(), 1);
        cache.assert_consistent();
    }

    #[test]
    fn test_value_with_no_derived_keys_is_skipped() {
        let mut cache = cache(8, 8);
        let no_keys = |_: &String| Vec::<String>::new();

        cache.set_multi(&[Arc::new("v".to_string())], &no_keys, None);

        assert!(cache.is_empty());
        cache.assert_consistent();
    }

    #[test]
    fn test_empty_values_with_list_key_caches_empty_list() {
        let mut cache = cache(8, 8);

        cache.set_multi(&[], &two_keys, Some("empty-list"));

        let list = cache.get("empty-list").unwrap().into_list().unwrap();
        assert!(list.is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let mut cache = cache(8, 8);
        set_one(&mut cache, "v", &["key"]);

        cache.get("key");
        cache.get("key");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }
}
