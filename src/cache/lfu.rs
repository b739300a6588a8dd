//! LFU Eviction Module
//!
//! Selects eviction victims: least-frequently-used first, ties broken by
//! oldest creation time, then by creation order.

use crate::cache::entry::{CacheEntry, EntryId};

// == Victim Selection ==
/// Returns the id of the entry to evict next, or None when there are no
/// entries.
///
/// Linear scan over live entries. Capacities are expected in the tens, so a
/// full pass per eviction beats maintaining a priority structure. Entry ids
/// are monotonic, so the final tie-break reproduces creation order even when
/// several entries share a millisecond timestamp.
pub fn select_victim<'a, V: 'a>(
    entries: impl Iterator<Item = (EntryId, &'a CacheEntry<V>)>,
) -> Option<EntryId> {
    entries
        .min_by_key(|&(id, entry)| (entry.access_count, entry.created_at, id))
        .map(|(id, _)| id)
}
