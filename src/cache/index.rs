//! Key Index Module
//!
//! Multi-key aliasing: maps each key to a stored entry, with a reverse map
//! so removing an entry can sweep all of its aliases without a full scan.

use std::collections::HashMap;

use crate::cache::entry::EntryId;

// == Key Index ==
/// Bidirectional key-to-entry index.
///
/// Invariant: every forward key resolves to an entry listed in the reverse
/// map, and every reverse-map key list matches the forward entries exactly.
/// Both maps mutate together under every operation.
#[derive(Debug, Default)]
pub struct KeyIndex {
    /// Key to entry
    forward: HashMap<String, EntryId>,
    /// Entry to all keys aliasing it
    reverse: HashMap<EntryId, Vec<String>>,
}

impl KeyIndex {
    // == Constructor ==
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Points `key` at `id`.
    ///
    /// A key already aliasing a different entry is re-pointed; if the
    /// previous entry has no aliases left afterward, its id is returned so
    /// the caller can drop the now-unreachable entry.
    pub fn register(&mut self, key: &str, id: EntryId) -> Option<EntryId> {
        match self.forward.insert(key.to_string(), id) {
            Some(prev) if prev == id => None,
            Some(prev) => {
                let orphaned = self.detach(prev, key);
                self.reverse.entry(id).or_default().push(key.to_string());
                orphaned.then_some(prev)
            }
            None => {
                self.reverse.entry(id).or_default().push(key.to_string());
                None
            }
        }
    }

    // == Resolve ==
    /// Looks up the entry a key points at.
    pub fn resolve(&self, key: &str) -> Option<EntryId> {
        self.forward.get(key).copied()
    }

    // == Unregister All ==
    /// Drops every key pointing at the entry, returning the removed keys.
    pub fn unregister_all_for(&mut self, id: EntryId) -> Vec<String> {
        let keys = self.reverse.remove(&id).unwrap_or_default();
        for key in &keys {
            self.forward.remove(key);
        }
        keys
    }

    // == Length ==
    /// Returns the number of registered keys.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    // == Clear ==
    /// Drops all registrations.
    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    /// Removes one key from an entry's reverse list.
    ///
    /// Returns true when the entry has no aliases left.
    fn detach(&mut self, id: EntryId, key: &str) -> bool {
        if let Some(keys) = self.reverse.get_mut(&id) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                self.reverse.remove(&id);
                return true;
            }
        }
        false
    }

    /// Checks both maps against the set of live entry ids.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self, live: &std::collections::HashSet<EntryId>) -> bool {
        let reverse_ids: std::collections::HashSet<EntryId> =
            self.reverse.keys().copied().collect();
        let key_total: usize = self.reverse.values().map(Vec::len).sum();

        reverse_ids == *live
            && key_total == self.forward.len()
            && self.reverse.iter().all(|(id, keys)| {
                keys.iter().all(|key| self.forward.get(key) == Some(id))
            })
    }
}
