//! Memory Tier - Hot Cache
//!
//! Count-bounded, recency-ordered map of live values.
//!
//! # Design
//!
//! - Hash-indexed doubly linked list (`lru::LruCache`, unbounded mode) so a
//!   touch and a pop of the oldest entry are both O(1)
//! - The tier enforces its own limit and hands the overflowing entry back
//!   to the caller instead of dropping it

use std::hash::Hash;

use lru::LruCache;

/// Memory tier - values kept live in the process
pub struct MemoryTier<T> {
    /// Entries, most recently touched at the front
    entries: LruCache<String, T>,
    /// Maximum number of entries
    limit: usize,
}

impl<T> MemoryTier<T> {
    /// Create a new memory tier holding at most `limit` entries
    pub fn new(limit: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            limit,
        }
    }

    /// Get a value and mark it most recently touched
    pub fn get(&mut self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    /// Check if the tier holds `key`
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Insert or replace `key` as the most recently touched entry
    ///
    /// Returns the least recently touched entry when the insert pushed the
    /// tier over its limit. Only one entry can overflow per insert.
    pub fn insert(&mut self, key: String, value: T) -> Option<(String, T)> {
        self.entries.put(key, value);
        if self.entries.len() > self.limit {
            return self.entries.pop_lru();
        }
        None
    }

    /// Remove an entry
    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.entries.pop(key)
    }

    /// Remove and return the least recently touched entry
    pub fn pop_oldest(&mut self) -> Option<(String, T)> {
        self.entries.pop_lru()
    }

    /// Keys, least recently touched first
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        oldest_first(&self.entries).map(String::as_str)
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if tier is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the entry limit
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// A zero limit turns the tier off; values go straight to file
    pub fn is_disabled(&self) -> bool {
        self.limit == 0
    }
}

impl<T> std::fmt::Debug for MemoryTier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTier")
            .field("len", &self.len())
            .field("limit", &self.limit)
            .finish()
    }
}

/// Keys of an LRU list, least recently touched first
pub(crate) fn oldest_first<K: Hash + Eq, V>(list: &LruCache<K, V>) -> impl Iterator<Item = &K> {
    list.iter().rev().map(|(key, _)| key)
}

// =============================================================================
// Tests
// =============================================================================
