//! Multi-view cache store
//!
//! The engine never owns the application's cache; it talks to it through
//! [`CacheStore`]. [`MemoryCacheStore`] is the in-process implementation used
//! by the binary and the test suite.
//!
//! Staleness is a hint, not an eviction: a stale entry keeps serving its data
//! until the next fetch replaces it through [`CacheStore::set`].

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::entry::CacheEntry;
use super::keys::{CacheKey, Scope};

/// Predicate used to enumerate entries
pub type EntryPredicate<'a, T> = &'a dyn Fn(&CacheKey, &CacheEntry<T>) -> bool;

/// Read/write primitive supplied by the surrounding data layer
pub trait CacheStore<T>: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry<T>>;

    /// Overwrite the value at `key`. The written value counts as fresh.
    fn set(&self, key: CacheKey, entry: CacheEntry<T>);

    /// Every entry the predicate accepts, ordered by key
    fn get_all_matching(&self, predicate: EntryPredicate<'_, T>) -> Vec<(CacheKey, CacheEntry<T>)>;

    /// Flag every entry in `scope` for refetch. Returns the number flagged.
    fn mark_stale(&self, scope: &Scope) -> usize;
}

struct StoredEntry<T> {
    entry: CacheEntry<T>,
    stale: bool,
}

/// Statistics for the in-memory store
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub entry_count: usize,
    pub stale_count: usize,
    pub writes: u64,
    pub invalidations: u64,
}

/// DashMap-backed store
pub struct MemoryCacheStore<T> {
    entries: DashMap<CacheKey, StoredEntry<T>>,
    /// Invalidation marks per scope, including marks on empty scopes
    invalidations: DashMap<Scope, u64>,
    writes: AtomicU64,
}

impl<T: Clone + Send + Sync> MemoryCacheStore<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            invalidations: DashMap::new(),
            writes: AtomicU64::new(0),
        }
    }

    /// Seed a store from `descriptor -> entry` pairs (e.g. a JSON fixture)
    pub fn from_entries(entries: HashMap<CacheKey, CacheEntry<T>>) -> Self {
        let store = Self::new();
        for (key, entry) in entries {
            store.set(key, entry);
        }
        store
    }

    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.entries.get(key).map(|e| e.stale).unwrap_or(false)
    }

    /// How many times `scope` has been marked stale
    pub fn invalidation_count(&self, scope: &Scope) -> u64 {
        self.invalidations.get(scope).map(|c| *c).unwrap_or(0)
    }

    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            entry_count: self.entries.len(),
            stale_count: self.entries.iter().filter(|e| e.stale).count(),
            writes: self.writes.load(Ordering::Relaxed),
            invalidations: self.invalidations.iter().map(|c| *c.value()).sum(),
        }
    }
}

impl<T: Clone + Send + Sync> Default for MemoryCacheStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> CacheStore<T> for MemoryCacheStore<T> {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
        self.entries.get(key).map(|e| e.entry.clone())
    }

    fn set(&self, key: CacheKey, entry: CacheEntry<T>) {
        debug!(key = %key, shape = ?entry.shape(), "Cache entry written");
        self.entries.insert(key, StoredEntry { entry, stale: false });
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn get_all_matching(&self, predicate: EntryPredicate<'_, T>) -> Vec<(CacheKey, CacheEntry<T>)> {
        let mut matches: Vec<(CacheKey, CacheEntry<T>)> = self
            .entries
            .iter()
            .filter(|e| predicate(e.key(), &e.entry))
            .map(|e| (e.key().clone(), e.entry.clone()))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0));
        matches
    }

    fn mark_stale(&self, scope: &Scope) -> usize {
        let mut marked = 0;
        for mut e in self.entries.iter_mut() {
            if scope.contains(e.key()) {
                e.stale = true;
                marked += 1;
            }
        }
        *self.invalidations.entry(scope.clone()).or_insert(0) += 1;
        debug!(scope = %scope, marked, "Cache scope marked stale");
        marked
    }
}
