//! Snapshot capture and restore
//!
//! A snapshot is taken immediately before an optimistic mutation and is owned
//! by the pending operation that caused it. Restore is last-writer-wins: any
//! change made to a captured key after capture is overwritten.

use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, CacheStore};

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    entries: Vec<(CacheKey, CacheEntry<T>)>,
}

impl<T: Clone> Snapshot<T> {
    /// Record the current value of each key. Keys with no value are skipped.
    pub fn capture(store: &dyn CacheStore<T>, keys: &[CacheKey]) -> Self {
        let entries = keys
            .iter()
            .filter_map(|key| store.get(key).map(|entry| (key.clone(), entry)))
            .collect();
        Self { entries }
    }

    /// Write every captured value back, unconditionally
    pub fn restore(&self, store: &dyn CacheStore<T>) -> usize {
        for (key, entry) in &self.entries {
            store.set(key.clone(), entry.clone());
        }
        debug!(entries = self.entries.len(), "Snapshot restored");
        self.entries.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn entries(&self) -> &[(CacheKey, CacheEntry<T>)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;

    #[test]
    fn test_capture_skips_missing_keys() {
        let store = MemoryCacheStore::<i64>::new();
        store.set(CacheKey::feed("latest"), CacheEntry::flat(vec![1, 2]));

        let snap = Snapshot::<i64>::capture(&store, &[CacheKey::feed("latest"), CacheKey::feed("gone")]);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.keys().next(), Some(&CacheKey::feed("latest")));
    }

    #[test]
    fn test_restore_overwrites_later_changes() {
        let store = MemoryCacheStore::<i64>::new();
        let key = CacheKey::feed("latest");
        store.set(key.clone(), CacheEntry::flat(vec![1, 2, 3]));

        let snap = Snapshot::<i64>::capture(&store, &[key.clone()]);
        store.set(key.clone(), CacheEntry::flat(vec![99]));

        assert_eq!(snap.restore(&store), 1);
        assert_eq!(store.get(&key), Some(CacheEntry::flat(vec![1, 2, 3])));
    }
}
