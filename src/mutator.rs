//! Optimistic mutator
//!
//! Only `Discard` changes visible state up front: the article is removed from
//! every entry that holds it, whatever the entry's shape. `Like` and `Save`
//! leave the caches alone and rely on reconciliation after the commit.

use std::sync::Arc;
use tracing::debug;

use crate::cache::{CacheKey, CacheStore};
use crate::snapshot::Snapshot;
use crate::types::{ArticleId, CacheItem, InteractionKind};

pub struct OptimisticMutator<T> {
    store: Arc<dyn CacheStore<T>>,
}

impl<T: CacheItem> OptimisticMutator<T> {
    pub fn new(store: Arc<dyn CacheStore<T>>) -> Self {
        Self { store }
    }

    /// Apply the instant effect of `kind`. Returns the snapshot needed to undo
    /// it, or `None` when nothing was touched.
    pub fn apply(&self, kind: InteractionKind, id: ArticleId) -> Option<Snapshot<T>> {
        match kind {
            InteractionKind::Discard => self.apply_hide(id),
            InteractionKind::Like | InteractionKind::Save | InteractionKind::Report => None,
        }
    }

    /// Remove `id` from every cache entry that contains it.
    ///
    /// The snapshot is captured before the first write.
    pub fn apply_hide(&self, id: ArticleId) -> Option<Snapshot<T>> {
        let keys: Vec<CacheKey> = self
            .store
            .get_all_matching(&|_, entry| entry.contains(id))
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        if keys.is_empty() {
            debug!(article_id = %id, "Hide touched no cache entries");
            return None;
        }

        let snapshot = Snapshot::capture(self.store.as_ref(), &keys);
        for (key, entry) in snapshot.entries() {
            self.store.set(key.clone(), entry.without(id));
        }

        debug!(article_id = %id, entries = snapshot.len(), "Article hidden from cache");
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, MemoryCacheStore};
    use crate::types::ArticleId;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(i64);

    impl CacheItem for Row {
        fn article_id(&self) -> ArticleId {
            ArticleId(self.0)
        }
    }

    fn setup() -> (Arc<MemoryCacheStore<Row>>, OptimisticMutator<Row>) {
        let store = Arc::new(MemoryCacheStore::new());
        store.set(CacheKey::feed("latest"), CacheEntry::flat(vec![Row(1), Row(42), Row(3)]));
        store.set(
            CacheKey::search("test", 1, 20),
            CacheEntry::paginated(vec![vec![Row(5)], vec![Row(42), Row(6)]]),
        );
        store.set(CacheKey::feed("tech"), CacheEntry::flat(vec![Row(7)]));
        let mutator = OptimisticMutator::new(store.clone() as Arc<dyn CacheStore<Row>>);
        (store, mutator)
    }

    #[test]
    fn test_hide_across_shapes() {
        let (store, mutator) = setup();
        let snap = mutator.apply_hide(ArticleId(42)).expect("Should snapshot");

        // untouched entry not captured
        assert_eq!(snap.len(), 2);
        assert!(!snap.keys().any(|k| *k == CacheKey::feed("tech")));

        let feed = store.get(&CacheKey::feed("latest")).unwrap();
        assert_eq!(feed, CacheEntry::flat(vec![Row(1), Row(3)]));

        let search = store.get(&CacheKey::search("test", 1, 20)).unwrap();
        assert_eq!(search.pages().len(), 2);
        assert_eq!(search.pages()[1].items, vec![Row(6)]);
    }

    #[test]
    fn test_hide_absent_item_is_noop() {
        let (store, mutator) = setup();
        let writes_before = store.stats().writes;

        assert!(mutator.apply_hide(ArticleId(1000)).is_none());
        assert_eq!(store.stats().writes, writes_before);
    }

    #[test]
    fn test_like_and_save_do_not_mutate() {
        let (store, mutator) = setup();
        let writes_before = store.stats().writes;

        assert!(mutator.apply(InteractionKind::Like, ArticleId(42)).is_none());
        assert!(mutator.apply(InteractionKind::Save, ArticleId(42)).is_none());
        assert_eq!(store.stats().writes, writes_before);
        assert!(store.get(&CacheKey::feed("latest")).unwrap().contains(ArticleId(42)));
    }
}
