//! Cached collection shapes
//!
//! A cache entry is either one flat page of items or an ordered sequence of
//! pages (infinite scroll). The shape of an entry never changes for its key,
//! but different keys in the same store can have different shapes, so every
//! transformation goes through [`CacheEntry::map_pages`].

use serde::{Deserialize, Serialize};

use crate::types::{ArticleId, CacheItem};

/// One page of items plus whatever metadata the endpoint returned
/// (`nextCursor`, `total`, `page`, `pageSize`). Metadata is carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(flatten)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            meta: serde_json::Map::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: serde_json::Value) -> Self {
        self.meta.insert(key.to_string(), value);
        self
    }
}

impl<T: CacheItem> Page<T> {
    pub fn contains(&self, id: ArticleId) -> bool {
        self.items.iter().any(|item| item.article_id() == id)
    }

    /// Copy of this page with every item for `id` removed
    pub fn without(&self, id: ArticleId) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter(|item| item.article_id() != id)
                .cloned()
                .collect(),
            meta: self.meta.clone(),
        }
    }
}

/// Infinite-query data: pages in load order plus the params used to load them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedEntry<T> {
    pub pages: Vec<Page<T>>,
    #[serde(default)]
    pub page_params: Vec<serde_json::Value>,
}

/// Physical shape of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Flat,
    Paginated,
}

/// Value stored under one cache key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheEntry<T> {
    Paginated(PagedEntry<T>),
    Flat(Page<T>),
}

impl<T> CacheEntry<T> {
    pub fn flat(items: Vec<T>) -> Self {
        CacheEntry::Flat(Page::new(items))
    }

    pub fn paginated(pages: Vec<Vec<T>>) -> Self {
        CacheEntry::Paginated(PagedEntry {
            pages: pages.into_iter().map(Page::new).collect(),
            page_params: Vec::new(),
        })
    }

    pub fn shape(&self) -> Shape {
        match self {
            CacheEntry::Flat(_) => Shape::Flat,
            CacheEntry::Paginated(_) => Shape::Paginated,
        }
    }

    pub fn pages(&self) -> &[Page<T>] {
        match self {
            CacheEntry::Flat(page) => std::slice::from_ref(page),
            CacheEntry::Paginated(paged) => &paged.pages,
        }
    }

    pub fn item_count(&self) -> usize {
        self.pages().iter().map(|p| p.items.len()).sum()
    }

    /// Build a new entry of the same shape by transforming every page.
    ///
    /// Page order and page count are preserved; a page that ends up empty
    /// is kept.
    pub fn map_pages<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&Page<T>) -> Page<T>,
    {
        match self {
            CacheEntry::Flat(page) => CacheEntry::Flat(f(page)),
            CacheEntry::Paginated(paged) => CacheEntry::Paginated(PagedEntry {
                pages: paged.pages.iter().map(&mut f).collect(),
                page_params: paged.page_params.clone(),
            }),
        }
    }
}

impl<T: CacheItem> CacheEntry<T> {
    pub fn contains(&self, id: ArticleId) -> bool {
        self.pages().iter().any(|page| page.contains(id))
    }

    pub fn without(&self, id: ArticleId) -> Self {
        self.map_pages(|page| page.without(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArticleId;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: i64,
    }

    impl CacheItem for Row {
        fn article_id(&self) -> ArticleId {
            ArticleId(self.id)
        }
    }

    fn rows(ids: &[i64]) -> Vec<Row> {
        ids.iter().map(|&id| Row { id }).collect()
    }

    #[test]
    fn test_flat_without() {
        let entry = CacheEntry::flat(rows(&[1, 42, 3]));
        let hidden = entry.without(ArticleId(42));

        assert_eq!(hidden.shape(), Shape::Flat);
        assert_eq!(hidden, CacheEntry::flat(rows(&[1, 3])));
        // original untouched
        assert_eq!(entry.item_count(), 3);
    }

    #[test]
    fn test_paginated_keeps_empty_pages() {
        let entry = CacheEntry::paginated(vec![rows(&[1, 2]), rows(&[42]), rows(&[5])]);
        let hidden = entry.without(ArticleId(42));

        assert_eq!(hidden.shape(), Shape::Paginated);
        assert_eq!(hidden.pages().len(), 3);
        assert!(hidden.pages()[1].items.is_empty());
        assert_eq!(hidden.pages()[2].items, rows(&[5]));
    }

    #[test]
    fn test_meta_survives_transform() {
        let page = Page::new(rows(&[1, 42]))
            .with_meta("nextCursor", serde_json::json!(17))
            .with_meta("total", serde_json::json!(120));
        let entry = CacheEntry::Flat(page);

        let hidden = entry.without(ArticleId(42));
        let page = &hidden.pages()[0];
        assert_eq!(page.meta.get("nextCursor"), Some(&serde_json::json!(17)));
        assert_eq!(page.meta.get("total"), Some(&serde_json::json!(120)));
    }

    #[test]
    fn test_shape_detected_from_json() {
        let flat: CacheEntry<Row> = serde_json::from_value(serde_json::json!({
            "items": [{"id": 1}],
            "nextCursor": null
        }))
        .unwrap();
        assert_eq!(flat.shape(), Shape::Flat);

        let paged: CacheEntry<Row> = serde_json::from_value(serde_json::json!({
            "pages": [{"items": [{"id": 1}], "nextCursor": 2}, {"items": [], "nextCursor": null}],
            "pageParams": [null, 2]
        }))
        .unwrap();
        assert_eq!(paged.shape(), Shape::Paginated);
        assert_eq!(paged.pages().len(), 2);
        assert!(paged.contains(ArticleId(1)));
    }

    #[test]
    fn test_page_without_items_field() {
        // Row has no Default impl; a missing list still decodes as empty
        let paged: CacheEntry<Row> = serde_json::from_value(serde_json::json!({
            "pages": [{"nextCursor": 4}, {"items": [{"id": 42}]}]
        }))
        .unwrap();

        assert_eq!(paged.shape(), Shape::Paginated);
        assert!(paged.pages()[0].items.is_empty());
        assert_eq!(paged.pages()[0].meta.get("nextCursor"), Some(&serde_json::json!(4)));
        assert!(paged.contains(ArticleId(42)));
    }
}
