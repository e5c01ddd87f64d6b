//! Cache key definitions
//!
//! Keys are path-like descriptors such as `feed/latest` or
//! `search/q=ukraine/page=2`. The first segment names the coarse [`Scope`]
//! used for broad invalidation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse grouping of cache entries
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// Infinite feed, topic and tag filtered feeds
    Feed,
    /// Paginated article search results
    Search,
    /// Search restricted to one tag
    TagSearch,
    /// Reading lists and their items
    Lists,
    Named(String),
}

impl Scope {
    pub fn as_str(&self) -> &str {
        match self {
            Scope::Feed => "feed",
            Scope::Search => "search",
            Scope::TagSearch => "tag-search",
            Scope::Lists => "lists",
            Scope::Named(name) => name,
        }
    }

    pub fn parse(segment: &str) -> Self {
        match segment {
            "feed" => Scope::Feed,
            "search" => Scope::Search,
            "tag-search" => Scope::TagSearch,
            "lists" => Scope::Lists,
            other => Scope::Named(other.to_string()),
        }
    }

    /// Whether a key belongs to this scope
    pub fn contains(&self, key: &CacheKey) -> bool {
        &key.scope == self
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of one cached collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub scope: Scope,
    /// Remaining descriptor segments, e.g. `["q=ukraine", "page=2"]`
    pub params: Vec<String>,
}

impl CacheKey {
    pub fn new(scope: Scope, params: &[&str]) -> Self {
        Self {
            scope,
            params: params.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Parse `scope/param/param`. Empty segments are ignored.
    pub fn parse(descriptor: &str) -> Self {
        let mut segments = descriptor.split('/').filter(|s| !s.is_empty());
        let scope = segments
            .next()
            .map(Scope::parse)
            .unwrap_or_else(|| Scope::Named(String::new()));

        Self {
            scope,
            params: segments.map(String::from).collect(),
        }
    }

    pub fn feed(name: &str) -> Self {
        Self::new(Scope::Feed, &[name])
    }

    pub fn search(query: &str, page: u32, page_size: u32) -> Self {
        Self {
            scope: Scope::Search,
            params: vec![
                format!("q={}", query.trim()),
                format!("page={page}"),
                format!("pageSize={page_size}"),
            ],
        }
    }

    pub fn to_storage_key(&self) -> String {
        let mut out = self.scope.as_str().to_string();
        for param in &self.params {
            out.push('/');
            out.push_str(param);
        }
        out
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_storage_key())
    }
}

impl Serialize for CacheKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_storage_key())
    }
}

impl<'de> Deserialize<'de> for CacheKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(CacheKey::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descriptor() {
        let key = CacheKey::parse("search/q=ukraine/page=2");
        assert_eq!(key.scope, Scope::Search);
        assert_eq!(key.params, vec!["q=ukraine", "page=2"]);
        assert_eq!(key.to_storage_key(), "search/q=ukraine/page=2");
    }

    #[test]
    fn test_unknown_scope_is_named() {
        let key = CacheKey::parse("articleTags");
        assert_eq!(key.scope, Scope::Named("articleTags".to_string()));
        assert!(key.params.is_empty());
    }

    #[test]
    fn test_scope_membership() {
        assert!(Scope::Feed.contains(&CacheKey::feed("latest")));
        assert!(!Scope::Search.contains(&CacheKey::feed("latest")));
        assert!(Scope::Search.contains(&CacheKey::search(" test ", 1, 20)));
    }

    #[test]
    fn test_search_key_trims_query() {
        let key = CacheKey::search("  ukraine ", 2, 20);
        assert_eq!(key.to_string(), "search/q=ukraine/page=2/pageSize=20");
    }
}
