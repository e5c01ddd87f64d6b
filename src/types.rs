//! Core interaction types
//!
//! Content items are never constructed here; they arrive from the feed,
//! search and reading-list endpoints and are only ever referenced by their
//! [`ArticleId`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to an article. The same id may sit in many cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub i64);

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ArticleId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The closed set of user interactions on an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionKind {
    Like,
    Save,
    /// Hide the article from every view
    Discard,
    Report,
}

impl InteractionKind {
    /// Numeric code expected by the interactions endpoint
    pub fn wire_code(&self) -> u8 {
        match self {
            InteractionKind::Like => 0,
            InteractionKind::Save => 1,
            InteractionKind::Discard => 2,
            InteractionKind::Report => 3,
        }
    }

    /// Deferred kinds go through the undo window; reports commit immediately
    pub fn is_deferred(&self) -> bool {
        !matches!(self, InteractionKind::Report)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Like => "like",
            InteractionKind::Save => "save",
            InteractionKind::Discard => "discard",
            InteractionKind::Report => "report",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One authoritative write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRequest {
    pub article_id: ArticleId,
    pub kind: InteractionKind,
    /// Only meaningful for reports
    pub reason: Option<String>,
}

impl InteractionRequest {
    pub fn new(article_id: ArticleId, kind: InteractionKind) -> Self {
        Self {
            article_id,
            kind,
            reason: None,
        }
    }

    pub fn report(article_id: ArticleId, reason: Option<String>) -> Self {
        Self {
            article_id,
            kind: InteractionKind::Report,
            reason: reason.filter(|r| !r.trim().is_empty()),
        }
    }
}

// ============================================================================
// Cached item records
// ============================================================================

/// Anything that can live in a cached page and be matched by article id
pub trait CacheItem: Clone + Send + Sync + 'static {
    fn article_id(&self) -> ArticleId;
}

/// Item of the personalised feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub feed_item_id: i64,
    pub article_id: ArticleId,
    pub title: String,
    pub url: String,
    pub canonical_url: String,
    pub excerpt: Option<String>,
    pub image_url: Option<String>,
    pub author: String,
    pub word_count: u32,
    pub lang: String,
    /// ISO 8601
    pub published_at: String,
    pub score: f64,
    pub source_name: String,
    pub source_type: String,
    pub topics: Option<Vec<String>>,
    pub estimated_reading_minutes: u32,
}

/// Row of a search result page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub article_id: ArticleId,
    pub title: String,
    pub excerpt: String,
    pub image_url: Option<String>,
    pub source_name: String,
    pub published_at: String,
}

/// Article saved in a reading list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingListItem {
    pub list_id: i64,
    pub article_id: ArticleId,
    pub added_at: String,
    #[serde(default)]
    pub note: Option<String>,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
}

/// Union of every item shape the client caches, so one store can hold feed,
/// search and reading-list entries side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentItem {
    Feed(FeedItem),
    Search(SearchItem),
    ReadingList(ReadingListItem),
}

impl CacheItem for FeedItem {
    fn article_id(&self) -> ArticleId {
        self.article_id
    }
}

impl CacheItem for SearchItem {
    fn article_id(&self) -> ArticleId {
        self.article_id
    }
}

impl CacheItem for ReadingListItem {
    fn article_id(&self) -> ArticleId {
        self.article_id
    }
}

impl CacheItem for ContentItem {
    fn article_id(&self) -> ArticleId {
        match self {
            ContentItem::Feed(item) => item.article_id,
            ContentItem::Search(item) => item.article_id,
            ContentItem::ReadingList(item) => item.article_id,
        }
    }
}
