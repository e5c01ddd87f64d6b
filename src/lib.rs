//! interaction-core - optimistic interactions for a news reader
//!
//! Lets a user like, save, hide or report an article with instant feedback
//! while the authoritative write is deferred behind an undo window and the
//! result is reconciled across every cached view of the same article.
//!
//! ## Components
//!
//! - **Scheduler**: one cancellable timer per article, last action wins
//! - **Committer**: the single authoritative write, via [`committer::InteractionApi`]
//! - **Cache**: flat and paginated entries behind [`cache::CacheStore`]
//! - **Mutator / Snapshot**: hide now, restore verbatim on undo
//! - **Reconciler**: mark scopes stale after commits, plus a timed fallback
//! - **Engine**: the per-article state machine tying these together

pub mod analytics;
pub mod cache;
pub mod committer;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod mutator;
pub mod notify;
pub mod reconcile;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod types;

pub use cache::{CacheEntry, CacheKey, CacheStore, MemoryCacheStore, Page, Scope, Shape};
pub use config::{Args, EngineConfig};
pub use engine::{InteractionEngine, Scheduled};
pub use error::{InteractionError, Result};
pub use notify::{Notification, NotificationSink, UndoHandle};
pub use types::{ArticleId, CacheItem, ContentItem, InteractionKind, InteractionRequest};
