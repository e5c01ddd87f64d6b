//! Multi-view cache abstraction
//!
//! - `keys`: descriptors and coarse scopes
//! - `entry`: flat / paginated entry shapes
//! - `store`: the read/write primitive and its in-memory implementation

pub mod entry;
pub mod keys;
pub mod store;

pub use entry::{CacheEntry, Page, PagedEntry, Shape};
pub use keys::{CacheKey, Scope};
pub use store::{CacheStore, EntryPredicate, MemoryCacheStore, StoreStats};
