//! Reconciliation trigger
//!
//! Two paths mark cached data for refetch:
//!
//! - **Primary**: after a successful commit the commit scope (the feed) is
//!   marked stale so authoritative state replaces the optimistic guess.
//! - **Fallback**: after a hide, the search scope is marked stale once a fixed
//!   delay has passed, whether or not the hide was undone. Restore can only
//!   reach entries that existed when the snapshot was taken; this covers the
//!   rest.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheStore, Scope};

/// Default delay for the fallback invalidation after a hide
pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_millis(3500);

pub struct Reconciler<T> {
    store: Arc<dyn CacheStore<T>>,
}

impl<T> Clone for Reconciler<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: Send + Sync + 'static> Reconciler<T> {
    pub fn new(store: Arc<dyn CacheStore<T>>) -> Self {
        Self { store }
    }

    pub fn mark_stale(&self, scope: &Scope) -> usize {
        let marked = self.store.mark_stale(scope);
        debug!(scope = %scope, marked, "Reconciliation requested");
        marked
    }

    /// Mark `scope` stale `delay` after this call. Not tied to any pending
    /// operation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule_fallback(&self, scope: Scope, delay: Duration) -> JoinHandle<usize> {
        // Measured from the call, not from when the task is first polled
        let deadline = Instant::now() + delay;
        let reconciler = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            debug!(scope = %scope, "Fallback invalidation");
            reconciler.mark_stale(&scope)
        })
    }
}
