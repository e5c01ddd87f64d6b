//! Deferred commit scheduler
//!
//! Holds at most one pending operation per article. Scheduling again for the
//! same article replaces the previous operation (its timer never fires).
//! Whoever removes the slot first wins: the elapsed timer claims it by
//! generation, `cancel`/`take` claim it by key, and both go through the same
//! DashMap shard lock, so a commit never runs after a successful cancel.
//!
//! Timers run on tokio's clock, so tests drive them with a paused runtime.

use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::types::{ArticleId, InteractionKind};

/// Default undo window for deferred interactions
pub const DEFAULT_COMMIT_DELAY: Duration = Duration::from_millis(3000);

/// Ephemeral record of a scheduled write
#[derive(Debug)]
pub struct PendingOperation<P> {
    pub article_id: ArticleId,
    pub kind: InteractionKind,
    pub deadline: Instant,
    pub generation: u64,
    /// Data owned by the operation until it commits or is cancelled
    pub payload: P,
}

/// Returned by [`DeferredScheduler::schedule`]
#[derive(Debug)]
pub struct ArmedTimer {
    /// Identifies this operation among every operation ever scheduled for
    /// the article
    pub generation: u64,
    /// Finishes when the operation is replaced, cancelled, or committed
    /// (after `commit` returns)
    pub task: JoinHandle<()>,
}

struct PendingSlot<P> {
    op: PendingOperation<P>,
    // Dropping the sender wakes the timer task so it can exit early
    _cancel: oneshot::Sender<()>,
}

pub struct DeferredScheduler<P> {
    pending: Arc<DashMap<ArticleId, PendingSlot<P>>>,
    next_generation: AtomicU64,
}

impl<P: Send + Sync + 'static> DeferredScheduler<P> {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Arm a timer for `article_id`; `commit` receives the operation when it
    /// elapses. Any operation already pending for the article is discarded.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(
        &self,
        article_id: ArticleId,
        kind: InteractionKind,
        delay: Duration,
        payload: P,
        commit: F,
    ) -> ArmedTimer
    where
        F: FnOnce(PendingOperation<P>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + delay;
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let slot = PendingSlot {
            op: PendingOperation {
                article_id,
                kind,
                deadline,
                generation,
                payload,
            },
            _cancel: cancel_tx,
        };

        // Insert before spawning so a zero delay cannot fire ahead of its slot
        if let Some(replaced) = self.pending.insert(article_id, slot) {
            info!(
                article_id = %article_id,
                replaced = %replaced.op.kind,
                kind = %kind,
                "Pending interaction replaced"
            );
        }

        let pending = Arc::clone(&self.pending);
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                _ = cancel_rx => {
                    debug!(article_id = %article_id, generation, "Deferred timer released");
                    return;
                }
            }

            let claimed = pending
                .remove_if(&article_id, |_, slot| slot.op.generation == generation)
                .map(|(_, slot)| slot.op);

            if let Some(op) = claimed {
                debug!(article_id = %article_id, kind = %op.kind, "Deferred timer elapsed");
                commit(op).await;
            }
        });

        debug!(
            article_id = %article_id,
            kind = %kind,
            delay_ms = delay.as_millis() as u64,
            "Interaction scheduled"
        );
        ArmedTimer { generation, task }
    }

    /// Remove and return the pending operation, stopping its timer
    pub fn take(&self, article_id: ArticleId) -> Option<PendingOperation<P>> {
        self.pending.remove(&article_id).map(|(_, slot)| slot.op)
    }

    /// Like [`take`](Self::take), but only while `generation` is still the
    /// pending operation. Once it was replaced or has fired this is `None`.
    pub fn take_generation(
        &self,
        article_id: ArticleId,
        generation: u64,
    ) -> Option<PendingOperation<P>> {
        self.pending
            .remove_if(&article_id, |_, slot| slot.op.generation == generation)
            .map(|(_, slot)| slot.op)
    }

    /// Cancel the pending operation. Returns whether anything was cancelled.
    pub fn cancel(&self, article_id: ArticleId) -> bool {
        self.take(article_id).is_some()
    }

    pub fn is_pending(&self, article_id: ArticleId) -> bool {
        self.pending.contains_key(&article_id)
    }

    pub fn pending_kind(&self, article_id: ArticleId) -> Option<InteractionKind> {
        self.pending.get(&article_id).map(|slot| slot.op.kind)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<P: Send + Sync + 'static> Default for DeferredScheduler<P> {
    fn default() -> Self {
        Self::new()
    }
}
