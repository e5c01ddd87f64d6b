//! Optimistic interaction engine
//!
//! Per article and per engine, an interaction moves through
//! `Idle -> Optimistic -> {Committed | Cancelled} -> Idle`:
//!
//! ```text
//!  like/save/hide ──► auth gate ──► snapshot + mutate ──► schedule (3 s)
//!                        │                                   │        │
//!                        ▼                               undo│        │elapsed
//!                  SignInRequired                            ▼        ▼
//!                                                  restore snapshot  commit ──► mark feed stale
//!
//!  report ──► auth gate ──► commit (no window)
//! ```
//!
//! A new deferred action on an article that is still pending replaces the
//! old one: the old timer is dropped together with its snapshot, and the new
//! operation's own snapshot (taken against the already-mutated caches) is what
//! a later undo restores. Each [`UndoHandle`] belongs to the operation that
//! issued it, so the handle of a replaced operation does nothing.
//!
//! A failed commit is reported but not rolled back.
//!
//! `like`, `save`, `hide` and `interact` spawn timer tasks and must be called
//! from within a tokio runtime.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::analytics::{AnalyticsEvent, AnalyticsLogger, EventType};
use crate::cache::CacheStore;
use crate::committer::{Committer, InteractionApi};
use crate::config::EngineConfig;
use crate::error::{InteractionError, Result};
use crate::mutator::OptimisticMutator;
use crate::notify::{Notification, NotificationSink, UndoHandle};
use crate::reconcile::Reconciler;
use crate::scheduler::DeferredScheduler;
use crate::session::AuthGate;
use crate::snapshot::Snapshot;
use crate::types::{ArticleId, CacheItem, InteractionKind, InteractionRequest};

/// What a deferred action did to local state
#[derive(Debug)]
pub struct Scheduled {
    pub article_id: ArticleId,
    pub kind: InteractionKind,
    /// Cache entries changed optimistically (only non-zero for hides)
    pub entries_mutated: usize,
    pub undo: UndoHandle,
    /// Ends once the operation is committed (write finished), cancelled or
    /// replaced
    pub commit_task: JoinHandle<()>,
    /// Fallback invalidation armed by a hide; yields the entries it marked
    pub fallback: Option<JoinHandle<usize>>,
}

impl Scheduled {
    /// Wait for the commit task and any fallback invalidation to finish
    pub async fn settled(self) -> std::result::Result<(), tokio::task::JoinError> {
        self.commit_task.await?;
        if let Some(fallback) = self.fallback {
            fallback.await?;
        }
        Ok(())
    }
}

struct EngineInner<T> {
    config: EngineConfig,
    store: Arc<dyn CacheStore<T>>,
    auth: Arc<dyn AuthGate>,
    notifier: Arc<dyn NotificationSink>,
    analytics: AnalyticsLogger,
    mutator: OptimisticMutator<T>,
    reconciler: Reconciler<T>,
    committer: Committer<T>,
    scheduler: DeferredScheduler<Option<Snapshot<T>>>,
    /// Serialises snapshot-then-mutate and restore against each other
    cache_guard: Mutex<()>,
}

pub struct InteractionEngine<T> {
    inner: Arc<EngineInner<T>>,
}

impl<T> Clone for InteractionEngine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: CacheItem> InteractionEngine<T> {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn CacheStore<T>>,
        api: Arc<dyn InteractionApi>,
        auth: Arc<dyn AuthGate>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self::with_analytics(config, store, api, auth, notifier, AnalyticsLogger::new())
    }

    pub fn with_analytics(
        config: EngineConfig,
        store: Arc<dyn CacheStore<T>>,
        api: Arc<dyn InteractionApi>,
        auth: Arc<dyn AuthGate>,
        notifier: Arc<dyn NotificationSink>,
        analytics: AnalyticsLogger,
    ) -> Self {
        let reconciler = Reconciler::new(Arc::clone(&store));
        let committer = Committer::new(
            api,
            Arc::clone(&auth),
            Arc::clone(&notifier),
            reconciler.clone(),
            analytics.clone(),
            config.commit_scope.clone(),
        );

        info!(
            commit_delay_ms = config.commit_delay.as_millis() as u64,
            fallback_delay_ms = config.fallback_delay.as_millis() as u64,
            "Interaction engine initialized"
        );

        Self {
            inner: Arc::new(EngineInner {
                mutator: OptimisticMutator::new(Arc::clone(&store)),
                scheduler: DeferredScheduler::new(),
                cache_guard: Mutex::new(()),
                config,
                store,
                auth,
                notifier,
                analytics,
                reconciler,
                committer,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Run any interaction kind. Deferred kinds return their [`Scheduled`]
    /// handle; a report is committed before this returns and yields `None`.
    pub async fn interact(&self, request: InteractionRequest) -> Result<Option<Scheduled>> {
        if !request.kind.is_deferred() {
            self.report(request.article_id, request.reason).await?;
            return Ok(None);
        }

        let scheduled = match request.kind {
            InteractionKind::Discard => self.hide(request.article_id)?,
            kind => self.defer(request.article_id, kind)?,
        };
        Ok(Some(scheduled))
    }

    /// Must be called from within a tokio runtime.
    pub fn like(&self, article_id: ArticleId) -> Result<Scheduled> {
        self.defer(article_id, InteractionKind::Like)
    }

    /// Must be called from within a tokio runtime.
    pub fn save(&self, article_id: ArticleId) -> Result<Scheduled> {
        self.defer(article_id, InteractionKind::Save)
    }

    /// Remove the article from every cached view now, write in 3 s.
    ///
    /// Must be called from within a tokio runtime.
    pub fn hide(&self, article_id: ArticleId) -> Result<Scheduled> {
        let mut scheduled = self.defer(article_id, InteractionKind::Discard)?;

        scheduled.fallback = Some(self.inner.reconciler.schedule_fallback(
            self.inner.config.fallback_scope.clone(),
            self.inner.config.fallback_delay,
        ));

        Ok(scheduled)
    }

    /// Send a report right away. There is no undo window.
    pub async fn report(&self, article_id: ArticleId, reason: Option<String>) -> Result<()> {
        let request = InteractionRequest::report(article_id, reason);
        self.ensure_authenticated(article_id, request.kind)?;

        self.inner.committer.commit(request).await?;
        self.inner
            .notifier
            .notify(Notification::Reported { article_id });
        Ok(())
    }

    /// Cancel the pending action on `article_id` and restore whatever it hid.
    ///
    /// Returns `false` when nothing was pending (already committed, already
    /// cancelled, or never scheduled); no snapshot is touched in that case.
    pub fn cancel(&self, article_id: ArticleId) -> bool {
        cancel_pending(&self.inner, article_id, None)
    }

    pub fn is_pending(&self, article_id: ArticleId) -> bool {
        self.inner.scheduler.is_pending(article_id)
    }

    pub fn pending_kind(&self, article_id: ArticleId) -> Option<InteractionKind> {
        self.inner.scheduler.pending_kind(article_id)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.scheduler.len()
    }

    fn ensure_authenticated(&self, article_id: ArticleId, kind: InteractionKind) -> Result<()> {
        if self.inner.auth.is_authenticated() {
            return Ok(());
        }

        warn!(article_id = %article_id, kind = %kind, "Interaction rejected: not signed in");
        self.inner
            .analytics
            .track(EventType::Rejected, article_id, kind);
        self.inner.notifier.notify(Notification::SignInRequired);
        Err(InteractionError::Unauthenticated)
    }

    fn defer(&self, article_id: ArticleId, kind: InteractionKind) -> Result<Scheduled> {
        self.ensure_authenticated(article_id, kind)?;

        let inner = &self.inner;
        let (entries_mutated, armed) = {
            let _guard = inner.cache_guard.lock();

            let snapshot = inner.mutator.apply(kind, article_id);
            let entries_mutated = snapshot.as_ref().map(Snapshot::len).unwrap_or(0);

            let weak = Arc::downgrade(inner);
            let armed = inner.scheduler.schedule(
                article_id,
                kind,
                inner.config.commit_delay,
                snapshot,
                move |op| async move {
                    // Committed operations never restore
                    drop(op.payload);
                    let Some(inner) = weak.upgrade() else {
                        return;
                    };
                    let request = InteractionRequest::new(op.article_id, op.kind);
                    // Failure is already logged and notified by the committer
                    let _ = inner.committer.commit(request).await;
                },
            );

            (entries_mutated, armed)
        };

        inner
            .analytics
            .track(EventType::Optimistic, article_id, kind);
        info!(
            article_id = %article_id,
            kind = %kind,
            entries_mutated,
            "Optimistic interaction applied"
        );

        let weak: Weak<EngineInner<T>> = Arc::downgrade(inner);
        let generation = armed.generation;
        let undo = UndoHandle::new(article_id, kind, move || match weak.upgrade() {
            Some(inner) => cancel_pending(&inner, article_id, Some(generation)),
            None => false,
        });

        inner.notifier.notify(Notification::Scheduled {
            article_id,
            kind,
            undo: undo.clone(),
        });

        Ok(Scheduled {
            article_id,
            kind,
            entries_mutated,
            undo,
            commit_task: armed.task,
            fallback: None,
        })
    }
}

/// Cancel what is pending for `article_id`. With a `generation`, only that
/// exact operation is cancelled; a newer one that replaced it stays pending.
fn cancel_pending<T: CacheItem>(
    inner: &EngineInner<T>,
    article_id: ArticleId,
    generation: Option<u64>,
) -> bool {
    let _guard = inner.cache_guard.lock();

    // Claiming the slot first guards the race with an elapsing timer
    let claimed = match generation {
        Some(generation) => inner.scheduler.take_generation(article_id, generation),
        None => inner.scheduler.take(article_id),
    };
    let Some(op) = claimed else {
        info!(article_id = %article_id, "Undo ignored: nothing pending");
        return false;
    };

    let restored = op
        .payload
        .as_ref()
        .map(|snapshot| snapshot.restore(inner.store.as_ref()))
        .unwrap_or(0);

    inner.analytics.log(
        AnalyticsEvent::new(EventType::Undo, article_id, op.kind)
            .with_metadata(serde_json::json!({ "entries_restored": restored })),
    );
    info!(
        article_id = %article_id,
        kind = %op.kind,
        entries_restored = restored,
        "Interaction cancelled"
    );
    true
}
