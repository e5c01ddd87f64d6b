//! Interaction committer
//!
//! Performs exactly one authoritative write per call. A failed write is
//! reported to the user and returned to the caller; it is never retried and it
//! does not roll back whatever optimistic change was already applied.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::analytics::{AnalyticsEvent, AnalyticsLogger, EventType};
use crate::cache::Scope;
use crate::error::{InteractionError, Result};
use crate::notify::{Notification, NotificationSink};
use crate::reconcile::Reconciler;
use crate::session::AuthGate;
use crate::types::InteractionRequest;

/// Authoritative write endpoint
#[async_trait]
pub trait InteractionApi: Send + Sync {
    async fn post_interaction(
        &self,
        request: &InteractionRequest,
        access_token: Option<&str>,
    ) -> Result<()>;
}

pub struct Committer<T> {
    api: Arc<dyn InteractionApi>,
    auth: Arc<dyn AuthGate>,
    notifier: Arc<dyn NotificationSink>,
    reconciler: Reconciler<T>,
    analytics: AnalyticsLogger,
    /// Scope refreshed after every successful write
    commit_scope: Scope,
}

impl<T: Send + Sync + 'static> Committer<T> {
    pub fn new(
        api: Arc<dyn InteractionApi>,
        auth: Arc<dyn AuthGate>,
        notifier: Arc<dyn NotificationSink>,
        reconciler: Reconciler<T>,
        analytics: AnalyticsLogger,
        commit_scope: Scope,
    ) -> Self {
        Self {
            api,
            auth,
            notifier,
            reconciler,
            analytics,
            commit_scope,
        }
    }

    pub async fn commit(&self, request: InteractionRequest) -> Result<()> {
        let token = self.auth.access_token();

        match self.api.post_interaction(&request, token.as_deref()).await {
            Ok(()) => {
                info!(
                    article_id = %request.article_id,
                    kind = %request.kind,
                    "Interaction committed"
                );
                self.analytics.log(
                    AnalyticsEvent::new(EventType::Committed, request.article_id, request.kind)
                        .with_reason(request.reason.clone()),
                );
                self.reconciler.mark_stale(&self.commit_scope);
                Ok(())
            }
            Err(e) => {
                warn!(
                    article_id = %request.article_id,
                    kind = %request.kind,
                    error = %e,
                    "Interaction commit failed"
                );
                self.analytics.log(
                    AnalyticsEvent::new(EventType::CommitFailed, request.article_id, request.kind)
                        .with_metadata(serde_json::json!({ "error": e.to_string() })),
                );

                let notification = match &e {
                    InteractionError::Unauthenticated => Notification::SignInRequired,
                    other => Notification::CommitFailed {
                        article_id: request.article_id,
                        kind: request.kind,
                        message: other.to_string(),
                    },
                };
                self.notifier.notify(notification);
                Err(e)
            }
        }
    }
}
