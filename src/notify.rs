//! Notification sink
//!
//! Fire-and-forget messages for the user. The engine does not care how they
//! are rendered (toast, status line, log).

use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::types::{ArticleId, InteractionKind};

/// Callback that cancels a pending interaction and restores its snapshot.
///
/// Cloning is cheap; every clone drives the same cancellation. Calling it once
/// the commit already fired does nothing and returns `false`.
#[derive(Clone)]
pub struct UndoHandle {
    article_id: ArticleId,
    kind: InteractionKind,
    action: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl UndoHandle {
    pub fn new<F>(article_id: ArticleId, kind: InteractionKind, action: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            article_id,
            kind,
            action: Arc::new(action),
        }
    }

    pub fn undo(&self) -> bool {
        (self.action)()
    }

    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }

    pub fn kind(&self) -> InteractionKind {
        self.kind
    }
}

impl fmt::Debug for UndoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoHandle")
            .field("article_id", &self.article_id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Notification {
    /// Action rejected because nobody is signed in
    SignInRequired,
    /// Deferred action accepted; undo is available until the window closes
    Scheduled {
        article_id: ArticleId,
        kind: InteractionKind,
        undo: UndoHandle,
    },
    Reported { article_id: ArticleId },
    /// The authoritative write failed. Optimistic state is left as-is.
    CommitFailed {
        article_id: ArticleId,
        kind: InteractionKind,
        message: String,
    },
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Sink that only logs; used when no UI is attached
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::SignInRequired => info!("Sign in to continue"),
            Notification::Scheduled { article_id, kind, .. } => {
                info!(article_id = %article_id, kind = %kind, "Action scheduled, undo available")
            }
            Notification::Reported { article_id } => {
                info!(article_id = %article_id, "Thanks for your report")
            }
            Notification::CommitFailed {
                article_id,
                kind,
                message,
            } => info!(article_id = %article_id, kind = %kind, error = %message, "Action failed"),
        }
    }
}
