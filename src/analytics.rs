//! Interaction analytics
//!
//! Every optimistic action, undo and commit outcome is recorded as an
//! [`AnalyticsEvent`]. Events always go to `tracing`; when a path is
//! configured they are also appended to a JSONL file.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::types::{ArticleId, InteractionKind};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Instant feedback applied, write deferred
    Optimistic,
    /// Pending write cancelled by the user
    Undo,
    /// Authoritative write succeeded
    Committed,
    CommitFailed,
    /// Rejected before any state change (not signed in)
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub article_id: ArticleId,
    pub kind: InteractionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl AnalyticsEvent {
    pub fn new(event_type: EventType, article_id: ArticleId, kind: InteractionKind) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            article_id,
            kind,
            reason: None,
            metadata: None,
        }
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Clone, Default)]
pub struct AnalyticsLogger {
    inner: Arc<Mutex<AnalyticsLoggerInner>>,
}

#[derive(Default)]
struct AnalyticsLoggerInner {
    writer: Option<BufWriter<File>>,
    recorded: u64,
}

impl AnalyticsLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append events to `path` from now on
    pub fn init_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut inner = self.inner.lock();
        inner.writer = Some(BufWriter::new(file));

        info!("Analytics logging initialized to {}", path.display());
        Ok(())
    }

    pub fn log(&self, event: AnalyticsEvent) {
        debug!(
            event = ?event.event_type,
            article_id = %event.article_id,
            kind = %event.kind,
            "analytics"
        );

        let mut inner = self.inner.lock();
        inner.recorded += 1;

        let Some(writer) = inner.writer.as_mut() else {
            return;
        };

        let line = match event.to_jsonl() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize analytics event: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(writer, "{}", line) {
            error!("Failed to write analytics event: {}", e);
        }
        if let Err(e) = writer.flush() {
            error!("Failed to flush analytics log: {}", e);
        }
    }

    pub fn track(&self, event_type: EventType, article_id: ArticleId, kind: InteractionKind) {
        self.log(AnalyticsEvent::new(event_type, article_id, kind));
    }

    /// Events recorded since creation, file or not
    pub fn recorded(&self) -> u64 {
        self.inner.lock().recorded
    }
}
