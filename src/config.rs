//! Configuration
//!
//! [`EngineConfig`] carries the timing constants of the engine; [`Args`] is
//! the command line of the `interactctl` binary (clap, with env fallbacks).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::Scope;
use crate::reconcile::DEFAULT_FALLBACK_DELAY;
use crate::scheduler::DEFAULT_COMMIT_DELAY;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Undo window before a deferred write is sent (default: 3 s)
    pub commit_delay: Duration,
    /// Delay before the fallback invalidation after a hide (default: 3.5 s)
    pub fallback_delay: Duration,
    /// Scope refreshed after a successful write
    pub commit_scope: Scope,
    /// Scope refreshed by the fallback invalidation
    pub fallback_scope: Scope,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            commit_delay: DEFAULT_COMMIT_DELAY,
            fallback_delay: DEFAULT_FALLBACK_DELAY,
            commit_scope: Scope::Feed,
            fallback_scope: Scope::Search,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("INTERACTION_COMMIT_DELAY_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                config.commit_delay = Duration::from_millis(ms);
            }
        }

        if let Ok(val) = std::env::var("INTERACTION_FALLBACK_DELAY_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                config.fallback_delay = Duration::from_millis(ms);
            }
        }

        config
    }

    pub fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.commit_delay = delay;
        self
    }
}

/// interactctl - send one interaction through the optimistic engine
#[derive(Parser, Debug, Clone)]
#[command(name = "interactctl")]
#[command(about = "Like, save, hide or report an article with an undo window")]
pub struct Args {
    /// Base URL of the news API
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:8080")]
    pub api_base: String,

    /// Bearer token of the signed-in user
    #[arg(long, env = "ACCESS_TOKEN")]
    pub access_token: Option<String>,

    /// Undo window in milliseconds
    #[arg(long, env = "INTERACTION_COMMIT_DELAY_MS", default_value = "3000")]
    pub commit_delay_ms: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Append analytics events to this JSONL file
    #[arg(long, env = "ANALYTICS_LOG")]
    pub analytics_log: Option<PathBuf>,

    /// JSON object of cache descriptor -> entry used to seed the cache
    #[arg(long)]
    pub cache_file: Option<PathBuf>,

    #[command(subcommand)]
    pub action: ActionCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ActionCommand {
    Like(DeferredAction),
    Save(DeferredAction),
    /// Hide an article from every cached view
    Hide(DeferredAction),
    Report {
        article_id: i64,
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct DeferredAction {
    pub article_id: i64,

    /// Press undo this many milliseconds after the action
    #[arg(long)]
    pub undo_after_ms: Option<u64>,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_base.trim().is_empty() {
            return Err("API base URL must not be empty".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be at least one second".to_string());
        }

        if let Some(undo_after) = self.undo_after_ms() {
            if undo_after >= self.commit_delay_ms {
                return Err(format!(
                    "Undo after {}ms would miss the {}ms window",
                    undo_after, self.commit_delay_ms
                ));
            }
        }

        Ok(())
    }

    pub fn undo_after_ms(&self) -> Option<u64> {
        match &self.action {
            ActionCommand::Like(a) | ActionCommand::Save(a) | ActionCommand::Hide(a) => a.undo_after_ms,
            ActionCommand::Report { .. } => None,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::from_env().with_commit_delay(Duration::from_millis(self.commit_delay_ms))
    }
}
