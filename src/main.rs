//! interactctl - drive one interaction through the optimistic engine

use clap::Parser;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use interaction_core::{
    analytics::AnalyticsLogger,
    config::{ActionCommand, Args},
    http::HttpInteractionApi,
    notify::{LogSink, Notification, NotificationSink},
    session::Session,
    ArticleId, CacheEntry, CacheKey, CacheStore, ContentItem, InteractionEngine, InteractionKind,
    InteractionRequest, MemoryCacheStore,
};

/// Logs every notification and remembers whether anything failed
#[derive(Default)]
struct CliSink {
    failed: AtomicBool,
}

impl NotificationSink for CliSink {
    fn notify(&self, notification: Notification) {
        if matches!(
            notification,
            Notification::CommitFailed { .. } | Notification::SignInRequired
        ) {
            self.failed.store(true, Ordering::SeqCst);
        }
        LogSink.notify(notification);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("interaction_core={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("API: {}", args.api_base);
    info!("Signed in: {}", args.access_token.is_some());
    info!("Undo window: {}ms", args.commit_delay_ms);

    let store = Arc::new(match &args.cache_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let entries: HashMap<CacheKey, CacheEntry<ContentItem>> = serde_json::from_str(&raw)?;
            info!("Seeded {} cache entries from {}", entries.len(), path.display());
            MemoryCacheStore::from_entries(entries)
        }
        None => MemoryCacheStore::new(),
    });

    let analytics = AnalyticsLogger::new();
    if let Some(path) = &args.analytics_log {
        analytics.init_file(path.clone())?;
    }

    let sink = Arc::new(CliSink::default());
    let api = HttpInteractionApi::new(&args.api_base, Duration::from_secs(args.request_timeout_secs))?;
    let engine = InteractionEngine::with_analytics(
        args.engine_config(),
        store.clone() as Arc<dyn CacheStore<ContentItem>>,
        Arc::new(api),
        Arc::new(Session::new(args.access_token.clone())),
        sink.clone(),
        analytics,
    );

    let request = match &args.action {
        ActionCommand::Like(action) => {
            InteractionRequest::new(ArticleId(action.article_id), InteractionKind::Like)
        }
        ActionCommand::Save(action) => {
            InteractionRequest::new(ArticleId(action.article_id), InteractionKind::Save)
        }
        ActionCommand::Hide(action) => {
            InteractionRequest::new(ArticleId(action.article_id), InteractionKind::Discard)
        }
        ActionCommand::Report { article_id, reason } => {
            InteractionRequest::report(ArticleId(*article_id), reason.clone())
        }
    };
    let article_id = request.article_id;

    let scheduled = match engine.interact(request).await {
        Ok(Some(scheduled)) => scheduled,
        Ok(None) => {
            print_cache(&store);
            return Ok(());
        }
        Err(e) => {
            error!("Action on article {} failed: {}", article_id, e);
            std::process::exit(1);
        }
    };
    info!("Entries changed optimistically: {}", scheduled.entries_mutated);
    print_cache(&store);

    if let Some(undo_after) = args.undo_after_ms() {
        tokio::time::sleep(Duration::from_millis(undo_after)).await;
        info!("Undo pressed: {}", scheduled.undo.undo());
    }

    // Wait for the write itself, however long the server takes
    scheduled.settled().await?;

    print_cache(&store);
    if sink.failed.load(Ordering::SeqCst) {
        std::process::exit(1);
    }
    Ok(())
}

fn print_cache(store: &MemoryCacheStore<ContentItem>) {
    for key in store.keys() {
        if let Some(entry) = store.get(&key) {
            info!(
                "  {} [{:?}] items={} stale={}",
                key,
                entry.shape(),
                entry.item_count(),
                store.is_stale(&key)
            );
        }
    }
}
