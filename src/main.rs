use anyhow::{Context, Result};

use feedscroll::api::FeedClient;
use feedscroll::config::AppConfig;
use feedscroll::internal::document::{Document, MemoryDocument};
use feedscroll::utils::html::text_preview;
use feedscroll::{EngineEvent, FeedEngine};

/// Headless pagination harness: seed an in-memory page from a server-rendered
/// HTML snapshot, scroll it to exhaustion against the configured platform,
/// and print a text preview of everything that was fetched.
#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load();

    // Stdout carries the rendered preview, so tracing writes to a daily
    // rolling file. RUST_LOG takes precedence over the configured levels.
    let log_dir = config.logging.log_directory.as_deref().unwrap_or("logs");
    let file_appender = tracing_appender::rolling::daily(log_dir, "feedscroll.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::EnvFilter::from_default_env(),
        Err(_) => {
            let mut filter = config.logging.level.clone();
            for (module, level) in &config.logging.module_levels {
                filter.push_str(&format!(",{module}={level}"));
            }
            tracing_subscriber::EnvFilter::new(filter)
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .compact()
        .init();

    let snapshot = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "page.html".to_string());
    let html = std::fs::read_to_string(&snapshot)
        .with_context(|| format!("failed to read page snapshot {snapshot}"))?;

    let mut doc = MemoryDocument::from_html(&html, &config.location);
    doc.set_auto_scroll(true);

    let client = FeedClient::new(&config.base_url, config.fetch_options())?
        .with_csrf_token(doc.csrf_token());

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                EngineEvent::PageInserted { fresh, replaced } => {
                    tracing::info!(fresh, replaced, "page inserted");
                }
                other => tracing::debug!(event = ?other, "engine event"),
            }
        }
    });

    let mut engine =
        FeedEngine::attach(doc, client, config.engine_options())?.with_events(event_tx);
    engine.run_until_exhausted().await?;

    let doc = engine.into_document();
    let appended = doc.appended_html();
    if appended.is_empty() {
        tracing::info!("no additional content fetched");
    } else {
        println!("{}", text_preview(&appended));
    }

    Ok(())
}
