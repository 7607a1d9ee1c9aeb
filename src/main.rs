//! Vitrina - WhatsApp sales assistant for a brand bag & shoe shop
//!
//! Entry point for the webhook server.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vitrina_channels::{GreenApiAdapter, GreenApiConfig};
use vitrina_core::{
    LlmFieldExtractor, MessageAggregator, Orchestrator, OrderNotifier,
};
use vitrina_llm::{OpenAiConfig, OpenAiProvider};
use vitrina_storage::SqliteStore;

mod catalog;
mod config;
mod server;

use catalog::CatalogIndex;
use config::AppConfig;

/// How often idle conversation locks are swept
const LOCK_EVICTION_INTERVAL_SECS: u64 = 600;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitrina=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Vitrina v{}", env!("CARGO_PKG_VERSION"));

    let app_config = AppConfig::from_env().context("Invalid configuration")?;

    let store = Arc::new(
        SqliteStore::from_path(std::path::Path::new(&app_config.database_path))
            .await
            .context("Failed to open database")?,
    );
    let catalog = Arc::new(
        CatalogIndex::load(&app_config.catalog_path).context("Failed to load catalog")?,
    );
    let provider = Arc::new(OpenAiProvider::new(OpenAiConfig::from_env()?)?);
    let channel = Arc::new(GreenApiAdapter::new(GreenApiConfig::from_env()?)?);
    let extractor = Arc::new(LlmFieldExtractor::new(provider.clone()));

    let notifier = OrderNotifier::new(channel.clone(), app_config.order_group_chat_id.clone());
    let orchestrator = Arc::new(
        Orchestrator::new(
            extractor,
            catalog.clone(),
            catalog.clone(),
            catalog,
            provider,
            store,
            channel,
            app_config.core.clone(),
        )
        .with_notifier(notifier),
    );

    let eviction = Arc::clone(&orchestrator);
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(LOCK_EVICTION_INTERVAL_SECS));
        loop {
            interval.tick().await;
            eviction.evict_idle_locks();
        }
    });

    let aggregator = MessageAggregator::new(orchestrator, app_config.core.aggregation_delay());
    let app = server::router(server::AppState { aggregator });

    let listener = tokio::net::TcpListener::bind(&app_config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on http://{}", app_config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Vitrina shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutdown signal received");
}
