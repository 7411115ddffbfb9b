//! Mensa sync service entry point.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mensa_sync::cache::CacheStore;
use mensa_sync::config::Config;
use mensa_sync::db::{self, SettingsStore};
use mensa_sync::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Mensa sync service");
    tracing::info!("Mensa API: {}", config.api_base_url);
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_key.is_none() {
        tracing::warn!("No Mensa API key configured (MENSA_API_KEY). Remote calls will likely be rejected");
    }
    if config.local_psk.is_none() {
        tracing::warn!("No local PSK configured (MENSA_LOCAL_PSK). Authentication is disabled!");
    }
    if !config.chat_enabled {
        tracing::warn!("Chat store disabled (MENSA_CHAT_ENABLED=false)");
    }

    let pool = db::init_database(&config.db_path).await?;
    let settings = SettingsStore::new(pool.clone());

    // Restore the response cache from the last run
    let cache = Arc::new(CacheStore::with_system_clock());
    match settings.load_cache_snapshot().await {
        Ok(Some(snapshot)) => cache.restore(snapshot).await,
        Ok(None) => tracing::info!("No cache snapshot to restore"),
        Err(e) => tracing::warn!("Failed to load cache snapshot: {}", e),
    }

    let bind_addr = config.bind_addr;
    let state = AppState::build(config, pool, cache.clone())?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, persisting cache snapshot");
    if let Err(e) = settings.save_cache_snapshot(&cache.snapshot().await).await {
        tracing::warn!("Failed to persist cache snapshot: {}", e);
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
