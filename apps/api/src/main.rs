mod auth;
mod config;
mod dashboard;
mod db;
mod errors;
mod events;
mod hooks;
mod models;
mod proxy;
mod routes;
mod state;
mod store;
mod youtube;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::dashboard::sessions::DashboardSessions;
use crate::db::create_pool;
use crate::events::{EventLogger, LocalBufferSink, StoreSink};
use crate::proxy::transport::{HttpProxy, LocalProxy, ProxyTransport};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, Store};
use crate::youtube::{VideoPlatform, YouTubeClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Companion API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;

    // Initialize the platform client behind the proxy
    let platform: Arc<dyn VideoPlatform> = Arc::new(YouTubeClient::new(
        config.youtube_api_key.clone(),
        config.youtube_api_base.clone(),
    ));
    if !platform.is_configured() {
        warn!("YOUTUBE_API_KEY is not set; every proxy call will fail");
    }

    let transport: Arc<dyn ProxyTransport> = match &config.proxy_url {
        Some(url) => {
            info!("Dashboard proxy: {url}");
            Arc::new(HttpProxy::new(url.clone()))
        }
        None => Arc::new(LocalProxy::new(platform.clone())),
    };

    // Events go to the store, falling back to a bounded local buffer
    let event_buffer = Arc::new(LocalBufferSink::new(config.event_buffer_capacity));
    let events = EventLogger::new(
        Arc::new(StoreSink::new(store.clone())),
        event_buffer.clone(),
        config.user_agent.clone(),
    );

    let state = AppState {
        store,
        platform,
        transport,
        events,
        event_buffer,
        dashboards: DashboardSessions::default(),
        config: config.clone(),
    };

    // CORS for the proxy endpoint is applied inside the router
    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Connects the configured backend store.
async fn build_store(config: &Config) -> Result<Arc<dyn Store>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres store")?;
            let pool = create_pool(database_url).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Memory => {
            let store = MemoryStore::new();
            if let Some(token) = &config.dev_session_token {
                let user_id = Uuid::new_v4();
                store.insert_session(token.clone(), user_id);
                info!(%user_id, "Seeded development session");
            }
            warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(store))
        }
    }
}
