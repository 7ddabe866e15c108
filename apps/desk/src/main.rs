mod config;
mod desk;
mod errors;
mod models;
mod routes;
mod session;
mod state;
mod store;
mod transport;
mod wizard;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::desk::Desk;
use crate::routes::build_router;
use crate::session::memory::MemorySessionStore;
use crate::session::redis::RedisSessionStore;
use crate::session::SessionStore;
use crate::state::AppState;
use crate::store::postgres::PgRecordStore;
use crate::transport::telegram::TelegramClient;

const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(60);

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

    info!("Starting applicant desk v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let store = Arc::new(PgRecordStore::connect(&config.database_url).await?);

    // Sessions: Redis when configured, otherwise process memory with a sweeper
    let sessions: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisSessionStore::connect(url, config.session_ttl).await?),
        None => {
            let memory = Arc::new(MemorySessionStore::new(config.session_ttl));
            memory.clone().spawn_sweeper(SESSION_SWEEP_PERIOD);
            info!("Using in-memory sessions (ttl {:?})", config.session_ttl);
            memory
        }
    };

    // Initialize chat transport
    let transport = Arc::new(TelegramClient::new(
        &config.telegram_api_url,
        &config.telegram_token,
    ));
    info!("Telegram client initialized");

    let state = AppState {
        desk: Arc::new(Desk::new(sessions, store)),
        transport,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
