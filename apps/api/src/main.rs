mod completion;
mod config;
mod errors;
mod matching;
mod models;
mod profile;
mod research;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::completion::{cache::ResponseCache, CompletionClient, CompletionGateway, PerplexityGateway};
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::ProfileStore;

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

    info!("Starting ScholarMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Profile store: in-memory by design — nothing survives a restart
    let store = ProfileStore::new();

    // Completion gateway with its own response cache
    let client = CompletionClient::new(&config);
    let cache = ResponseCache::new(Duration::minutes(config.cache_ttl_minutes));
    let gateway: Arc<dyn CompletionGateway> = Arc::new(PerplexityGateway::new(client, cache));
    info!(
        "Completion gateway initialized (model: {}, cache TTL: {}m)",
        config.completion_model, config.cache_ttl_minutes
    );

    // Build app state
    let state = AppState {
        store,
        gateway,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
