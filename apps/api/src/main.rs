mod config;
mod cv;
mod db;
mod errors;
mod improve;
mod layout;
mod llm_client;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::improve::{DisabledImprover, LlmTextImprover, TextImprover};
use crate::layout::LayoutScheduler;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

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

    info!("Starting cvforge API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize text improver (LLM when an API key is configured)
    let improver: Arc<dyn TextImprover> = match &config.anthropic_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone(), config.llm_model.clone())
                .context("Failed to build LLM HTTP client")?;
            info!("LLM client initialized (model: {})", llm.model());
            Arc::new(LlmTextImprover(llm))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; text improvement is disabled");
            Arc::new(DisabledImprover)
        }
    };

    // Initialize layout scheduler
    let scheduler = LayoutScheduler::new(config.layout_debounce, config.layout);
    info!(
        "Layout: page {}px, debounce {}ms",
        config.layout.page_height_px,
        config.layout_debounce.as_millis()
    );

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        improver,
        scheduler,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the editor's deployed host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
