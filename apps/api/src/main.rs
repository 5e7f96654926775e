mod bilingual;
mod config;
mod db;
mod document;
mod editor;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;
mod timeline;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::bilingual::{LlmTranslator, Translator};
use crate::config::Config;
use crate::db::create_pool;
use crate::editor::SessionRegistry;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryStore, PgResumeStore, ResumeStore};
use crate::timeline::SystemClock;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Vitae API v{}", env!("CARGO_PKG_VERSION"));

    // Persistence collaborator: PostgreSQL when configured, process memory otherwise
    let store: Arc<dyn ResumeStore> = match &config.database_url {
        Some(url) => Arc::new(PgResumeStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL is not set; documents are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    // Translation collaborator
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.translation_model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());
    let translator: Arc<dyn Translator> = Arc::new(LlmTranslator::new(llm));

    let settings = config.editor_settings();
    info!(
        "Editor settings: autosave every {}s, {} undo levels",
        settings.autosave_interval.as_secs(),
        settings.history_max_depth
    );

    let registry = Arc::new(SessionRegistry::new(
        store,
        translator,
        Arc::new(SystemClock),
        settings,
    ));

    // Build app state
    let state = AppState {
        registry: registry.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the editor's deployment host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush every open session before exiting
    info!("Shutting down, saving open sessions");
    registry.close_all().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
