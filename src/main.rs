use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use docs_assist::api;
use docs_assist::config::Config;
use docs_assist::error::RagError;
use docs_assist::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Docs directory: {}", config.docs_dir.display());
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);

    let state = AppState::new(config.clone())?;

    // Load the persisted index, or build it from the corpus on first run.
    // A corrupt file is recovered by a full rebuild.
    match state.engine.load_index() {
        Ok(true) => {
            tracing::info!("Loaded index with {} chunks", state.engine.chunk_count());
        }
        Ok(false) => {
            tracing::info!("No persisted index found, building from corpus...");
            state.engine.rebuild_index().await?;
        }
        Err(RagError::CorruptIndex(reason)) => {
            tracing::warn!("Persisted index is corrupt ({reason}), rebuilding...");
            state.engine.rebuild_index().await?;
        }
        Err(e) => return Err(e.into()),
    }

    let app = Router::new()
        .route("/api/chat", post(api::chat::chat))
        .route("/api/search", post(api::search::search))
        .route("/api/rebuild-index", post(api::admin::rebuild_index))
        .route("/api/health", get(api::admin::health))
        .route("/api/stats", get(api::admin::stats))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
