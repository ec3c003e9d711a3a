use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::engine::RagEngine;
use crate::llm::{HttpEmbedder, HttpGenerator};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub engine: Arc<RagEngine>,
    pub chat_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        // One client for both providers; per-request timeouts are set by
        // the embedder/generator from config.
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let embedder = Arc::new(HttpEmbedder::new(http_client.clone(), config.llm.clone()));
        let generator = Arc::new(HttpGenerator::new(http_client, config.llm.clone()));
        let engine = Arc::new(RagEngine::new(config.clone(), embedder, generator));

        Ok(Self {
            chat_semaphore: Arc::new(tokio::sync::Semaphore::new(config.max_concurrent_chats)),
            config,
            engine,
        })
    }
}
