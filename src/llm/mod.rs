//! External model providers: embedding and text generation.
//!
//! Both are opaque capabilities behind traits so the pipeline can be tested
//! with deterministic stubs. The HTTP implementations speak Ollama and
//! OpenAI-compatible APIs with a configurable per-request timeout.

pub mod embeddings;
pub mod generate;

use async_trait::async_trait;

use crate::error::RagError;
use crate::models::ChatTurn;

pub use embeddings::HttpEmbedder;
pub use generate::HttpGenerator;

/// Text -> fixed-dimension vector. Deterministic per model version.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    async fn embed_single(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        if results.is_empty() {
            return Err(RagError::EmbeddingService(
                "no embedding returned".to_string(),
            ));
        }
        Ok(results.swap_remove(0))
    }
}

/// Prompt in, completion out.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn complete(&self, messages: Vec<ChatTurn>) -> Result<String, RagError>;
}
