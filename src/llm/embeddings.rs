//! Batch embedding generation via Ollama or OpenAI-compatible APIs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::RagError;
use crate::llm::Embedder;

/// Maximum characters to send per text to the embedding API. Dense markdown
/// tokenizes at roughly 2-3 chars per token; 3 000 chars stays safely under
/// the common 8 192-token embedding context.
const MAX_EMBED_CHARS: usize = 3_000;

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char
/// boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

pub struct HttpEmbedder {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpEmbedder {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    /// Reject provider responses whose dimensionality disagrees with the
    /// configured one; a mixed-dimension index would produce garbage scores.
    fn check_dims(&self, embeddings: &[Vec<f32>]) -> Result<(), RagError> {
        for e in embeddings {
            if e.len() != self.config.embedding_dim {
                return Err(RagError::EmbeddingService(format!(
                    "provider returned {}-dim vector, expected {}",
                    e.len(),
                    self.config.embedding_dim
                )));
            }
        }
        Ok(())
    }

    async fn embed_ollama(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let url = format!("{}/api/embed", self.config.base_url);
        let batch_size = 32;
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(batch_size) {
            let req = OllamaEmbedRequest {
                model: self.config.embedding_model.clone(),
                input: batch.to_vec(),
                truncate: true,
            };

            let resp = self
                .client
                .post(&url)
                .timeout(self.timeout())
                .json(&req)
                .send()
                .await
                .map_err(|e| RagError::from_reqwest("embedding", self.timeout(), true, e))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(RagError::EmbeddingService(format!(
                    "Ollama embed API returned {status}: {body}"
                )));
            }

            let body: OllamaEmbedResponse = resp
                .json()
                .await
                .map_err(|e| RagError::EmbeddingService(format!("unparseable response: {e}")))?;

            all_embeddings.extend(body.embeddings);
        }

        Ok(all_embeddings)
    }

    async fn embed_openai(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let url = format!("{}/v1/embeddings", self.config.base_url);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let batch_size = 64;
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(batch_size) {
            let req = OpenAiEmbedRequest {
                model: self.config.embedding_model.clone(),
                input: batch.to_vec(),
            };

            let resp = self
                .client
                .post(&url)
                .timeout(self.timeout())
                .header("Authorization", format!("Bearer {api_key}"))
                .json(&req)
                .send()
                .await
                .map_err(|e| RagError::from_reqwest("embedding", self.timeout(), true, e))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(RagError::EmbeddingService(format!(
                    "OpenAI embed API returned {status}: {body}"
                )));
            }

            let body: OpenAiEmbedResponse = resp
                .json()
                .await
                .map_err(|e| RagError::EmbeddingService(format!("unparseable response: {e}")))?;

            all_embeddings.extend(body.data.into_iter().map(|d| d.embedding));
        }

        Ok(all_embeddings)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_for_embedding(t).to_string())
            .collect();

        let embeddings = match self.config.provider.as_str() {
            "ollama" => self.embed_ollama(&truncated).await?,
            "openai" => self.embed_openai(&truncated).await?,
            other => {
                return Err(RagError::EmbeddingService(format!(
                    "unknown LLM provider: {other}"
                )))
            }
        };

        if embeddings.len() != texts.len() {
            return Err(RagError::EmbeddingService(format!(
                "provider returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }
        self.check_dims(&embeddings)?;
        Ok(embeddings)
    }
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    /// Ask Ollama to silently truncate over-length inputs instead of
    /// returning a 400.
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_for_embedding("hello"), "hello");
    }

    #[test]
    fn test_truncate_long_text() {
        let long = "a".repeat(10_000);
        assert_eq!(truncate_for_embedding(&long).len(), MAX_EMBED_CHARS);
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        // Multibyte chars straddling the limit must not be split
        let s = "é".repeat(2_000);
        let t = truncate_for_embedding(&s);
        assert!(t.len() <= MAX_EMBED_CHARS);
        assert!(s.is_char_boundary(t.len()));
    }
}
