//! Non-streaming answer generation via Ollama or OpenAI-compatible chat
//! APIs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::RagError;
use crate::llm::Generator;
use crate::models::ChatTurn;

pub struct HttpGenerator {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpGenerator {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    async fn complete_ollama(&self, messages: Vec<ChatTurn>) -> Result<String, RagError> {
        let url = format!("{}/api/chat", self.config.base_url);

        let req = OllamaChatRequest {
            model: self.config.chat_model.clone(),
            messages,
            stream: false,
        };

        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout())
            .json(&req)
            .send()
            .await
            .map_err(|e| RagError::from_reqwest("generation", self.timeout(), false, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RagError::GenerationService(format!(
                "Ollama chat API returned {status}: {body}"
            )));
        }

        let body: OllamaChatResponse = resp
            .json()
            .await
            .map_err(|e| RagError::GenerationService(format!("unparseable response: {e}")))?;
        Ok(body.message.content)
    }

    async fn complete_openai(&self, messages: Vec<ChatTurn>) -> Result<String, RagError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let req = OpenAiChatRequest {
            model: self.config.chat_model.clone(),
            messages,
            temperature: 0.3,
        };

        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout())
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&req)
            .send()
            .await
            .map_err(|e| RagError::from_reqwest("generation", self.timeout(), false, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RagError::GenerationService(format!(
                "OpenAI chat API returned {status}: {body}"
            )));
        }

        let body: OpenAiChatResponse = resp
            .json()
            .await
            .map_err(|e| RagError::GenerationService(format!("unparseable response: {e}")))?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| RagError::GenerationService("empty choices in response".to_string()))
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn complete(&self, messages: Vec<ChatTurn>) -> Result<String, RagError> {
        match self.config.provider.as_str() {
            "ollama" => self.complete_ollama(messages).await,
            "openai" => self.complete_openai(messages).await,
            other => Err(RagError::GenerationService(format!(
                "unknown LLM provider: {other}"
            ))),
        }
    }
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatTurn>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<ChatTurn>,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}
