use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory containing the generated documentation corpus (*.md files)
    pub docs_dir: PathBuf,
    /// Where the persisted vector index lives
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Retrieval tuning parameters
    pub retrieval: RetrievalConfig,
    /// Maximum chat history turns retained per request (oldest dropped first)
    pub max_history_turns: usize,
    /// Maximum total characters of retrieved context in the prompt
    pub max_context_chars: usize,
    /// Maximum concurrent chat requests
    pub max_concurrent_chats: usize,
    /// Secret for the admin rebuild endpoint (X-Admin-Key header).
    /// When unset, the rebuild endpoint is open (local deployments only).
    pub admin_key: Option<String>,
}

/// Parameters to the retriever and re-ranker. All explicit so tests can
/// vary them per call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity for a chunk to be kept (inclusive).
    pub similarity_threshold: f32,
    /// Final number of chunks handed to context assembly (soft target).
    pub top_k: usize,
    /// Multiplier applied to top_k when querying the index, so the
    /// diversity re-ranker has candidates from more than one category.
    pub overfetch_factor: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.35,
            top_k: 5,
            overfetch_factor: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for answer generation
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub embedding_dim: usize,
    /// Per-request timeout for embedding and generation calls, in seconds
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("./docs"),
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9000".to_string(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            max_history_turns: 10,
            max_context_chars: 12_000,
            max_concurrent_chats: 3,
            admin_key: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_key: None,
            embedding_dim: 768,
            request_timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("DOCS_ASSIST_DOCS_DIR") {
            config.docs_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("DOCS_ASSIST_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("DOCS_ASSIST_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("LLM_EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.llm.embedding_dim = d;
            }
        }
        if let Ok(val) = std::env::var("LLM_REQUEST_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.llm.request_timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("SIMILARITY_THRESHOLD") {
            if let Ok(v) = val.parse() {
                config.retrieval.similarity_threshold = v;
            }
        }
        if let Ok(val) = std::env::var("TOP_K_RETRIEVAL") {
            if let Ok(v) = val.parse() {
                config.retrieval.top_k = v;
            }
        }
        if let Ok(val) = std::env::var("OVERFETCH_FACTOR") {
            if let Ok(v) = val.parse() {
                config.retrieval.overfetch_factor = v;
            }
        }
        if let Ok(val) = std::env::var("MAX_HISTORY_TURNS") {
            if let Ok(v) = val.parse() {
                config.max_history_turns = v;
            }
        }
        if let Ok(val) = std::env::var("MAX_CONTEXT_CHARS") {
            if let Ok(v) = val.parse() {
                config.max_context_chars = v;
            }
        }
        if let Ok(val) = std::env::var("DOCS_ASSIST_MAX_CONCURRENT_CHATS") {
            if let Ok(v) = val.parse() {
                config.max_concurrent_chats = v;
            }
        }
        if let Ok(key) = std::env::var("DOCS_ASSIST_ADMIN_KEY") {
            config.admin_key = Some(key);
        }

        config
    }

    /// Path of the persisted vector index snapshot.
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("index.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retrieval_params() {
        let config = Config::default();
        assert_eq!(config.retrieval.similarity_threshold, 0.35);
        assert_eq!(config.retrieval.top_k, 5);
        assert!(config.retrieval.overfetch_factor >= 2);
    }

    #[test]
    fn test_index_path_under_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/da"),
            ..Config::default()
        };
        assert_eq!(config.index_path(), PathBuf::from("/tmp/da/index.json"));
    }
}
