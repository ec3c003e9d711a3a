use serde::{Deserialize, Serialize};

/// Source-file category, assigned deterministically from the original file
/// extension at corpus load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Backend,
    Frontend,
    Other,
}

impl Category {
    /// Fixed priority order used by the diversity re-ranker.
    pub const PRIORITY: [Category; 3] = [Category::Backend, Category::Frontend, Category::Other];

    /// Map an original source extension (e.g. ".php") to its category.
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "php" | "xml" | "yaml" | "yml" | "twig" => Category::Backend,
            "vue" | "js" | "ts" | "tsx" | "jsx" | "json" => Category::Frontend,
            _ => Category::Other,
        }
    }
}

/// An immutable unit of retrievable text.
///
/// `id` is the chunk's position in the index build and the only join key
/// between the vectors and the chunk metadata; it is stable for the lifetime
/// of one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: usize,
    pub text: String,
    /// Originating document path, relative to the docs root.
    pub source_path: String,
    /// Display name reconstructed from the generated filename
    /// (e.g. "Subscription_php.md" -> "Subscription.php").
    pub file_name: String,
    pub category: Category,
    /// Position of this chunk within its source document.
    pub chunk_index: usize,
}

/// A chunk plus its cosine similarity to the query (unit vectors, so the
/// score is bounded and monotonic with angular distance).
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub chunk: Chunk,
    pub relevance_score: f32,
}

/// A single chat turn (user or assistant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Attribution record for one chunk that made it into the prompt.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub file: String,
    pub path: String,
    pub category: Category,
    pub relevance_score: f32,
}

/// Chat request
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,
}

/// Chat response
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub sources: Vec<SourceRef>,
    pub metadata: ChatMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMetadata {
    pub retrieved_chunks: usize,
    pub used_context: bool,
    pub is_casual: bool,
    pub processing_time_ms: u64,
}

/// Direct search request (no generation step).
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

/// One direct-search result: a trimmed text preview plus attribution fields.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultItem {
    pub text: String,
    pub file: String,
    pub path: String,
    pub category: Category,
    pub relevance_score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResultItem>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_to_snake_case() {
        let json = serde_json::to_value(Category::Backend).unwrap();
        assert_eq!(json, "backend");
    }

    #[test]
    fn test_category_round_trips() {
        let json = serde_json::to_string(&Category::Frontend).unwrap();
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Category::Frontend);
    }

    #[test]
    fn test_category_from_extension() {
        assert_eq!(Category::from_extension(".php"), Category::Backend);
        assert_eq!(Category::from_extension("twig"), Category::Backend);
        assert_eq!(Category::from_extension(".vue"), Category::Frontend);
        assert_eq!(Category::from_extension(".ts"), Category::Frontend);
        assert_eq!(Category::from_extension(".md"), Category::Other);
        assert_eq!(Category::from_extension(".unknown"), Category::Other);
    }

    #[test]
    fn test_chat_request_defaults_empty_history() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert!(req.chat_history.is_empty());
    }

    #[test]
    fn test_search_request_default_top_k() {
        let req: SearchRequest = serde_json::from_str(r#"{"query": "auth"}"#).unwrap();
        assert_eq!(req.top_k, 5);
    }
}
