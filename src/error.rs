use std::time::Duration;

/// Errors produced by the retrieval core.
///
/// An empty retrieval result is *not* an error: callers that get back zero
/// chunks render a no-context answer instead. These variants cover genuine
/// failures only.
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    /// `search` was called before the index was ever built or loaded.
    #[error("vector index not ready; build or load it first")]
    IndexNotReady,

    /// The embedding provider returned an error or malformed response.
    #[error("embedding service error: {0}")]
    EmbeddingService(String),

    /// The generation provider returned an error or malformed response.
    #[error("generation service error: {0}")]
    GenerationService(String),

    /// A rebuild was rejected because another one is already running.
    #[error("index rebuild already in progress")]
    RebuildInProgress,

    /// The persisted index failed validation on load. Recover by rebuilding
    /// from the raw documents, never by partial repair.
    #[error("persisted index is corrupt: {0}")]
    CorruptIndex(String),

    /// An external call exceeded its configured deadline.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// The documentation corpus could not be loaded for a rebuild.
    #[error("corpus error: {0}")]
    Corpus(String),

    #[error("index i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RagError {
    /// Map a reqwest failure to the right variant for the given external call.
    pub fn from_reqwest(
        operation: &'static str,
        timeout: Duration,
        is_embedding: bool,
        err: reqwest::Error,
    ) -> Self {
        if err.is_timeout() {
            RagError::Timeout { operation, timeout }
        } else if is_embedding {
            RagError::EmbeddingService(err.to_string())
        } else {
            RagError::GenerationService(err.to_string())
        }
    }
}
