//! The RAG engine: orchestrates query preprocessing, retrieval, diversity
//! re-ranking, context assembly, and generation.

pub mod context;
pub mod diversify;
pub mod retrieve;

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::corpus;
use crate::error::RagError;
use crate::index::{l2_normalize, VectorIndex};
use crate::llm::{Embedder, Generator};
use crate::models::{
    ChatMetadata, ChatResponse, ChatTurn, SearchResultItem, SourceRef,
};
use crate::query::{CasualResponder, SynonymTable};

/// Maximum characters of chunk text returned per direct-search result.
const SEARCH_PREVIEW_CHARS: usize = 500;

/// What a query resolves to before generation.
///
/// Casual short-circuits retrieval and generation entirely; Answer carries
/// the assembled prompt and attribution for the generation step.
pub enum QueryOutcome {
    Casual(String),
    Answer {
        messages: Vec<ChatTurn>,
        sources: Vec<SourceRef>,
        retrieved_chunks: usize,
        used_context: bool,
    },
}

pub struct RagEngine {
    config: Config,
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    synonyms: SynonymTable,
    casual: CasualResponder,
    /// Serializes rebuilds: at most one in flight, contenders fail fast.
    rebuild_gate: tokio::sync::Semaphore,
}

impl RagEngine {
    pub fn new(
        config: Config,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self::with_rules(
            config,
            embedder,
            generator,
            SynonymTable::default_table(),
            CasualResponder::default_rules(),
        )
    }

    /// Constructor taking explicit rule tables, for tests with fixtures.
    pub fn with_rules(
        config: Config,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        synonyms: SynonymTable,
        casual: CasualResponder,
    ) -> Self {
        let index = VectorIndex::new(config.index_path());
        Self {
            config,
            index,
            embedder,
            generator,
            synonyms,
            casual,
            rebuild_gate: tokio::sync::Semaphore::new(1),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.index.is_ready()
    }

    pub fn chunk_count(&self) -> usize {
        self.index.chunk_count()
    }

    /// Whether a rebuild currently holds the gate.
    pub fn rebuild_in_progress(&self) -> bool {
        self.rebuild_gate.available_permits() == 0
    }

    /// Load the persisted index. Ok(false) means nothing persisted yet;
    /// `CorruptIndex` means the caller must trigger a rebuild.
    pub fn load_index(&self) -> Result<bool, RagError> {
        self.index.load()
    }

    /// Rebuild the index from the documentation corpus: load chunks, embed
    /// them in batches, and atomically swap in the new snapshot.
    ///
    /// All-or-nothing: any failure leaves the previously active snapshot in
    /// place. Concurrent calls are rejected with `RebuildInProgress`.
    pub async fn rebuild_index(&self) -> Result<usize, RagError> {
        let _permit = self
            .rebuild_gate
            .try_acquire()
            .map_err(|_| RagError::RebuildInProgress)?;

        let chunks = corpus::load_corpus(&self.config.docs_dir)
            .map_err(|e| RagError::Corpus(e.to_string()))?;
        tracing::info!("Rebuilding index from {} chunks", chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let mut vectors = self.embedder.embed_batch(&texts).await?;
        for v in &mut vectors {
            l2_normalize(v);
        }

        let count = chunks.len();
        self.index.install(chunks, vectors)?;
        tracing::info!("Index rebuilt with {count} chunks");
        Ok(count)
    }

    /// Resolve a query to either a canned casual response or an assembled
    /// prompt plus sources, without calling the generator.
    pub async fn plan(&self, query: &str, history: &[ChatTurn]) -> Result<QueryOutcome, RagError> {
        if let Some(canned) = self.casual.respond(query) {
            return Ok(QueryOutcome::Casual(canned.to_string()));
        }

        let candidates = retrieve::retrieve(
            &self.index,
            self.embedder.as_ref(),
            &self.synonyms,
            query,
            self.config.retrieval,
        )
        .await?;
        let ranked = diversify::diversify(candidates, self.config.retrieval.top_k);
        let retrieved_chunks = ranked.len();

        let assembled = context::assemble(
            &ranked,
            history,
            query,
            self.config.max_context_chars,
            self.config.max_history_turns,
        );

        Ok(QueryOutcome::Answer {
            messages: assembled.messages,
            sources: assembled.sources,
            retrieved_chunks,
            used_context: assembled.used_context,
        })
    }

    /// Full pipeline: plan, then generate.
    ///
    /// If generation fails after retrieval succeeded, the retrieved sources
    /// are still returned with an explanatory response instead of
    /// discarding the retrieval work.
    pub async fn answer(&self, query: &str, history: &[ChatTurn]) -> Result<ChatResponse, RagError> {
        let start = Instant::now();

        match self.plan(query, history).await? {
            QueryOutcome::Casual(response) => Ok(ChatResponse {
                response,
                sources: Vec::new(),
                metadata: ChatMetadata {
                    retrieved_chunks: 0,
                    used_context: false,
                    is_casual: true,
                    processing_time_ms: start.elapsed().as_millis() as u64,
                },
            }),
            QueryOutcome::Answer {
                messages,
                sources,
                retrieved_chunks,
                used_context,
            } => {
                let response = match self.generator.complete(messages).await {
                    Ok(text) => text,
                    Err(e @ (RagError::GenerationService(_) | RagError::Timeout { .. })) => {
                        tracing::warn!("Generation failed after retrieval: {e}");
                        "I found relevant documentation but couldn't generate an answer \
                         right now. The sources below may still help; please try again."
                            .to_string()
                    }
                    Err(e) => return Err(e),
                };

                Ok(ChatResponse {
                    response,
                    sources,
                    metadata: ChatMetadata {
                        retrieved_chunks,
                        used_context,
                        is_casual: false,
                        processing_time_ms: start.elapsed().as_millis() as u64,
                    },
                })
            }
        }
    }

    /// Direct search: retrieval and re-ranking only, no generation.
    ///
    /// `top_k` is a soft target: the result may be shorter when fewer
    /// chunks clear the similarity threshold.
    pub async fn search_documents(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResultItem>, RagError> {
        let params = crate::config::RetrievalConfig {
            top_k,
            ..self.config.retrieval
        };
        let candidates = retrieve::retrieve(
            &self.index,
            self.embedder.as_ref(),
            &self.synonyms,
            query,
            params,
        )
        .await?;
        let ranked = diversify::diversify(candidates, top_k);

        Ok(ranked
            .into_iter()
            .map(|r| SearchResultItem {
                text: preview(&r.chunk.text),
                file: r.chunk.file_name,
                path: r.chunk.source_path,
                category: r.chunk.category,
                relevance_score: (r.relevance_score * 1000.0).round() / 1000.0,
            })
            .collect())
    }

    pub fn stats(&self) -> serde_json::Value {
        serde_json::json!({
            "vector_store": {
                "ready": self.index.is_ready(),
                "indexed_chunks": self.index.chunk_count(),
                "embedding_model": self.config.llm.embedding_model,
                "embedding_dim": self.config.llm.embedding_dim,
            },
            "configuration": {
                "similarity_threshold": self.config.retrieval.similarity_threshold,
                "top_k": self.config.retrieval.top_k,
                "overfetch_factor": self.config.retrieval.overfetch_factor,
                "max_history_turns": self.config.max_history_turns,
                "max_context_chars": self.config.max_context_chars,
                "chat_model": self.config.llm.chat_model,
                "docs_dir": self.config.docs_dir.display().to_string(),
            },
        })
    }
}

fn preview(text: &str) -> String {
    if text.len() <= SEARCH_PREVIEW_CHARS {
        return text.to_string();
    }
    let mut end = SEARCH_PREVIEW_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
