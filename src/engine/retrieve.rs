//! Retrieval: query expansion, embedding, overfetched vector search, and
//! threshold filtering.

use crate::config::RetrievalConfig;
use crate::error::RagError;
use crate::index::{l2_normalize, VectorIndex};
use crate::llm::Embedder;
use crate::models::RetrievalResult;
use crate::query::SynonymTable;

/// Retrieve candidate chunks for a query.
///
/// The index is queried for `top_k * overfetch_factor` candidates so the
/// diversity re-ranker has enough per-category material; callers run
/// [`super::diversify::diversify`] on the output and trim to `top_k`.
/// Results scoring below `similarity_threshold` are dropped (the threshold
/// itself is inclusive). An empty return is a normal outcome, not an error;
/// expansion or embedding failures propagate instead of degrading silently.
pub async fn retrieve(
    index: &VectorIndex,
    embedder: &dyn Embedder,
    synonyms: &SynonymTable,
    query: &str,
    params: RetrievalConfig,
) -> Result<Vec<RetrievalResult>, RagError> {
    assert!(params.top_k >= 1, "top_k must be at least 1");
    assert!(
        params.overfetch_factor >= 1,
        "overfetch_factor must be at least 1"
    );

    // One snapshot for the whole request: search results and chunk metadata
    // always come from the same build even if a rebuild lands mid-flight.
    let snapshot = index.snapshot()?;

    let expanded = synonyms.expand(query);
    tracing::debug!("Expanded query: {expanded:?}");

    let mut query_vector = embedder.embed_single(&expanded).await?;
    l2_normalize(&mut query_vector);

    let fetch_k = params.top_k * params.overfetch_factor;
    let hits = snapshot.search(&query_vector, fetch_k, None);

    let results: Vec<RetrievalResult> = hits
        .into_iter()
        .filter(|(_, score)| *score >= params.similarity_threshold)
        .filter_map(|(id, score)| {
            snapshot.chunk(id).map(|chunk| RetrievalResult {
                chunk: chunk.clone(),
                relevance_score: score,
            })
        })
        .collect();

    tracing::debug!(
        "Retrieved {} chunks above threshold {}",
        results.len(),
        params.similarity_threshold
    );
    Ok(results)
}
