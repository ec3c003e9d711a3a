use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error_response;
use crate::models::{SearchRequest, SearchResponse};
use crate::state::AppState;

/// Cap on requested result count for direct search.
const MAX_SEARCH_RESULTS: usize = 20;

/// POST /api/search: retrieval and diversity re-ranking only, no
/// generation step. `top_k` is a soft target: fewer results come back when
/// fewer chunks clear the similarity threshold.
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query is required".to_string()));
    }
    let top_k = req.top_k.clamp(1, MAX_SEARCH_RESULTS);

    let results = state
        .engine
        .search_documents(&query, top_k)
        .await
        .map_err(error_response)?;

    let count = results.len();
    Ok(Json(SearchResponse {
        query,
        results,
        count,
    }))
}
