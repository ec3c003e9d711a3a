use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error_response;
use crate::models::{ChatRequest, ChatResponse};
use crate::state::AppState;

/// Reject absurdly long messages before they cost an embedding call.
const MAX_CHAT_MESSAGE_LEN: usize = 2_000;

/// POST /api/chat. Full RAG pipeline: casual short-circuit or
/// retrieve → diversify → assemble → generate, with source attribution.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message is required".to_string()));
    }
    if message.len() > MAX_CHAT_MESSAGE_LEN {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Message exceeds {MAX_CHAT_MESSAGE_LEN} characters"),
        ));
    }

    let _permit = state
        .chat_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Chat service at capacity".to_string(),
            )
        })?;

    let result = state
        .engine
        .answer(message, &req.chat_history)
        .await
        .map_err(error_response)?;

    tracing::info!(
        "Chat answered | sources: {} | used_context: {} | casual: {} | {}ms",
        result.sources.len(),
        result.metadata.used_context,
        result.metadata.is_casual,
        result.metadata.processing_time_ms
    );

    Ok(Json(result))
}
