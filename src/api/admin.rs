use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::state::AppState;

/// POST /api/rebuild-index: trigger a full index rebuild in the
/// background.
///
/// Guarded by the `X-Admin-Key` header, a capability distinct from normal
/// request auth. Returns 202 immediately; progress is visible through
/// /api/health. 409 when a rebuild is already running.
pub async fn rebuild_index(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, String)> {
    if let Some(expected) = &state.config.admin_key {
        let provided = headers
            .get("x-admin-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if provided != expected {
            return Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()));
        }
    }

    if state.engine.rebuild_in_progress() {
        return Err((
            StatusCode::CONFLICT,
            "A rebuild is already in progress".to_string(),
        ));
    }

    let engine = state.engine.clone();
    tokio::spawn(async move {
        match engine.rebuild_index().await {
            Ok(count) => tracing::info!("Background rebuild finished: {count} chunks"),
            Err(e) => tracing::error!("Background rebuild failed: {e}"),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "accepted" })),
    ))
}

/// GET /api/health: index readiness and chunk count, consumed by the UI's
/// connectivity indicator.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "components": {
            "vector_store": state.engine.is_ready(),
            "documents_indexed": state.engine.chunk_count(),
            "rebuild_in_progress": state.engine.rebuild_in_progress(),
        },
    }))
}

/// GET /api/stats: index and configuration statistics.
pub async fn stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.engine.stats())
}
