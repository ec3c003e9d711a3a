//! Axum HTTP handlers: chat, direct search, and administration.

pub mod admin;
pub mod chat;
pub mod search;

use axum::http::StatusCode;

use crate::error::RagError;

/// Map core errors to HTTP status + message.
///
/// `IndexNotReady` is service-unavailable (the caller can't fix it);
/// provider failures are bad-gateway; timeouts are gateway-timeout. A
/// normal empty retrieval never reaches here; it is not an error.
pub fn error_response(err: RagError) -> (StatusCode, String) {
    let status = match &err {
        RagError::IndexNotReady => StatusCode::SERVICE_UNAVAILABLE,
        RagError::RebuildInProgress => StatusCode::CONFLICT,
        RagError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        RagError::EmbeddingService(_) | RagError::GenerationService(_) => StatusCode::BAD_GATEWAY,
        RagError::CorruptIndex(_)
        | RagError::Corpus(_)
        | RagError::Io(_)
        | RagError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_not_ready_is_service_unavailable() {
        let (status, _) = error_response(RagError::IndexNotReady);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_rebuild_in_progress_is_conflict() {
        let (status, _) = error_response(RagError::RebuildInProgress);
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_timeout_is_gateway_timeout() {
        let (status, _) = error_response(RagError::Timeout {
            operation: "embedding",
            timeout: std::time::Duration::from_secs(1),
        });
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }
}
