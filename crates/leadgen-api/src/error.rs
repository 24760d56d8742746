// crates/leadgen-api/src/error.rs
// ============================================================================
// Module: Error Envelope
// Description: Maps `OrchestratorError` and request-parsing failures onto
// the two documented JSON error shapes.
// Purpose: Give every handler one `?`-friendly error type with a single
// `IntoResponse` impl.
// Dependencies: axum, leadgen_core, serde_json
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use leadgen_core::OrchestratorError;
use leadgen_core::Phase;

/// Errors surfaced to HTTP callers.
#[derive(Debug)]
pub enum ApiError {
    /// The orchestrator rejected the request.
    Orchestrator(OrchestratorError),
    /// The request itself was malformed (bad query param, bad cursor, ...).
    BadRequest(String),
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        Self::Orchestrator(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Orchestrator(OrchestratorError::InvalidTransition(err)) => {
                state_conflict(err.code, &err.current_state, &err.attempted_action, &err.message, None, None)
            }
            Self::Orchestrator(OrchestratorError::RerunPrecondition(err)) => state_conflict(
                err.code,
                "active",
                "rerun",
                "another phase is active",
                Some(err.reason),
                Some(err.blocking_phase),
            ),
            Self::Orchestrator(OrchestratorError::NoControlPhase(err)) => {
                state_conflict(err.code, "none", "pause_or_resume", &err.message, None, None)
            }
            Self::Orchestrator(err) => generic(err.code().http_status(), err.code().label(), &err.to_string(), None),
            Self::BadRequest(message) => generic(400, "BAD_REQUEST", &message, None),
        }
    }
}

fn generic(status: u16, code: &str, message: &str, details: Option<serde_json::Value>) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = serde_json::json!({
        "error": {
            "code": code,
            "message": message,
            "details": details,
        }
    });
    (status, Json(body)).into_response()
}

#[allow(clippy::too_many_arguments)]
fn state_conflict(
    code: &str,
    current_state: &str,
    attempted_action: &str,
    message: &str,
    reason: Option<&str>,
    blocking_phase: Option<Phase>,
) -> Response {
    let body = serde_json::json!({
        "error": {
            "code": code,
            "current_state": current_state,
            "attempted_action": attempted_action,
            "message": message,
            "reason": reason,
            "blocking_phase": blocking_phase.map(Phase::label),
        }
    });
    (StatusCode::CONFLICT, Json(body)).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[tokio::test]
    async fn bad_request_maps_to_400() {
        let response = ApiError::BadRequest("bad cursor".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let response = ApiError::from(OrchestratorError::NotFound("campaign x not found".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
