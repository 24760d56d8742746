// crates/leadgen-api/src/routes/phases.rs
// ============================================================================
// Module: Phase Routes
// Description: Configure, start, rerun, and retry individual phases.
// Purpose: Cover the phase-scoped endpoints under `/campaigns/{id}/phases`
//.
// Dependencies: axum, leadgen_core
// ============================================================================

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use leadgen_core::Campaign;
use leadgen_core::CampaignId;
use leadgen_core::Phase;
use leadgen_core::PhaseParams;

use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;

fn parse_phase(label: &str) -> Result<Phase, ApiError> {
    Phase::from_label(label).ok_or_else(|| ApiError::BadRequest(format!("unknown phase {label}")))
}

/// `POST /campaigns/{id}/phases/{phase}/configure`.
pub async fn configure(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, phase)): Path<(CampaignId, String)>,
    Json(params): Json<PhaseParams>,
) -> Result<Json<Campaign>, ApiError> {
    let context = auth::extract(&headers).map_err(ApiError::BadRequest)?;
    let expected = parse_phase(&phase)?;
    if params.phase() != expected {
        return Err(ApiError::BadRequest(format!(
            "body describes the {} phase but the path names {}",
            params.phase().label(),
            expected.label()
        )));
    }
    let campaign = state.orchestrator.configure_phase(context.caller, context.has_admin_role, id, params)?;
    Ok(Json(campaign))
}

/// `POST /campaigns/{id}/phases/{phase}/{action}` for `start`, `rerun`,
/// `retry`.
pub async fn action(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, phase, action)): Path<(CampaignId, String, String)>,
) -> Result<Json<Campaign>, ApiError> {
    let context = auth::extract(&headers).map_err(ApiError::BadRequest)?;
    let phase = parse_phase(&phase)?;
    let campaign = match action.as_str() {
        "start" => state.orchestrator.start_phase(context.caller, context.has_admin_role, id, phase)?,
        "rerun" => state.orchestrator.rerun_phase(context.caller, context.has_admin_role, id, phase)?,
        "retry" => state.orchestrator.retry_phase(context.caller, context.has_admin_role, id, phase)?,
        other => return Err(ApiError::BadRequest(format!("unknown phase action {other}"))),
    };
    Ok(Json(campaign))
}
