// crates/leadgen-api/src/routes/campaigns.rs
// ============================================================================
// Module: Campaign Routes
// Description: Create, list, read, and lifecycle-advance campaigns.
// Purpose: Cover every campaign-scoped (not phase-scoped) endpoint (spec
// §6.1).
// Dependencies: axum, leadgen_core, leadgen_orchestrator
// ============================================================================

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use leadgen_core::Campaign;
use leadgen_core::CampaignId;
use leadgen_core::Phase;
use leadgen_core::PhaseStatus;

use crate::auth;
use crate::dto::CreateCampaignRequest;
use crate::dto::DeleteResponse;
use crate::dto::ListCampaignsQuery;
use crate::dto::PhaseProgressView;
use crate::dto::ProgressResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /campaigns`.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    let context = auth::extract(&headers).map_err(ApiError::BadRequest)?;
    let campaign = state
        .orchestrator
        .create_campaign(context.caller, body.name, body.generation, body.auto_advance)?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// `GET /campaigns?filter=...`.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListCampaignsQuery>,
) -> Result<Json<Vec<Campaign>>, ApiError> {
    let context = auth::extract(&headers).map_err(ApiError::BadRequest)?;
    let campaigns = state.orchestrator.list_campaigns(context.caller, context.has_admin_role)?;
    let filtered = match query.filter.as_deref() {
        None => campaigns,
        Some(category) => campaigns.into_iter().filter(|campaign| matches_filter(campaign, category)).collect(),
    };
    Ok(Json(filtered))
}

/// Categorizes a campaign for `?filter=`; the
/// orchestrator itself has no notion of this grouping, so it is applied here
/// against the same aggregate columns `GetProgress` exposes.
fn matches_filter(campaign: &Campaign, category: &str) -> bool {
    match category {
        "completed" => campaign.completed_at.is_some(),
        "failed" => campaign.phase_status == PhaseStatus::Failed || campaign.error_message.is_some(),
        "active" => campaign.completed_at.is_none() && campaign.phase_status != PhaseStatus::Failed,
        _ => true,
    }
}

/// `GET /campaigns/{id}`.
pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<CampaignId>,
) -> Result<Json<Campaign>, ApiError> {
    let context = auth::extract(&headers).map_err(ApiError::BadRequest)?;
    let campaign = state.orchestrator.get_details(context.caller, context.has_admin_role, id)?;
    Ok(Json(campaign))
}

/// `GET /campaigns/{id}/progress`.
pub async fn progress(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<CampaignId>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let context = auth::extract(&headers).map_err(ApiError::BadRequest)?;
    let progress = state.orchestrator.get_progress(context.caller, context.has_admin_role, id)?;
    let current_phase = progress
        .phases
        .iter()
        .find(|entry| matches!(entry.status, PhaseStatus::InProgress | PhaseStatus::Paused))
        .map(|entry| entry.phase);
    Ok(Json(ProgressResponse {
        current_phase,
        overall_progress: progress.overall_progress,
        per_phase: progress
            .phases
            .into_iter()
            .map(|entry| PhaseProgressView {
                phase: entry.phase,
                status: entry.status,
            })
            .collect(),
    }))
}

/// `POST /campaigns/{id}/{action}` for `start`, `pause`, `resume`, `cancel`,
/// `delete`.
pub async fn lifecycle_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, action)): Path<(CampaignId, String)>,
) -> Result<Response, ApiError> {
    let context = auth::extract(&headers).map_err(ApiError::BadRequest)?;
    match action.as_str() {
        "start" => Ok(start_next_phase(&state, context, id)?.into_response()),
        "pause" => Ok(Json(state.orchestrator.pause(context.caller, context.has_admin_role, id)?).into_response()),
        "resume" => Ok(Json(state.orchestrator.resume(context.caller, context.has_admin_role, id)?).into_response()),
        "cancel" => Ok(Json(state.orchestrator.cancel(context.caller, context.has_admin_role, id)?).into_response()),
        "delete" => {
            state.orchestrator.bulk_delete(context.caller, context.has_admin_role, &[id])?;
            Ok(Json(DeleteResponse { id, deleted: true }).into_response())
        }
        other => Err(ApiError::BadRequest(format!("unknown campaign action {other}"))),
    }
}

/// `start` has no phase argument at the campaign level; it resolves to
/// whichever phase is next in line to run and starts that one.
fn start_next_phase(
    state: &AppState,
    context: leadgen_orchestrator::RequestContext,
    id: CampaignId,
) -> Result<Json<Campaign>, ApiError> {
    let progress = state.orchestrator.get_progress(context.caller, context.has_admin_role, id)?;
    let next = Phase::ORDER
        .into_iter()
        .find_map(|phase| {
            progress
                .phases
                .iter()
                .find(|entry| entry.phase == phase && matches!(entry.status, PhaseStatus::Ready | PhaseStatus::Configured))
                .map(|_| phase)
        })
        .ok_or_else(|| ApiError::BadRequest("no phase is ready to start".to_string()))?;
    Ok(Json(state.orchestrator.start_phase(context.caller, context.has_admin_role, id, next)?))
}
