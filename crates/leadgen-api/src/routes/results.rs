// crates/leadgen-api/src/routes/results.rs
// ============================================================================
// Module: Result Listing Routes
// Description: Cursor-paginated reads over each phase's persisted output.
// Purpose: Cover `/campaigns/{id}/results/{generated|dns|http|analysis}`
//.
// Dependencies: axum, leadgen_core
// ============================================================================

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use leadgen_core::CampaignAction;
use leadgen_core::CampaignId;
use leadgen_core::OrchestratorError;
use leadgen_core::interfaces::CampaignStore;
use leadgen_core::interfaces::DnsResult;
use leadgen_core::interfaces::GeneratedDomain;
use leadgen_core::interfaces::HttpResult;

use crate::auth;
use crate::cursor;
use crate::dto::Page;
use crate::dto::ResultsQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /campaigns/{id}/results/generated?cursor=...&limit=...`.
pub async fn generated(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<CampaignId>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<Page<GeneratedDomain>>, ApiError> {
    let context = auth::extract(&headers).map_err(ApiError::BadRequest)?;
    state.orchestrator.load_authorized(context.caller, context.has_admin_role, id, CampaignAction::Read)?;
    let after = decode_offset(query.cursor.as_deref())?;
    let limit = state.page_size(query.limit);
    let items = state
        .store
        .list_generated_domains(id, after, limit)
        .map_err(OrchestratorError::from)?;
    let next_cursor = next_cursor(&items, limit, |item| item.offset_index.to_string());
    Ok(Json(Page { items, next_cursor }))
}

/// `GET /campaigns/{id}/results/dns?cursor=...&limit=...`.
pub async fn dns(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<CampaignId>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<Page<DnsResult>>, ApiError> {
    let context = auth::extract(&headers).map_err(ApiError::BadRequest)?;
    state.orchestrator.load_authorized(context.caller, context.has_admin_role, id, CampaignAction::Read)?;
    let after = query.cursor.as_deref().map(cursor::decode).transpose().map_err(ApiError::BadRequest)?;
    let limit = state.page_size(query.limit);
    let items = state.store.list_dns_results(id, after, limit).map_err(OrchestratorError::from)?;
    let next_cursor = next_cursor(&items, limit, |item| item.domain_name.clone());
    Ok(Json(Page { items, next_cursor }))
}

/// `GET /campaigns/{id}/results/http?cursor=...&limit=...`.
pub async fn http(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<CampaignId>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<Page<HttpResult>>, ApiError> {
    let context = auth::extract(&headers).map_err(ApiError::BadRequest)?;
    state.orchestrator.load_authorized(context.caller, context.has_admin_role, id, CampaignAction::Read)?;
    let after = query.cursor.as_deref().map(cursor::decode).transpose().map_err(ApiError::BadRequest)?;
    let limit = state.page_size(query.limit);
    let items = state.store.list_http_results_page(id, after, limit).map_err(OrchestratorError::from)?;
    let next_cursor = next_cursor(&items, limit, |item| item.domain_name.clone());
    Ok(Json(Page { items, next_cursor }))
}

/// `GET /campaigns/{id}/results/analysis`. The analysis phase produces one
/// summary document rather than a row stream, so there is no cursor here.
pub async fn analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<CampaignId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let context = auth::extract(&headers).map_err(ApiError::BadRequest)?;
    state.orchestrator.load_authorized(context.caller, context.has_admin_role, id, CampaignAction::Read)?;
    let results = state.store.get_analysis_results(id).map_err(OrchestratorError::from)?;
    Ok(Json(results.unwrap_or(serde_json::Value::Null)))
}

fn decode_offset(cursor: Option<&str>) -> Result<Option<u128>, ApiError> {
    let Some(cursor) = cursor else {
        return Ok(None);
    };
    let raw = cursor::decode(cursor).map_err(ApiError::BadRequest)?;
    raw.parse::<u128>().map(Some).map_err(|_| ApiError::BadRequest("cursor does not encode an offset".to_string()))
}

/// Builds the next page's cursor: present only when this page was full,
/// since a short page means the listing is exhausted.
fn next_cursor<T>(items: &[T], limit: usize, key: impl Fn(&T) -> String) -> Option<String> {
    if items.len() < limit {
        return None;
    }
    items.last().map(|item| cursor::encode(&key(item)))
}
