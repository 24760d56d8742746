// crates/leadgen-api/tests/lifecycle.rs
// ============================================================================
// Test: Campaign Lifecycle Over HTTP Handlers
// Description: Exercises create/list/get/start/progress/results against real
// in-memory store and event collaborators, calling the route functions
// directly (no HTTP transport needed to verify handler behavior).
// ============================================================================

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use leadgen_api::AppState;
use leadgen_api::dto::CreateCampaignRequest;
use leadgen_api::dto::ListCampaignsQuery;
use leadgen_api::dto::ResultsQuery;
use leadgen_api::routes::campaigns;
use leadgen_api::routes::results;
use leadgen_core::DomainPattern;
use leadgen_core::Phase;
use leadgen_core::PatternType;
use leadgen_core::PhaseParams;
use leadgen_core::PhaseStatus;
use leadgen_core::interfaces::NoopAuditSink;
use leadgen_core::interfaces::NoopMetrics;
use leadgen_events::LiveEventBroadcaster;
use leadgen_events::SqliteEventStore;
use leadgen_orchestrator::CampaignOrchestrator;
use leadgen_orchestrator::CampaignOrchestratorConfig;
use leadgen_store::SqliteCampaignStore;
use std::sync::Arc;
use uuid::Uuid;

fn state() -> AppState {
    let store = Arc::new(SqliteCampaignStore::open_in_memory().expect("store"));
    let events = Arc::new(LiveEventBroadcaster::new(SqliteEventStore::open_in_memory().expect("events")));
    let orchestrator = CampaignOrchestrator::new(CampaignOrchestratorConfig {
        store: store.clone(),
        events: events.clone(),
        metrics: Arc::new(NoopMetrics),
        audit: Arc::new(NoopAuditSink),
    });
    AppState::new(orchestrator, store, events.clone(), events)
}

fn owner_headers(owner: Uuid) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-owner-id", HeaderValue::from_str(&owner.to_string()).expect("header"));
    headers
}

fn generation_params() -> PhaseParams {
    PhaseParams::Generation {
        pattern: DomainPattern {
            pattern_type: PatternType::Suffix,
            variable_length: 3,
            character_set: "abc".chars().collect(),
            constant_string: "shop".to_string(),
            tld: "com".to_string(),
        },
        target_count: 10,
    }
}

#[tokio::test]
async fn create_list_get_start_progress_round_trip() {
    let state = state();
    let owner = Uuid::from_u128(7);
    let headers = owner_headers(owner);

    let (status, Json(created)) = campaigns::create(
        State(state.clone()),
        headers.clone(),
        Json(CreateCampaignRequest {
            name: "q3-leads".to_string(),
            generation: generation_params(),
            auto_advance: false,
        }),
    )
    .await
    .expect("create");
    assert_eq!(status, axum::http::StatusCode::CREATED);
    assert_eq!(created.current_phase, Some(Phase::Generation));
    assert_eq!(created.phase_status, PhaseStatus::Configured);

    let Json(listed) = campaigns::list(State(state.clone()), headers.clone(), Query(ListCampaignsQuery { filter: None }))
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);

    let Json(fetched) = campaigns::get(State(state.clone()), headers.clone(), Path(created.id)).await.expect("get");
    assert_eq!(fetched.name, "q3-leads");

    let response = campaigns::lifecycle_action(State(state.clone()), headers.clone(), Path((created.id, "start".to_string())))
        .await
        .expect("start");
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let Json(progress) = campaigns::progress(State(state.clone()), headers.clone(), Path(created.id)).await.expect("progress");
    assert_eq!(progress.current_phase, Some(Phase::Generation));

    let Json(page) =
        results::generated(State(state.clone()), headers.clone(), Path(created.id), Query(ResultsQuery::default()))
            .await
            .expect("results");
    assert!(page.items.is_empty());
    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn missing_owner_header_is_rejected() {
    let state = state();
    let error = campaigns::list(State(state), HeaderMap::new(), Query(ListCampaignsQuery::default())).await.unwrap_err();
    let response = axum::response::IntoResponse::into_response(error);
    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_lifecycle_action_is_rejected() {
    let state = state();
    let owner = Uuid::from_u128(11);
    let headers = owner_headers(owner);
    let (_, Json(created)) = campaigns::create(
        State(state.clone()),
        headers.clone(),
        Json(CreateCampaignRequest {
            name: "q4-leads".to_string(),
            generation: generation_params(),
            auto_advance: false,
        }),
    )
    .await
    .expect("create");

    let error = campaigns::lifecycle_action(State(state), headers, Path((created.id, "teleport".to_string()))).await.unwrap_err();
    let response = axum::response::IntoResponse::into_response(error);
    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
}
