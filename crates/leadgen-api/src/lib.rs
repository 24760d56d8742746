// crates/leadgen-api/src/lib.rs
// ============================================================================
// Module: Lead Generation HTTP API
// Description: The `/api/v2` REST surface over a `CampaignOrchestrator`.
// Purpose: Translate HTTP requests into orchestrator calls and orchestrator
// results into the documented JSON response/error shapes.
// Dependencies: axum, leadgen_core, leadgen_orchestrator, tokio, tokio-stream
// ============================================================================

//! ## Overview
//! This crate has no business logic of its own: every handler extracts a
//! caller identity from request headers (see [`auth`]), calls straight into
//! [`leadgen_orchestrator::CampaignOrchestrator`] or a raw store/event
//! collaborator for the few reads the orchestrator doesn't wrap, and maps the
//! result onto JSON via [`error::ApiError`]. [`router`] assembles the whole
//! surface from [`state::AppState`].

pub mod auth;
pub mod cursor;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use axum::routing::get;
use axum::routing::post;

pub use state::AppState;

/// Builds the `/api/v2` router over `state`.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v2/campaigns", post(routes::campaigns::create).get(routes::campaigns::list))
        .route("/api/v2/campaigns/{id}", get(routes::campaigns::get))
        .route("/api/v2/campaigns/{id}/progress", get(routes::campaigns::progress))
        .route("/api/v2/campaigns/{id}/{action}", post(routes::campaigns::lifecycle_action))
        .route("/api/v2/campaigns/{id}/phases/{phase}/configure", post(routes::phases::configure))
        .route("/api/v2/campaigns/{id}/phases/{phase}/{action}", post(routes::phases::action))
        .route("/api/v2/campaigns/{id}/events", get(routes::events::list))
        .route("/api/v2/campaigns/{id}/events/stream", get(routes::events::stream))
        .route("/api/v2/campaigns/{id}/results/generated", get(routes::results::generated))
        .route("/api/v2/campaigns/{id}/results/dns", get(routes::results::dns))
        .route("/api/v2/campaigns/{id}/results/http", get(routes::results::http))
        .route("/api/v2/campaigns/{id}/results/analysis", get(routes::results::analysis))
        .with_state(state)
}
