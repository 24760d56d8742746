// crates/leadgen-api/src/dto.rs
// ============================================================================
// Module: Request/Response Bodies
// Description: JSON shapes that don't already have a core type to reuse.
// Purpose: Keep handlers thin by giving every endpoint a typed body/query
// struct.
// Dependencies: leadgen_core, serde
// ============================================================================

use leadgen_core::CampaignId;
use leadgen_core::Phase;
use leadgen_core::PhaseParams;
use leadgen_core::PhaseStatus;
use serde::Deserialize;
use serde::Serialize;

/// Body of `POST /campaigns`.
#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    /// Human-readable campaign name.
    pub name: String,
    /// Generation-phase configuration (the only phase configurable at
    /// creation time).
    pub generation: PhaseParams,
    /// Whether completing a phase should automatically start the next one.
    #[serde(default)]
    pub auto_advance: bool,
}

/// Query parameters accepted by `GET /campaigns`.
#[derive(Debug, Deserialize, Default)]
pub struct ListCampaignsQuery {
    /// Optional status filter: `active`, `completed`, or `failed`. Absent
    /// means no filtering beyond the server-side ownership filter every
    /// list already applies.
    pub filter: Option<String>,
}

/// Query parameters accepted by the cursor-paginated results endpoints.
#[derive(Debug, Deserialize, Default)]
pub struct ResultsQuery {
    /// Opaque cursor from a previous page's `next_cursor`.
    pub cursor: Option<String>,
    /// Page size; servers may still cap this below the requested value.
    pub limit: Option<usize>,
}

/// Query parameters accepted by `GET /campaigns/{id}/events`.
#[derive(Debug, Deserialize, Default)]
pub struct EventsQuery {
    /// Only return events with a sequence strictly greater than this.
    pub since: Option<i64>,
}

/// One page of a cursor-paginated results listing.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    /// Items in this page, in stable order.
    pub items: Vec<T>,
    /// Cursor for the next page, absent once exhausted.
    pub next_cursor: Option<String>,
}

/// One phase's status, as reported by `GET /campaigns/{id}/progress`.
#[derive(Debug, Serialize)]
pub struct PhaseProgressView {
    /// The phase this entry describes.
    pub phase: Phase,
    /// The phase's current status.
    pub status: PhaseStatus,
}

/// Body of `POST /campaigns/{id}/delete`, once the campaign itself is gone.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// The campaign that was deleted.
    pub id: CampaignId,
    /// Always `true`; present for symmetry with the other lifecycle bodies.
    pub deleted: bool,
}

/// Body of `GET /campaigns/{id}/progress`.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    /// The phase currently holding the control position, if any.
    pub current_phase: Option<Phase>,
    /// Campaign-wide aggregate progress in `[0, 100]`.
    pub overall_progress: u8,
    /// Status of every phase, in pipeline order.
    pub per_phase: Vec<PhaseProgressView>,
}
