// crates/leadgen-api/src/state.rs
// ============================================================================
// Module: Shared Server State
// Description: Collaborators every route handler needs, behind `State`.
// Purpose: Give handlers the orchestrator for lifecycle operations plus
// direct store/event access for the read-only results and event endpoints
// the orchestrator doesn't itself expose.
// Dependencies: axum, leadgen_core, leadgen_orchestrator
// ============================================================================

use std::sync::Arc;

use leadgen_core::interfaces::CampaignStore;
use leadgen_core::interfaces::EventSink;
use leadgen_events::LiveEventSource;
use leadgen_orchestrator::CampaignOrchestrator;

/// Shared collaborators injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    /// Lifecycle operations and access control.
    pub orchestrator: CampaignOrchestrator,
    /// Direct store access for results listings the orchestrator doesn't
    /// wrap in a typed method.
    pub store: Arc<dyn CampaignStore>,
    /// Direct event access for replay.
    pub events: Arc<dyn EventSink>,
    /// Live event subscription source backing the SSE stream endpoint.
    pub live: Arc<dyn LiveEventSource>,
    /// Default page size for cursor-paginated results endpoints.
    pub default_page_size: usize,
    /// Upper bound on a caller-requested page size.
    pub max_page_size: usize,
}

impl AppState {
    /// Builds the shared state from its collaborators, using the default
    /// page-size bounds.
    #[must_use]
    pub fn new(
        orchestrator: CampaignOrchestrator,
        store: Arc<dyn CampaignStore>,
        events: Arc<dyn EventSink>,
        live: Arc<dyn LiveEventSource>,
    ) -> Self {
        Self {
            orchestrator,
            store,
            events,
            live,
            default_page_size: 100,
            max_page_size: 1_000,
        }
    }

    /// Clamps a caller-requested page size to `[1, max_page_size]`,
    /// defaulting to `default_page_size` when absent.
    #[must_use]
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_page_size).clamp(1, self.max_page_size)
    }
}
