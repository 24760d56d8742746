// crates/leadgen-workers/src/collaborators.rs
// ============================================================================
// Module: Worker Collaborators
// Description: The trait-object bundle every worker task and phase handler
// shares, plus the shared error type and best-effort event emission helper.
// Purpose: Give handlers one cheaply-cloneable handle on every backend seam
// without threading five separate `Arc`s through every function signature.
// Dependencies: leadgen-core, leadgen-orchestrator
// ============================================================================

use std::sync::Arc;

use leadgen_core::CampaignId;
use leadgen_core::EventType;
use leadgen_core::Phase;
use leadgen_core::interfaces::CampaignStore;
use leadgen_core::interfaces::DnsValidator;
use leadgen_core::interfaces::DomainShuffler;
use leadgen_core::interfaces::EventPayload;
use leadgen_core::interfaces::EventSink;
use leadgen_core::interfaces::HttpKeywordValidator;
use leadgen_core::interfaces::MetricEvent;
use leadgen_core::interfaces::Metrics;
use leadgen_core::interfaces::Outcome;
use leadgen_core::interfaces::VersionedConfigStore;
use leadgen_config::WorkerConfig;
use leadgen_orchestrator::CampaignOrchestrator;

/// The single error type phase handlers and the pool propagate. Reusing [`leadgen_core::OrchestratorError`] keeps retryable
/// classification (`is_retryable`) consistent with the orchestrator crate
/// rather than duplicating it here.
pub type HandlerError = leadgen_core::OrchestratorError;

/// Every backend seam a worker task or phase handler needs, bundled so it
/// can be cloned once per spawned task.
#[derive(Clone)]
pub struct WorkerCollaborators {
    /// Campaign, job, and phase-result persistence.
    pub store: Arc<dyn CampaignStore>,
    /// Versioned, CAS-protected domain-pattern configuration store.
    pub config_store: Arc<dyn VersionedConfigStore>,
    /// Per-campaign event stream.
    pub events: Arc<dyn EventSink>,
    /// Metrics sink.
    pub metrics: Arc<dyn Metrics>,
    /// External DNS validator.
    pub dns_validator: Arc<dyn DnsValidator>,
    /// External HTTP keyword validator.
    pub http_validator: Arc<dyn HttpKeywordValidator>,
    /// Stealth visitation-order shuffler (identity by default).
    pub shuffler: Arc<dyn DomainShuffler>,
    /// Phase lifecycle entry point, invoked after a batch completes a phase.
    pub orchestrator: CampaignOrchestrator,
    /// Worker pool tuning: batch size, retry/backoff, CAS retries, lease TTL.
    pub config: WorkerConfig,
}

impl WorkerCollaborators {
    /// Appends an event, recording a metrics failure if the sink errors
    /// rather than failing the batch over a telemetry problem (mirrors the
    /// orchestrator crate's own best-effort `emit`).
    pub fn emit(&self, campaign_id: CampaignId, event_type: EventType, phase: Option<Phase>, payload: EventPayload) {
        if self.events.append(campaign_id, event_type, phase, payload).is_err() {
            self.metrics.record(MetricEvent {
                operation: "emit_event",
                outcome: Outcome::Error,
                latency: None,
            });
        }
    }
}
