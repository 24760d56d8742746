// crates/leadgen-orchestrator/src/dispatch.rs
// ============================================================================
// Module: Tool-Style Dispatch
// Description: One name-routed entry point over the orchestrator's typed API.
// Purpose: Give transports that want a single call-by-name seam (an MCP-style
// tool server, a generic RPC façade) a thin alternative to calling each typed
// method directly.
// Dependencies: leadgen_core
// ============================================================================

//! ## Overview
//! [`handle`] mirrors the typed methods on [`crate::CampaignOrchestrator`]
//! one-for-one: it never contains business logic of its own, only routing.
//! Transports that prefer calling typed methods directly are free to do so;
//! this module exists for callers (an RPC façade, a single MCP-style tool)
//! that want one name-routed entry point instead.

use leadgen_core::CampaignAction;
use leadgen_core::CampaignId;
use leadgen_core::OrchestratorError;
use leadgen_core::OwnerId;
use leadgen_core::Phase;
use leadgen_core::PhaseParams;

use crate::orchestrator::CampaignOrchestrator;
use crate::orchestrator::CampaignProgress;
use leadgen_core::Campaign;

/// The caller identity and role carried by every dispatched request.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    /// Caller identifier.
    pub caller: OwnerId,
    /// True when the caller holds `admin` or `super_admin`.
    pub has_admin_role: bool,
}

/// A name-routed orchestrator request.
#[derive(Debug, Clone)]
pub enum OrchestratorRequest {
    /// See [`CampaignOrchestrator::create_campaign`].
    CreateCampaign {
        /// Campaign display name.
        name: String,
        /// Initial generation-phase configuration.
        generation: PhaseParams,
        /// Whether completed phases should automatically start the next one.
        auto_advance: bool,
    },
    /// See [`CampaignOrchestrator::get_details`].
    GetDetails {
        /// Campaign to read.
        id: CampaignId,
    },
    /// See [`CampaignOrchestrator::list_campaigns`].
    ListCampaigns,
    /// See [`CampaignOrchestrator::configure_phase`].
    ConfigurePhase {
        /// Campaign to configure.
        id: CampaignId,
        /// Phase configuration to record.
        params: PhaseParams,
    },
    /// See [`CampaignOrchestrator::start_phase`].
    StartPhase {
        /// Campaign to start.
        id: CampaignId,
        /// Phase to start.
        phase: Phase,
    },
    /// See [`CampaignOrchestrator::pause`].
    Pause {
        /// Campaign to pause.
        id: CampaignId,
    },
    /// See [`CampaignOrchestrator::resume`].
    Resume {
        /// Campaign to resume.
        id: CampaignId,
    },
    /// See [`CampaignOrchestrator::cancel`].
    Cancel {
        /// Campaign to cancel.
        id: CampaignId,
    },
    /// See [`CampaignOrchestrator::rerun_phase`].
    RerunPhase {
        /// Campaign to rerun a phase of.
        id: CampaignId,
        /// Phase to rerun.
        phase: Phase,
    },
    /// See [`CampaignOrchestrator::retry_phase`].
    RetryPhase {
        /// Campaign to retry a phase of.
        id: CampaignId,
        /// Phase to retry.
        phase: Phase,
    },
    /// See [`CampaignOrchestrator::get_progress`].
    GetProgress {
        /// Campaign to read progress for.
        id: CampaignId,
    },
    /// See [`CampaignOrchestrator::bulk_delete`].
    BulkDelete {
        /// Campaigns to delete.
        ids: Vec<CampaignId>,
    },
}

/// The result of dispatching an [`OrchestratorRequest`].
#[derive(Debug, Clone)]
pub enum OrchestratorResponse {
    /// A single campaign, returned by most mutating operations.
    Campaign(Box<Campaign>),
    /// A campaign listing.
    Campaigns(Vec<Campaign>),
    /// Aggregate and per-phase progress.
    Progress(CampaignProgress),
    /// An operation that has no payload to return.
    Ack,
}

impl OrchestratorRequest {
    /// Returns the [`CampaignAction`] this request requires, for callers that
    /// want to authorize before routing (dispatch itself still authorizes
    /// internally via the typed methods it delegates to).
    #[must_use]
    pub const fn action(&self) -> CampaignAction {
        match self {
            Self::GetDetails {
                ..
            }
            | Self::ListCampaigns
            | Self::GetProgress {
                ..
            } => CampaignAction::Read,
            _ => CampaignAction::Write,
        }
    }
}

/// Routes `request` to the matching typed method on `orchestrator`.
///
/// # Errors
///
/// Returns whatever [`OrchestratorError`] the underlying typed method
/// returns.
pub fn handle(
    orchestrator: &CampaignOrchestrator,
    context: RequestContext,
    request: OrchestratorRequest,
) -> Result<OrchestratorResponse, OrchestratorError> {
    let RequestContext {
        caller,
        has_admin_role,
    } = context;
    match request {
        OrchestratorRequest::CreateCampaign {
            name,
            generation,
            auto_advance,
        } => orchestrator
            .create_campaign(caller, name, generation, auto_advance)
            .map(|campaign| OrchestratorResponse::Campaign(Box::new(campaign))),
        OrchestratorRequest::GetDetails {
            id,
        } => orchestrator
            .get_details(caller, has_admin_role, id)
            .map(|campaign| OrchestratorResponse::Campaign(Box::new(campaign))),
        OrchestratorRequest::ListCampaigns => orchestrator
            .list_campaigns(caller, has_admin_role)
            .map(OrchestratorResponse::Campaigns),
        OrchestratorRequest::ConfigurePhase {
            id,
            params,
        } => orchestrator
            .configure_phase(caller, has_admin_role, id, params)
            .map(|campaign| OrchestratorResponse::Campaign(Box::new(campaign))),
        OrchestratorRequest::StartPhase {
            id,
            phase,
        } => orchestrator
            .start_phase(caller, has_admin_role, id, phase)
            .map(|campaign| OrchestratorResponse::Campaign(Box::new(campaign))),
        OrchestratorRequest::Pause {
            id,
        } => orchestrator
            .pause(caller, has_admin_role, id)
            .map(|campaign| OrchestratorResponse::Campaign(Box::new(campaign))),
        OrchestratorRequest::Resume {
            id,
        } => orchestrator
            .resume(caller, has_admin_role, id)
            .map(|campaign| OrchestratorResponse::Campaign(Box::new(campaign))),
        OrchestratorRequest::Cancel {
            id,
        } => orchestrator
            .cancel(caller, has_admin_role, id)
            .map(|campaign| OrchestratorResponse::Campaign(Box::new(campaign))),
        OrchestratorRequest::RerunPhase {
            id,
            phase,
        } => orchestrator
            .rerun_phase(caller, has_admin_role, id, phase)
            .map(|campaign| OrchestratorResponse::Campaign(Box::new(campaign))),
        OrchestratorRequest::RetryPhase {
            id,
            phase,
        } => orchestrator
            .retry_phase(caller, has_admin_role, id, phase)
            .map(|campaign| OrchestratorResponse::Campaign(Box::new(campaign))),
        OrchestratorRequest::GetProgress {
            id,
        } => orchestrator
            .get_progress(caller, has_admin_role, id)
            .map(OrchestratorResponse::Progress),
        OrchestratorRequest::BulkDelete {
            ids,
        } => orchestrator
            .bulk_delete(caller, has_admin_role, &ids)
            .map(|()| OrchestratorResponse::Ack),
    }
}
