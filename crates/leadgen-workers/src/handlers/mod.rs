// crates/leadgen-workers/src/handlers/mod.rs
// ============================================================================
// Module: Phase Handlers
// Description: The shared handler contract and phase dispatch.
// Purpose: Give every phase handler one `Process`-shaped
// entry point and let the pool pick the right one by job phase type.
// Dependencies: leadgen-core
// ============================================================================

//! ## Overview
//! A phase handler advances one batch of a phase for one campaign and
//! reports back whether the phase is now done via
//! `Process(ctx, campaign_id, batch_size) -> (batch_done, processed_count,
//! err)`. Handlers run synchronously once invoked; the pool is what's
//! async, not the phase logic itself.

mod analysis;
mod dns;
mod generation;
mod http;

use leadgen_core::CampaignId;
use leadgen_core::Phase;

use crate::collaborators::HandlerError;
use crate::collaborators::WorkerCollaborators;

/// Result of advancing one batch of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    /// True when the phase has no more work.
    pub batch_done: bool,
    /// Number of items this call processed, for job/progress accounting.
    pub processed_count: u64,
}

/// Advances one batch of `phase` for `campaign_id`.
pub trait PhaseHandler: Send + Sync {
    /// Runs one claimed job's worth of work.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`]; retryable variants (external dependency
    /// failure, config CAS contention) are rescheduled by the pool, fatal
    /// variants fail the phase immediately.
    fn process(
        &self,
        collaborators: &WorkerCollaborators,
        worker_id: &str,
        campaign_id: CampaignId,
        batch_size: usize,
    ) -> Result<BatchOutcome, HandlerError>;
}

/// Routes a claimed job to its phase's handler.
///
/// # Errors
///
/// Propagates whatever the selected handler returns.
pub fn dispatch(
    collaborators: &WorkerCollaborators,
    worker_id: &str,
    phase: Phase,
    campaign_id: CampaignId,
    batch_size: usize,
) -> Result<BatchOutcome, HandlerError> {
    match phase {
        Phase::Generation => generation::GenerationHandler.process(collaborators, worker_id, campaign_id, batch_size),
        Phase::Dns => dns::DnsHandler.process(collaborators, worker_id, campaign_id, batch_size),
        Phase::Http => http::HttpHandler.process(collaborators, worker_id, campaign_id, batch_size),
        Phase::Analysis => analysis::AnalysisHandler.process(collaborators, worker_id, campaign_id, batch_size),
    }
}
