// crates/leadgen-workers/src/lib.rs
// ============================================================================
// Module: Lead Generation Workers
// Description: The adaptive worker pool and its four phase handlers.
// Purpose: Turn a claimed campaign job into forward progress on a phase,
// resumable across crashes and restarts.
// Dependencies: leadgen-core, leadgen-orchestrator, leadgen-config, tokio
// ============================================================================

//! ## Overview
//! This crate has no transport of its own. [`WorkerPool`] claims jobs from a
//! [`leadgen_core::interfaces::CampaignStore`] and routes each one to the
//! matching [`handlers::PhaseHandler`], which advances one batch of a phase
//! and reports back whether the phase is done. The pool itself only knows
//! about claiming, heartbeating, retrying, and reaping; it has no opinion on
//! domain generation, DNS, HTTP, or scoring.

mod collaborators;
pub mod handlers;
mod locks;
pub mod pool;
pub mod testing;

pub use collaborators::HandlerError;
pub use collaborators::WorkerCollaborators;
pub use handlers::BatchOutcome;
pub use handlers::PhaseHandler;
pub use locks::CampaignLocks;
pub use pool::WorkerPool;
