// crates/leadgen-orchestrator/src/lib.rs
// ============================================================================
// Module: Lead Generation Orchestrator
// Description: Campaign/phase lifecycle operations and tool-style dispatch.
// Purpose: Give REST, CLI, and worker-completion callers one seam that
// enforces access control and drives the phase state machine consistently.
// Dependencies: leadgen-core
// ============================================================================

//! ## Overview
//! This crate has no transport or storage of its own. [`CampaignOrchestrator`]
//! is constructed with trait-object collaborators (a [`leadgen_core::interfaces::CampaignStore`],
//! [`leadgen_core::interfaces::EventSink`], metrics sink, and audit sink) and
//! exposes both a typed method per lifecycle operation and a single
//! [`handle`] entry point for callers that want to route by name.

mod dispatch;
mod metadata;
mod orchestrator;

pub use dispatch::OrchestratorRequest;
pub use dispatch::OrchestratorResponse;
pub use dispatch::RequestContext;
pub use dispatch::handle;
pub use metadata::CampaignMetadata;
pub use orchestrator::CampaignOrchestrator;
pub use orchestrator::CampaignOrchestratorConfig;
pub use orchestrator::CampaignProgress;
pub use orchestrator::PhaseProgress;
