// crates/leadgen-core/src/lib.rs
// ============================================================================
// Module: Lead Generation Core
// Description: Pure domain model, phase state machine, and domain generator.
// Purpose: Provide the backend-agnostic types and logic shared by every
// lead-generation campaign orchestrator crate.
// Dependencies: serde, serde_json, sha2, thiserror, time, uuid
// ============================================================================

//! ## Overview
//! `leadgen-core` holds everything that can be expressed without I/O: the
//! campaign/phase data model, the phase state machine, the domain-generation
//! bijection, the access predicate, and the error taxonomy. Every other crate
//! in the workspace depends on this one; this one depends on nothing in the
//! workspace.

pub mod core;
pub mod interfaces;

pub use core::access::AccessDecision;
pub use core::access::AccessError;
pub use core::access::AccessRequest;
pub use core::access::CampaignAction;
pub use core::access::evaluate_access;
pub use core::campaign::Campaign;
pub use core::campaign::CampaignId;
pub use core::campaign::CampaignJob;
pub use core::campaign::CampaignType;
pub use core::campaign::JobId;
pub use core::campaign::JobStatus;
pub use core::campaign::PhaseParams;
pub use core::campaign::TOTAL_PHASES;
pub use core::domain_pattern::BatchBuffer;
pub use core::domain_pattern::DomainPattern;
pub use core::domain_pattern::GenerationError;
pub use core::domain_pattern::PatternType;
pub use core::domain_pattern::config_hash;
pub use core::errors::ErrorCode;
pub use core::errors::OrchestratorError;
pub use core::events::EventPayload;
pub use core::hashing::HashAlgorithm;
pub use core::hashing::HashDigest;
pub use core::hashing::canonical_json_bytes;
pub use core::hashing::hash_bytes;
pub use core::hashing::hash_canonical_json;
pub use core::events::EventType;
pub use core::events::PhaseEvent;
pub use core::identifiers::ConfigHash;
pub use core::identifiers::OwnerId;
pub use core::identifiers::Sequence;
pub use core::state_machine::ControlPhaseError;
pub use core::state_machine::Phase;
pub use core::state_machine::PhaseStatus;
pub use core::state_machine::RerunError;
pub use core::state_machine::TransitionError;
pub use core::state_machine::Trigger;
pub use core::state_machine::check_rerun_precondition;
pub use core::state_machine::resolve_control_phase;
pub use core::state_machine::transition;
pub use core::time::Timestamp;
