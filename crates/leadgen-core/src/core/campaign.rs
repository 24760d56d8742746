// crates/leadgen-core/src/core/campaign.rs
// ============================================================================
// Module: Campaign Data Model
// Description: Campaign, phase parameters, and campaign job records.
// Purpose: Define the wire/storage shape of the Campaign and Campaign
// Job records.
// Dependencies: crate::core::{domain_pattern, identifiers, state_machine,
// time}, serde, serde_json, uuid
// ============================================================================

//! ## Overview
//! A campaign is identity plus the aggregate progress/status columns the data model
//! describes; per-phase configuration lives in `metadata` as JSON rather than
//! as separate typed columns, matching the data model's "free-form metadata
//! holding per-phase configurations" clause.

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::core::domain_pattern::DomainPattern;
use crate::core::identifiers::OwnerId;
use crate::core::state_machine::Phase;
use crate::core::state_machine::PhaseStatus;
use crate::core::time::Timestamp;

/// Campaign identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(Uuid);

impl CampaignId {
    /// Creates a campaign identifier from a raw UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a fresh random campaign identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the raw UUID value.
    #[must_use]
    pub const fn get(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for CampaignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Campaign type. Currently only `lead_generation` is modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignType {
    /// The only campaign type this orchestrator pipeline supports.
    LeadGeneration,
}

/// Fixed total number of phases in the lead-generation pipeline.
pub const TOTAL_PHASES: u32 = 4;

/// A lead-generation campaign.
///
/// # Invariants
/// - `completed_phases <= total_phases`.
/// - `overall_progress` is in `[0, 100]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// Campaign identifier.
    pub id: CampaignId,
    /// Human-readable campaign name.
    pub name: String,
    /// Owning user, if any.
    pub owner: Option<OwnerId>,
    /// Campaign type.
    pub campaign_type: CampaignType,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last update timestamp.
    pub updated_at: Timestamp,
    /// Phase currently holding the control position, if any.
    pub current_phase: Option<Phase>,
    /// Status of `current_phase`.
    pub phase_status: PhaseStatus,
    /// Fixed at [`TOTAL_PHASES`] for lead generation.
    pub total_phases: u32,
    /// Number of phases that have reached `completed`.
    pub completed_phases: u32,
    /// Aggregate progress across all phases, in `[0, 100]`.
    pub overall_progress: u8,
    /// Timestamp the campaign was started, if started.
    pub started_at: Option<Timestamp>,
    /// Timestamp the campaign completed, if completed.
    pub completed_at: Option<Timestamp>,
    /// Error message when the campaign is in a failed state.
    pub error_message: Option<String>,
    /// Free-form per-phase configuration and bookkeeping.
    pub metadata: serde_json::Value,
    /// Whether completing a phase should automatically start the next one.
    pub auto_advance: bool,
}

/// Per-phase configuration input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhaseParams {
    /// Domain-generation configuration: the pattern plus how many domains to
    /// target.
    Generation {
        /// The domain pattern to generate from.
        pattern: DomainPattern,
        /// Number of domains to generate before the phase completes.
        target_count: u64,
    },
    /// DNS validation configuration.
    Dns {
        /// Resolver personas to rotate through.
        personas: Vec<String>,
        /// Maximum validation attempts per domain.
        max_attempts: u32,
    },
    /// HTTP keyword validation configuration.
    Http {
        /// Fetch personas to rotate through.
        personas: Vec<String>,
        /// Named keyword sets to match against fetched content.
        keyword_sets: Vec<Vec<String>>,
        /// Ad-hoc keywords evaluated independently of named sets.
        adhoc_keywords: Vec<String>,
    },
    /// Analysis configuration.
    Analysis {
        /// Reserved for future campaign-configurable score weighting (spec
        /// §9 open question; fixed weights are used today regardless of
        /// this field's contents).
        weights: serde_json::Value,
    },
}

impl PhaseParams {
    /// Returns the phase this configuration applies to.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Generation {
                ..
            } => Phase::Generation,
            Self::Dns {
                ..
            } => Phase::Dns,
            Self::Http {
                ..
            } => Phase::Http,
            Self::Analysis {
                ..
            } => Phase::Analysis,
        }
    }
}

// ============================================================================
// SECTION: Campaign Job
// ============================================================================

/// Campaign job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Creates a job identifier from a raw UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a fresh random job identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the raw UUID value.
    #[must_use]
    pub const fn get(self) -> Uuid {
        self.0
    }
}

/// Status of a queued phase job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting to be claimed by a worker.
    Pending,
    /// Claimed and being processed by a worker.
    InProgress,
    /// Completed successfully.
    Completed,
    /// Failed after exhausting retries.
    Failed,
}

/// A queued unit of phase work.
///
/// # Invariants
/// - At most one worker holds `worker_id` while `status == in_progress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignJob {
    /// Job identifier.
    pub id: JobId,
    /// Campaign this job belongs to.
    pub campaign_id: CampaignId,
    /// Phase this job processes.
    pub phase_type: Phase,
    /// Current job status.
    pub status: JobStatus,
    /// Earliest time this job may next be claimed (backoff scheduling).
    pub next_attempt_at: Timestamp,
    /// Number of claim attempts so far.
    pub attempts: u32,
    /// Last error message, if any attempt failed.
    pub last_error: Option<String>,
    /// Identifier of the worker currently holding the job, if claimed.
    pub worker_id: Option<String>,
}
