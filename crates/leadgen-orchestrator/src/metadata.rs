// crates/leadgen-orchestrator/src/metadata.rs
// ============================================================================
// Module: Campaign Metadata
// Description: Per-phase status and configuration, stored in Campaign::metadata.
// Purpose: Give the orchestrator one typed view over the free-form metadata
// JSON blob that leadgen-store treats as opaque.
// Dependencies: leadgen-core, serde, serde_json
// ============================================================================

//! ## Overview
//! `leadgen-store` persists one `current_phase`/`phase_status` pair per
//! campaign (the control phase) plus an opaque `metadata` JSON blob. The
//! per-phase bookkeeping needed for ordering and rerun checks — the status
//! and configuration of phases that are *not* currently the control phase —
//! lives inside that blob, matching the campaign data model's "free-form
//! metadata holding per-phase configuration and bookkeeping" field.

use leadgen_core::Phase;
use leadgen_core::PhaseParams;
use leadgen_core::PhaseStatus;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PhaseRecord {
    status: PhaseStatus,
    params: Option<PhaseParams>,
}

/// Typed view over `Campaign::metadata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignMetadata {
    generation: PhaseRecord,
    dns: PhaseRecord,
    http: PhaseRecord,
    analysis: PhaseRecord,
    /// Per-campaign cursor into the domain pattern's combination space,
    /// advanced as the generation handler produces batches. Distinct from the versioned config store's `last_offset`,
    /// which is the process-wide high-water mark shared by every campaign
    /// using the same pattern.
    #[serde(default)]
    generation_offset: u128,
}

impl Default for CampaignMetadata {
    /// A fresh campaign starts with phase 1 `ready` (ordering is trivially
    /// satisfied) and every later phase `not_started`.
    fn default() -> Self {
        Self {
            generation: PhaseRecord {
                status: PhaseStatus::Ready,
                params: None,
            },
            dns: PhaseRecord {
                status: PhaseStatus::NotStarted,
                params: None,
            },
            http: PhaseRecord {
                status: PhaseStatus::NotStarted,
                params: None,
            },
            analysis: PhaseRecord {
                status: PhaseStatus::NotStarted,
                params: None,
            },
            generation_offset: 0,
        }
    }
}

impl CampaignMetadata {
    /// Parses metadata out of a campaign's stored JSON value, falling back
    /// to the default shape if absent (e.g. a campaign row inserted before
    /// this field existed).
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Serializes back into the JSON shape `Campaign::metadata` stores.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (never happens for this
    /// type's fields).
    pub fn into_value(self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn record(&self, phase: Phase) -> &PhaseRecord {
        match phase {
            Phase::Generation => &self.generation,
            Phase::Dns => &self.dns,
            Phase::Http => &self.http,
            Phase::Analysis => &self.analysis,
        }
    }

    fn record_mut(&mut self, phase: Phase) -> &mut PhaseRecord {
        match phase {
            Phase::Generation => &mut self.generation,
            Phase::Dns => &mut self.dns,
            Phase::Http => &mut self.http,
            Phase::Analysis => &mut self.analysis,
        }
    }

    /// Returns `phase`'s currently recorded status.
    #[must_use]
    pub fn status(&self, phase: Phase) -> PhaseStatus {
        self.record(phase).status
    }

    /// Sets `phase`'s recorded status.
    pub fn set_status(&mut self, phase: Phase, status: PhaseStatus) {
        self.record_mut(phase).status = status;
    }

    /// Returns `phase`'s recorded configuration, if any.
    #[must_use]
    pub fn params(&self, phase: Phase) -> Option<&PhaseParams> {
        self.record(phase).params.as_ref()
    }

    /// Records `params` for its own phase.
    pub fn set_params(&mut self, params: PhaseParams) {
        self.record_mut(params.phase()).params = Some(params);
    }

    /// Returns every phase's current status, in pipeline order, for
    /// control-phase resolution and rerun precondition checks.
    #[must_use]
    pub fn all_statuses(&self) -> [(Phase, PhaseStatus); 4] {
        Phase::ORDER.map(|phase| (phase, self.status(phase)))
    }

    /// Returns the campaign's current position in its generation pattern's
    /// combination space.
    #[must_use]
    pub const fn generation_offset(&self) -> u128 {
        self.generation_offset
    }

    /// Records the campaign's current position in its generation pattern's
    /// combination space.
    pub fn set_generation_offset(&mut self, offset: u128) {
        self.generation_offset = offset;
    }

    /// Returns true when `phase`'s ordering precondition is satisfied: it is
    /// the first phase, or the immediately preceding phase has completed
    ///.
    #[must_use]
    pub fn ordering_satisfied(&self, phase: Phase) -> bool {
        match phase.index().checked_sub(1) {
            None => true,
            Some(previous_index) => self.status(Phase::ORDER[previous_index]) == PhaseStatus::Completed,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use super::*;

    #[test]
    fn default_only_generation_is_ready() {
        let metadata = CampaignMetadata::default();
        assert_eq!(metadata.status(Phase::Generation), PhaseStatus::Ready);
        assert_eq!(metadata.status(Phase::Dns), PhaseStatus::NotStarted);
    }

    #[test]
    fn ordering_requires_previous_phase_completed() {
        let mut metadata = CampaignMetadata::default();
        assert!(metadata.ordering_satisfied(Phase::Generation));
        assert!(!metadata.ordering_satisfied(Phase::Dns));
        metadata.set_status(Phase::Generation, PhaseStatus::Completed);
        assert!(metadata.ordering_satisfied(Phase::Dns));
    }

    #[test]
    fn round_trips_through_json() {
        let mut metadata = CampaignMetadata::default();
        metadata.set_params(PhaseParams::Dns {
            personas: vec!["default".to_string()],
            max_attempts: 3,
        });
        let value = metadata.clone().into_value().expect("serialize");
        let restored = CampaignMetadata::from_value(&value);
        assert_eq!(restored.status(Phase::Dns), metadata.status(Phase::Dns));
        assert!(restored.params(Phase::Dns).is_some());
    }
}
