// crates/leadgen-core/src/core/state_machine.rs
// ============================================================================
// Module: Phase State Machine
// Description: Pure, in-memory transition table governing phase status.
// Purpose: Decide legal status transitions, resolve the control phase, and
// enforce the rerun precondition without touching storage.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The state machine is a pure value: given a `(from, trigger)` pair it
//! returns either the resulting state or a 409-shaped [`TransitionError`]. It
//! carries no per-campaign state of its own — callers persist the result.
//! This lets the full transition table be covered by property tests
//! independent of any store.

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Phases
// ============================================================================

/// One of the four pipeline stages.
///
/// # Invariants
/// - Ordering reflects pipeline order; phase 1 is `Generation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Domain generation (phase 1).
    Generation,
    /// DNS validation (phase 2).
    Dns,
    /// HTTP keyword validation (phase 3).
    Http,
    /// Analysis (phase 4).
    Analysis,
}

impl Phase {
    /// The four phases in pipeline order.
    pub const ORDER: [Self; 4] = [Self::Generation, Self::Dns, Self::Http, Self::Analysis];

    /// Returns the zero-based pipeline index of this phase.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Generation => 0,
            Self::Dns => 1,
            Self::Http => 2,
            Self::Analysis => 3,
        }
    }

    /// Returns a stable label for the phase.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Generation => "generation",
            Self::Dns => "dns",
            Self::Http => "http",
            Self::Analysis => "analysis",
        }
    }

    /// Parses a phase from its stable label (the `{phase}` URL path segment),
    /// returning `None` for anything else.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "generation" => Some(Self::Generation),
            "dns" => Some(Self::Dns),
            "http" => Some(Self::Http),
            "analysis" => Some(Self::Analysis),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Phase Status
// ============================================================================

/// Status of a single phase.
///
/// # Invariants
/// - `Completed | Failed | Skipped` are terminal: no outgoing transitions
///   except the explicit `rerun`/`retry` triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// Phase has not been configured or started.
    NotStarted,
    /// Phase is ready to be configured (ordering precondition satisfied).
    Ready,
    /// Phase has been configured with parameters.
    Configured,
    /// Phase is actively processing.
    InProgress,
    /// Phase is paused mid-processing.
    Paused,
    /// Phase completed successfully.
    Completed,
    /// Phase failed.
    Failed,
    /// Phase was explicitly skipped.
    Skipped,
}

impl PhaseStatus {
    /// Returns true when this status is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

/// Trigger events accepted by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Move `not_started`/`ready` toward `configured`.
    Configure,
    /// Begin processing.
    Start,
    /// Suspend processing.
    Pause,
    /// Resume processing.
    Resume,
    /// Mark processing as completed.
    Complete,
    /// Mark processing as failed.
    Fail,
    /// Restart a completed phase.
    Rerun,
    /// Restart a failed phase.
    Retry,
    /// Explicitly bypass the phase.
    Skip,
}

impl Trigger {
    /// Returns a stable label for the trigger, used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Complete => "complete",
            Self::Fail => "fail",
            Self::Rerun => "rerun",
            Self::Retry => "retry",
            Self::Skip => "skip",
        }
    }
}

impl PhaseStatus {
    /// Returns a stable label for the status, used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Ready => "ready",
            Self::Configured => "configured",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

// ============================================================================
// SECTION: 409-Shaped Errors
// ============================================================================

/// A 409-shaped transition rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionError {
    /// Stable machine-readable error code (always `INVALID_PHASE_TRANSITION`).
    pub code: &'static str,
    /// The phase status at the time of the attempted transition.
    pub current_state: &'static str,
    /// The trigger that was rejected.
    pub attempted_action: &'static str,
    /// Human-readable message.
    pub message: String,
}

/// A 409-shaped rerun precondition failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerunError {
    /// Stable machine-readable error code (always `RERUN_PRECONDITION_FAILED`).
    pub code: &'static str,
    /// Reason label.
    pub reason: &'static str,
    /// The phase currently blocking the rerun.
    pub blocking_phase: Phase,
}

/// A 409-shaped control-phase resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPhaseError {
    /// Stable machine-readable error code (always `NO_CONTROL_PHASE`).
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

// ============================================================================
// SECTION: Transition Table
// ============================================================================

/// Applies `trigger` to `from`, returning the resulting status or a
/// 409-shaped [`TransitionError`].
///
/// Self-transitions (a trigger that would leave the phase in its current
/// status) are idempotent no-ops and always succeed.
#[must_use = "the transition result must be persisted by the caller"]
pub fn transition(from: PhaseStatus, trigger: Trigger) -> Result<PhaseStatus, TransitionError> {
    use PhaseStatus::{Completed, Configured, Failed, InProgress, NotStarted, Paused, Ready, Skipped};
    use Trigger::{Complete, Configure, Fail, Pause, Resume, Rerun, Retry, Skip, Start};

    let to = match (from, trigger) {
        (NotStarted | Ready | Configured, Start) => InProgress,
        (NotStarted, Configure) => Configured,
        (Ready, Configure) => Configured,
        (InProgress, Pause) => Paused,
        (Paused, Resume) => InProgress,
        (InProgress, Complete) => Completed,
        (InProgress | Paused, Fail) => Failed,
        (Completed, Rerun) => InProgress,
        (Failed, Retry) => InProgress,
        (NotStarted | Ready | Configured, Skip) => Skipped,
        _ if is_self_transition(from, trigger) => from,
        _ => {
            return Err(TransitionError {
                code: "INVALID_PHASE_TRANSITION",
                current_state: from.label(),
                attempted_action: trigger.label(),
                message: format!(
                    "Cannot {} from '{}' state",
                    trigger.label(),
                    from.label()
                ),
            });
        }
    };
    Ok(to)
}

/// Returns true when applying `trigger` to `from` would be a no-op.
fn is_self_transition(from: PhaseStatus, trigger: Trigger) -> bool {
    matches!(
        (from, trigger),
        (PhaseStatus::InProgress, Trigger::Start)
            | (PhaseStatus::Paused, Trigger::Pause)
            | (PhaseStatus::Configured, Trigger::Configure)
    )
}

// ============================================================================
// SECTION: Control-Phase Resolution
// ============================================================================

/// Resolves the control phase: the first `paused` phase if any, else the
/// first `in_progress` phase, else `None`.
#[must_use]
pub fn resolve_control_phase(phases: &[(Phase, PhaseStatus)]) -> Option<Phase> {
    Phase::ORDER.into_iter().find_map(|phase| {
        phases
            .iter()
            .find(|(p, status)| *p == phase && *status == PhaseStatus::Paused)
            .map(|(p, _)| *p)
    }).or_else(|| {
        Phase::ORDER.into_iter().find_map(|phase| {
            phases
                .iter()
                .find(|(p, status)| *p == phase && *status == PhaseStatus::InProgress)
                .map(|(p, _)| *p)
        })
    })
}

/// Validates the rerun precondition: no other phase may be `in_progress` or
/// `paused`.
///
/// # Errors
///
/// Returns [`RerunError`] naming the blocking phase when another phase is
/// active.
pub fn check_rerun_precondition(
    target: Phase,
    phases: &[(Phase, PhaseStatus)],
) -> Result<(), RerunError> {
    for (phase, status) in phases {
        if *phase == target {
            continue;
        }
        if matches!(status, PhaseStatus::InProgress | PhaseStatus::Paused) {
            return Err(RerunError {
                code: "RERUN_PRECONDITION_FAILED",
                reason: "another_phase_active",
                blocking_phase: *phase,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_from_not_started_succeeds() {
        assert_eq!(
            transition(PhaseStatus::NotStarted, Trigger::Start),
            Ok(PhaseStatus::InProgress)
        );
    }

    #[test]
    fn complete_from_paused_is_rejected_with_409_shape() {
        let err = transition(PhaseStatus::Paused, Trigger::Complete).unwrap_err();
        assert_eq!(err.code, "INVALID_PHASE_TRANSITION");
        assert_eq!(err.current_state, "paused");
        assert_eq!(err.attempted_action, "complete");
    }

    #[test]
    fn terminal_statuses_reject_generic_triggers() {
        for terminal in [PhaseStatus::Completed, PhaseStatus::Failed, PhaseStatus::Skipped] {
            assert!(transition(terminal, Trigger::Pause).is_err());
        }
    }

    #[test]
    fn self_transitions_are_idempotent() {
        assert_eq!(
            transition(PhaseStatus::InProgress, Trigger::Start),
            Ok(PhaseStatus::InProgress)
        );
        assert_eq!(
            transition(PhaseStatus::Paused, Trigger::Pause),
            Ok(PhaseStatus::Paused)
        );
    }

    #[test]
    fn control_phase_prefers_paused_over_in_progress() {
        let phases = [
            (Phase::Generation, PhaseStatus::Completed),
            (Phase::Dns, PhaseStatus::InProgress),
            (Phase::Http, PhaseStatus::Paused),
            (Phase::Analysis, PhaseStatus::NotStarted),
        ];
        assert_eq!(resolve_control_phase(&phases), Some(Phase::Http));
    }

    #[test]
    fn control_phase_none_when_nothing_active() {
        let phases = [
            (Phase::Generation, PhaseStatus::Completed),
            (Phase::Dns, PhaseStatus::NotStarted),
        ];
        assert_eq!(resolve_control_phase(&phases), None);
    }

    #[test]
    fn rerun_precondition_names_blocking_phase() {
        let phases = [
            (Phase::Generation, PhaseStatus::Completed),
            (Phase::Dns, PhaseStatus::InProgress),
            (Phase::Http, PhaseStatus::NotStarted),
            (Phase::Analysis, PhaseStatus::NotStarted),
        ];
        let err = check_rerun_precondition(Phase::Generation, &phases).unwrap_err();
        assert_eq!(err.code, "RERUN_PRECONDITION_FAILED");
        assert_eq!(err.blocking_phase, Phase::Dns);
    }
}
