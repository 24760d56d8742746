// crates/leadgen-core/src/core/errors.rs
// ============================================================================
// Module: Error Taxonomy
// Description: The shared error type translated into the §6.1 HTTP envelope.
// Purpose: Give every crate one place to classify retryable vs. fatal errors
// and to map onto the documented error codes.
// Dependencies: crate::core::state_machine, thiserror
// ============================================================================

//! ## Overview
//! [`OrchestratorError`] is the single error type that crosses crate
//! boundaries in this workspace. Handlers distinguish retryable errors
//! (external, contention) from fatal ones (validation, integrity) via
//! [`OrchestratorError::is_retryable`].

use thiserror::Error;

use crate::core::access::AccessError;
use crate::core::domain_pattern::GenerationError;
use crate::core::state_machine::ControlPhaseError;
use crate::core::state_machine::Phase;
use crate::core::state_machine::RerunError;
use crate::core::state_machine::TransitionError;
use crate::interfaces::CampaignStoreError;
use crate::interfaces::ConfigStoreError;
use crate::interfaces::EventStoreError;

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Resource absent or access-filtered.
    NotFound,
    /// State machine rejected the transition.
    InvalidPhaseTransition,
    /// Rerun precondition failed because another phase is active.
    RerunPreconditionFailed,
    /// Pause/resume with no active phase.
    NoControlPhase,
    /// CAS retries exhausted on the versioned config store.
    ConfigUpdateContention,
    /// Lease held by another owner.
    ConfigLocked,
    /// Integrity check failure on a versioned config record.
    ConfigCorrupted,
    /// Input failed schema or business-rule validation.
    ValidationFailed,
    /// DNS/HTTP validator transient failure.
    ExternalUnavailable,
    /// Unexpected internal error.
    Internal,
}

impl ErrorCode {
    /// Returns the stable wire label for the code.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidPhaseTransition => "INVALID_PHASE_TRANSITION",
            Self::RerunPreconditionFailed => "RERUN_PRECONDITION_FAILED",
            Self::NoControlPhase => "NO_CONTROL_PHASE",
            Self::ConfigUpdateContention => "CONFIG_UPDATE_CONTENTION",
            Self::ConfigLocked => "CONFIG_LOCKED",
            Self::ConfigCorrupted => "CONFIG_CORRUPTED",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::ExternalUnavailable => "EXTERNAL_UNAVAILABLE",
            Self::Internal => "INTERNAL",
        }
    }

    /// Returns the HTTP status code the §6.1 envelope maps this code to.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidPhaseTransition | Self::RerunPreconditionFailed | Self::NoControlPhase => {
                409
            }
            Self::ConfigLocked => 423,
            Self::ValidationFailed => 400,
            Self::ConfigUpdateContention | Self::ExternalUnavailable => 503,
            Self::ConfigCorrupted | Self::Internal => 500,
        }
    }
}

/// Shared error type for every orchestrator-facing operation.
///
/// # Invariants
/// - 409 state-machine variants never mutate state before being returned
///.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Resource absent or access-filtered (deliberately indistinguishable).
    #[error("{0}")]
    NotFound(String),
    /// State machine transition rejection.
    #[error("{}", .0.message)]
    InvalidTransition(TransitionError),
    /// Rerun precondition failure.
    #[error("rerun blocked by phase {:?}", .0.blocking_phase)]
    RerunPrecondition(RerunError),
    /// Control-phase resolution failure.
    #[error("{}", .0.message)]
    NoControlPhase(ControlPhaseError),
    /// CAS retries exhausted.
    #[error("config update contention on hash {0}")]
    ConfigUpdateContention(String),
    /// Lease held by another owner.
    #[error("config hash {hash} is locked by {owner}")]
    ConfigLocked {
        /// Config hash that is locked.
        hash: String,
        /// Owner token holding the lease.
        owner: String,
    },
    /// Integrity check failure.
    #[error("config hash {0} failed integrity validation")]
    ConfigCorrupted(String),
    /// Input validation failure.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Transient external dependency failure (retryable).
    #[error("external dependency unavailable: {0}")]
    ExternalUnavailable(String),
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OrchestratorError {
    /// Returns true when the handler should increment `attempts` and
    /// reschedule rather than fail the phase.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConfigUpdateContention(_) | Self::ExternalUnavailable(_)
        )
    }

    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::InvalidTransition(_) => ErrorCode::InvalidPhaseTransition,
            Self::RerunPrecondition(_) => ErrorCode::RerunPreconditionFailed,
            Self::NoControlPhase(_) => ErrorCode::NoControlPhase,
            Self::ConfigUpdateContention(_) => ErrorCode::ConfigUpdateContention,
            Self::ConfigLocked { .. } => ErrorCode::ConfigLocked,
            Self::ConfigCorrupted(_) => ErrorCode::ConfigCorrupted,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::ExternalUnavailable(_) => ErrorCode::ExternalUnavailable,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Returns the blocking phase, when this error is a rerun precondition
    /// failure.
    #[must_use]
    pub const fn blocking_phase(&self) -> Option<Phase> {
        match self {
            Self::RerunPrecondition(err) => Some(err.blocking_phase),
            _ => None,
        }
    }
}

impl From<TransitionError> for OrchestratorError {
    fn from(err: TransitionError) -> Self {
        Self::InvalidTransition(err)
    }
}

impl From<RerunError> for OrchestratorError {
    fn from(err: RerunError) -> Self {
        Self::RerunPrecondition(err)
    }
}

impl From<ControlPhaseError> for OrchestratorError {
    fn from(err: ControlPhaseError) -> Self {
        Self::NoControlPhase(err)
    }
}

impl From<CampaignStoreError> for OrchestratorError {
    fn from(err: CampaignStoreError) -> Self {
        match err {
            CampaignStoreError::NotFound(id) => Self::NotFound(format!("campaign {id} not found")),
            CampaignStoreError::Conflict(id) => {
                Self::Internal(format!("campaign {id} was concurrently modified"))
            }
            CampaignStoreError::Store(message) => Self::Internal(message),
        }
    }
}

impl From<EventStoreError> for OrchestratorError {
    fn from(err: EventStoreError) -> Self {
        match err {
            EventStoreError::Store(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigStoreError> for OrchestratorError {
    fn from(err: ConfigStoreError) -> Self {
        match err {
            ConfigStoreError::Contention(hash) => Self::ConfigUpdateContention(hash.to_string()),
            ConfigStoreError::Locked { hash, owner } => Self::ConfigLocked {
                hash: hash.to_string(),
                owner,
            },
            ConfigStoreError::OffsetRegression(hash) => {
                Self::Internal(format!("config hash {hash} offset moved backward"))
            }
            ConfigStoreError::Corrupted(hash) => Self::ConfigCorrupted(hash.to_string()),
            ConfigStoreError::Store(message) => Self::Internal(message),
        }
    }
}

impl From<GenerationError> for OrchestratorError {
    fn from(err: GenerationError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<AccessError> for OrchestratorError {
    fn from(err: AccessError) -> Self {
        // Deliberately collapsed to the same NOT_FOUND code regardless of
        // which access rule rejected the request.
        match err {
            AccessError::CampaignNotFound | AccessError::CampaignNotFoundOrAccessDenied => {
                Self::NotFound("campaign not found".to_string())
            }
            AccessError::AdminRequired => Self::NotFound("campaign not found".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contention_and_external_are_retryable() {
        assert!(OrchestratorError::ConfigUpdateContention("h".into()).is_retryable());
        assert!(OrchestratorError::ExternalUnavailable("dns".into()).is_retryable());
    }

    #[test]
    fn validation_is_not_retryable() {
        assert!(!OrchestratorError::Validation("bad".into()).is_retryable());
    }

    #[test]
    fn invalid_transition_maps_to_409() {
        assert_eq!(ErrorCode::InvalidPhaseTransition.http_status(), 409);
    }
}
