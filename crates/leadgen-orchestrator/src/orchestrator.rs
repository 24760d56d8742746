// crates/leadgen-orchestrator/src/orchestrator.rs
// ============================================================================
// Module: Campaign Orchestrator
// Description: Lifecycle operations over campaigns and their phases.
// Purpose: Give every transport (REST, CLI, worker completion callback) one
// place that enforces access control, drives the phase state machine, and
// keeps the campaign store and event stream consistent.
// Dependencies: leadgen-core, serde_json, time, uuid
// ============================================================================

//! ## Overview
//! [`CampaignOrchestrator`] is the seam every external surface calls through.
//! It holds no connection or transport details of its own — just the
//! trait-object collaborators (store, events, metrics, audit) injected at
//! construction through a dedicated config struct, keeping the orchestrator
//! itself free of setup concerns.

use std::sync::Arc;

use leadgen_core::AccessRequest;
use leadgen_core::Campaign;
use leadgen_core::CampaignAction;
use leadgen_core::CampaignId;
use leadgen_core::CampaignType;
use leadgen_core::ControlPhaseError;
use leadgen_core::EventType;
use leadgen_core::OrchestratorError;
use leadgen_core::OwnerId;
use leadgen_core::Phase;
use leadgen_core::PhaseParams;
use leadgen_core::PhaseStatus;
use leadgen_core::Timestamp;
use leadgen_core::Trigger;
use leadgen_core::TOTAL_PHASES;
use leadgen_core::check_rerun_precondition;
use leadgen_core::evaluate_access;
use leadgen_core::interfaces::AuditEvent;
use leadgen_core::interfaces::AuditSink;
use leadgen_core::interfaces::CampaignStore;
use leadgen_core::interfaces::EventSink;
use leadgen_core::interfaces::Metrics;
use leadgen_core::interfaces::MetricEvent;
use leadgen_core::interfaces::Outcome;
use leadgen_core::resolve_control_phase;
use leadgen_core::transition;
use time::OffsetDateTime;

use crate::metadata::CampaignMetadata;

/// Per-phase status snapshot returned by [`CampaignOrchestrator::get_progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseProgress {
    /// The phase this entry describes.
    pub phase: Phase,
    /// The phase's current status.
    pub status: PhaseStatus,
}

/// Aggregate campaign progress.
#[derive(Debug, Clone)]
pub struct CampaignProgress {
    /// Campaign-wide aggregate progress in `[0, 100]`.
    pub overall_progress: u8,
    /// Per-phase status, in pipeline order.
    pub phases: Vec<PhaseProgress>,
}

/// Collaborators injected into a [`CampaignOrchestrator`].
pub struct CampaignOrchestratorConfig {
    /// Campaign persistence backend.
    pub store: Arc<dyn CampaignStore>,
    /// Event stream sink.
    pub events: Arc<dyn EventSink>,
    /// Metrics sink.
    pub metrics: Arc<dyn Metrics>,
    /// Audit sink.
    pub audit: Arc<dyn AuditSink>,
}

/// Drives campaign and phase lifecycle operations.
#[derive(Clone)]
pub struct CampaignOrchestrator {
    store: Arc<dyn CampaignStore>,
    events: Arc<dyn EventSink>,
    metrics: Arc<dyn Metrics>,
    audit: Arc<dyn AuditSink>,
}

impl CampaignOrchestrator {
    /// Builds an orchestrator from its collaborators.
    #[must_use]
    pub fn new(config: CampaignOrchestratorConfig) -> Self {
        Self {
            store: config.store,
            events: config.events,
            metrics: config.metrics,
            audit: config.audit,
        }
    }

    fn now() -> Timestamp {
        Timestamp::new(OffsetDateTime::now_utc())
    }

    fn emit(&self, campaign_id: CampaignId, event_type: EventType, phase: Option<Phase>, payload: serde_json::Value) {
        if self.events.append(campaign_id, event_type, phase, payload).is_err() {
            self.metrics.record(MetricEvent {
                operation: "emit_event",
                outcome: Outcome::Error,
                latency: None,
            });
        }
    }

    fn record_audit(&self, campaign_id: CampaignId, operation: &'static str, actor: OwnerId, outcome: Outcome) {
        self.audit.record(AuditEvent {
            campaign_id,
            operation,
            actor: Some(actor.to_string()),
            outcome,
            timestamp: Self::now(),
        });
    }

    /// Loads a campaign and checks `action` against the access predicate
    ///, collapsing both "absent" and "access denied" into one
    /// [`OrchestratorError::NotFound`] for non-admin callers.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] on storage failure or access denial.
    pub fn load_authorized(
        &self,
        caller: OwnerId,
        has_admin_role: bool,
        id: CampaignId,
        action: CampaignAction,
    ) -> Result<Campaign, OrchestratorError> {
        let campaign = self.store.get_campaign(id)?;
        evaluate_access(
            AccessRequest {
                caller,
                action,
                has_admin_role,
            },
            campaign.as_ref().and_then(|found| found.owner),
        )?;
        campaign.ok_or_else(|| {
            OrchestratorError::Internal("access predicate allowed a missing campaign".to_string())
        })
    }

    /// Writes `metadata` back onto `campaign` and reflects its per-phase
    /// statuses onto the campaign's aggregate columns, then persists with
    /// optimistic concurrency.
    fn persist(&self, mut campaign: Campaign, metadata: &CampaignMetadata) -> Result<Campaign, OrchestratorError> {
        let statuses = metadata.all_statuses();
        campaign.metadata = metadata
            .clone()
            .into_value()
            .map_err(|err| OrchestratorError::Internal(err.to_string()))?;
        campaign.current_phase = resolve_control_phase(&statuses);
        campaign.phase_status = campaign
            .current_phase
            .map_or(PhaseStatus::NotStarted, |phase| metadata.status(phase));
        let completed = statuses
            .iter()
            .filter(|(_, status)| *status == PhaseStatus::Completed)
            .count();
        campaign.completed_phases = u32::try_from(completed).unwrap_or(TOTAL_PHASES);
        campaign.updated_at = Self::now();
        Ok(self.store.save_campaign(campaign)?)
    }

    fn resolve_control(metadata: &CampaignMetadata) -> Result<Phase, OrchestratorError> {
        resolve_control_phase(&metadata.all_statuses()).ok_or_else(|| {
            ControlPhaseError {
                code: "NO_CONTROL_PHASE",
                message: "no phase is currently active".to_string(),
            }
            .into()
        })
    }

    // ========================================================================
    // SECTION: Lifecycle Operations
    // ========================================================================

    /// Creates a campaign together with its phase-1 (generation)
    /// configuration in one write.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Validation`] if `generation` does not
    /// describe the generation phase, otherwise propagates storage errors.
    pub fn create_campaign(
        &self,
        caller: OwnerId,
        name: String,
        generation: PhaseParams,
        auto_advance: bool,
    ) -> Result<Campaign, OrchestratorError> {
        if generation.phase() != Phase::Generation {
            return Err(OrchestratorError::Validation(
                "initial campaign configuration must target the generation phase".to_string(),
            ));
        }
        let mut metadata = CampaignMetadata::default();
        let configured = transition(metadata.status(Phase::Generation), Trigger::Configure)?;
        metadata.set_status(Phase::Generation, configured);
        metadata.set_params(generation);

        let now = Self::now();
        let campaign = Campaign {
            id: CampaignId::generate(),
            name,
            owner: Some(caller),
            campaign_type: CampaignType::LeadGeneration,
            created_at: now,
            updated_at: now,
            current_phase: Some(Phase::Generation),
            phase_status: configured,
            total_phases: TOTAL_PHASES,
            completed_phases: 0,
            overall_progress: 0,
            started_at: None,
            completed_at: None,
            error_message: None,
            metadata: metadata
                .into_value()
                .map_err(|err| OrchestratorError::Internal(err.to_string()))?,
            auto_advance,
        };
        let created = self.store.create_campaign(campaign)?;
        self.emit(
            created.id,
            EventType::PhaseStateChanged,
            Some(Phase::Generation),
            serde_json::json!({"status": configured.label()}),
        );
        self.record_audit(created.id, "create_campaign", caller, Outcome::Ok);
        Ok(created)
    }

    /// Returns campaign details, enforcing read access.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] on access denial or storage failure.
    pub fn get_details(
        &self,
        caller: OwnerId,
        has_admin_role: bool,
        id: CampaignId,
    ) -> Result<Campaign, OrchestratorError> {
        self.load_authorized(caller, has_admin_role, id, CampaignAction::Read)
    }

    /// Lists campaigns, server-side filtered to `caller`'s own campaigns
    /// unless `has_admin_role`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] on storage failure.
    pub fn list_campaigns(
        &self,
        caller: OwnerId,
        has_admin_role: bool,
    ) -> Result<Vec<Campaign>, OrchestratorError> {
        let owner_filter = if has_admin_role { None } else { Some(caller) };
        Ok(self.store.list_campaigns(owner_filter)?)
    }

    /// Validates and records `params`, moving its phase toward `configured`.
    /// Configuration has no ordering precondition — a later phase may be
    /// configured while an earlier one is still running, so `auto_advance`
    /// can hand it straight to [`Self::start_phase`] the moment the earlier
    /// phase completes. Ordering is enforced at
    /// [`Self::start_phase`], not here.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidTransition`] when the phase is not
    /// in a configurable status, or an access/storage error.
    pub fn configure_phase(
        &self,
        caller: OwnerId,
        has_admin_role: bool,
        id: CampaignId,
        params: PhaseParams,
    ) -> Result<Campaign, OrchestratorError> {
        let campaign = self.load_authorized(caller, has_admin_role, id, CampaignAction::Write)?;
        let phase = params.phase();
        let mut metadata = CampaignMetadata::from_value(&campaign.metadata);
        let next = transition(metadata.status(phase), Trigger::Configure)?;
        metadata.set_status(phase, next);
        metadata.set_params(params);
        let campaign = self.persist(campaign, &metadata)?;
        self.emit(
            campaign.id,
            EventType::PhaseStateChanged,
            Some(phase),
            serde_json::json!({"status": next.label()}),
        );
        self.record_audit(campaign.id, "configure_phase", caller, Outcome::Ok);
        Ok(campaign)
    }

    /// Starts `phase`, dispatching a pending job for it.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Validation`] when the ordering or
    /// configuration precondition is unmet, otherwise an access/state-machine
    /// /storage error.
    pub fn start_phase(
        &self,
        caller: OwnerId,
        has_admin_role: bool,
        id: CampaignId,
        phase: Phase,
    ) -> Result<Campaign, OrchestratorError> {
        let campaign = self.load_authorized(caller, has_admin_role, id, CampaignAction::Write)?;
        let mut metadata = CampaignMetadata::from_value(&campaign.metadata);
        if !metadata.ordering_satisfied(phase) {
            return Err(OrchestratorError::Validation(format!(
                "{} is not yet reachable",
                phase.label()
            )));
        }
        if phase != Phase::Generation && metadata.params(phase).is_none() {
            return Err(OrchestratorError::Validation(format!(
                "{} has not been configured",
                phase.label()
            )));
        }
        let next = transition(metadata.status(phase), Trigger::Start)?;
        metadata.set_status(phase, next);
        let campaign = self.persist(campaign, &metadata)?;
        self.store.enqueue_job(campaign.id, phase)?;
        self.emit(
            campaign.id,
            EventType::PhaseStateChanged,
            Some(phase),
            serde_json::json!({"status": next.label()}),
        );
        self.metrics.record(MetricEvent {
            operation: "start_phase",
            outcome: Outcome::Ok,
            latency: None,
        });
        self.record_audit(campaign.id, "start_phase", caller, Outcome::Ok);
        Ok(campaign)
    }

    /// Pauses the current control phase.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NoControlPhase`] when no phase is active,
    /// otherwise an access/state-machine/storage error.
    pub fn pause(
        &self,
        caller: OwnerId,
        has_admin_role: bool,
        id: CampaignId,
    ) -> Result<Campaign, OrchestratorError> {
        let campaign = self.load_authorized(caller, has_admin_role, id, CampaignAction::Write)?;
        let mut metadata = CampaignMetadata::from_value(&campaign.metadata);
        let control = Self::resolve_control(&metadata)?;
        let next = transition(metadata.status(control), Trigger::Pause)?;
        metadata.set_status(control, next);
        let campaign = self.persist(campaign, &metadata)?;
        self.emit(
            campaign.id,
            EventType::PhaseStateChanged,
            Some(control),
            serde_json::json!({"status": next.label()}),
        );
        Ok(campaign)
    }

    /// Resumes the paused control phase, re-enqueuing a job so a worker
    /// continues it.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NoControlPhase`] when no phase is
    /// paused/active, otherwise an access/state-machine/storage error.
    pub fn resume(
        &self,
        caller: OwnerId,
        has_admin_role: bool,
        id: CampaignId,
    ) -> Result<Campaign, OrchestratorError> {
        let campaign = self.load_authorized(caller, has_admin_role, id, CampaignAction::Write)?;
        let mut metadata = CampaignMetadata::from_value(&campaign.metadata);
        let control = Self::resolve_control(&metadata)?;
        let next = transition(metadata.status(control), Trigger::Resume)?;
        metadata.set_status(control, next);
        let campaign = self.persist(campaign, &metadata)?;
        self.store.enqueue_job(campaign.id, control)?;
        self.emit(
            campaign.id,
            EventType::PhaseStateChanged,
            Some(control),
            serde_json::json!({"status": next.label()}),
        );
        Ok(campaign)
    }

    /// Cancels a campaign by failing its current control phase. There is no dedicated `cancel` state-machine trigger; this
    /// orchestrator resolves it onto the same `fail` transition a handler
    /// error would take, recorded as a user-initiated cancellation via
    /// `error_message`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NoControlPhase`] when no phase is active,
    /// otherwise an access/state-machine/storage error.
    pub fn cancel(
        &self,
        caller: OwnerId,
        has_admin_role: bool,
        id: CampaignId,
    ) -> Result<Campaign, OrchestratorError> {
        let mut campaign = self.load_authorized(caller, has_admin_role, id, CampaignAction::Write)?;
        let mut metadata = CampaignMetadata::from_value(&campaign.metadata);
        let control = Self::resolve_control(&metadata)?;
        let next = transition(metadata.status(control), Trigger::Fail)?;
        metadata.set_status(control, next);
        campaign.error_message = Some("cancelled by caller".to_string());
        let campaign = self.persist(campaign, &metadata)?;
        self.emit(campaign.id, EventType::CampaignCancelled, Some(control), serde_json::json!({}));
        self.record_audit(campaign.id, "cancel", caller, Outcome::Ok);
        Ok(campaign)
    }

    /// Restarts a completed phase, enforcing the no-other-active-phase
    /// precondition.
    ///
    /// Progress counters owned by the generation/DNS/HTTP stores (generated
    /// domain rows, result rows) are not cleared here; the phase handler
    /// that processes the resulting job is responsible for treating a rerun
    /// as a clean slate for its own counters.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::RerunPrecondition`] when another phase is
    /// active, otherwise an access/state-machine/storage error.
    pub fn rerun_phase(
        &self,
        caller: OwnerId,
        has_admin_role: bool,
        id: CampaignId,
        phase: Phase,
    ) -> Result<Campaign, OrchestratorError> {
        let campaign = self.load_authorized(caller, has_admin_role, id, CampaignAction::Write)?;
        let mut metadata = CampaignMetadata::from_value(&campaign.metadata);
        check_rerun_precondition(phase, &metadata.all_statuses())?;
        let next = transition(metadata.status(phase), Trigger::Rerun)?;
        metadata.set_status(phase, next);
        let campaign = self.persist(campaign, &metadata)?;
        self.store.enqueue_job(campaign.id, phase)?;
        self.emit(
            campaign.id,
            EventType::PhaseStateChanged,
            Some(phase),
            serde_json::json!({"status": next.label()}),
        );
        self.metrics.record(MetricEvent {
            operation: "rerun_phase",
            outcome: Outcome::Ok,
            latency: None,
        });
        Ok(campaign)
    }

    /// Restarts a failed phase.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidTransition`] unless `phase` is
    /// currently `failed`, otherwise an access/storage error.
    pub fn retry_phase(
        &self,
        caller: OwnerId,
        has_admin_role: bool,
        id: CampaignId,
        phase: Phase,
    ) -> Result<Campaign, OrchestratorError> {
        let campaign = self.load_authorized(caller, has_admin_role, id, CampaignAction::Write)?;
        let mut metadata = CampaignMetadata::from_value(&campaign.metadata);
        let next = transition(metadata.status(phase), Trigger::Retry)?;
        metadata.set_status(phase, next);
        let campaign = self.persist(campaign, &metadata)?;
        self.store.enqueue_job(campaign.id, phase)?;
        self.emit(
            campaign.id,
            EventType::PhaseStateChanged,
            Some(phase),
            serde_json::json!({"status": next.label()}),
        );
        self.metrics.record(MetricEvent {
            operation: "retry_phase",
            outcome: Outcome::Ok,
            latency: None,
        });
        Ok(campaign)
    }

    /// Returns aggregate and per-phase progress.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] on access denial or storage failure.
    pub fn get_progress(
        &self,
        caller: OwnerId,
        has_admin_role: bool,
        id: CampaignId,
    ) -> Result<CampaignProgress, OrchestratorError> {
        let campaign = self.load_authorized(caller, has_admin_role, id, CampaignAction::Read)?;
        let metadata = CampaignMetadata::from_value(&campaign.metadata);
        Ok(CampaignProgress {
            overall_progress: campaign.overall_progress,
            phases: metadata
                .all_statuses()
                .into_iter()
                .map(|(phase, status)| PhaseProgress {
                    phase,
                    status,
                })
                .collect(),
        })
    }

    /// Called by the worker pool when `phase`'s handler reports completion.
    /// Marks `phase` completed, promotes a not-yet-configured next phase to
    /// `ready`, and — if `auto_advance` is set and the next phase is already
    /// `ready` or `configured` — starts it automatically.
    ///
    /// This is an internal, trusted entry point; it does not consult the
    /// access predicate, matching the worker pool's own trusted-caller
    /// relationship with the campaign store.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the campaign is missing or storage
    /// fails.
    pub fn handle_completion(&self, id: CampaignId, phase: Phase) -> Result<(), OrchestratorError> {
        let campaign = self
            .store
            .get_campaign(id)?
            .ok_or_else(|| OrchestratorError::NotFound(format!("campaign {id} not found")))?;
        let mut metadata = CampaignMetadata::from_value(&campaign.metadata);
        metadata.set_status(phase, PhaseStatus::Completed);

        let next_phase = Phase::ORDER.get(phase.index() + 1).copied();
        if let Some(next) = next_phase {
            if metadata.status(next) == PhaseStatus::NotStarted && metadata.ordering_satisfied(next) {
                metadata.set_status(next, PhaseStatus::Ready);
            }
        }

        let auto_advance = campaign.auto_advance;
        let mut campaign = self.persist(campaign, &metadata)?;

        if next_phase.is_none() {
            campaign.completed_at = Some(Self::now());
            let campaign = self.store.save_campaign(campaign)?;
            self.emit(campaign.id, EventType::CampaignCompleted, None, serde_json::json!({}));
            self.emit(
                campaign.id,
                EventType::PhaseStateChanged,
                Some(phase),
                serde_json::json!({"status": "completed"}),
            );
            return Ok(());
        }

        self.emit(
            campaign.id,
            EventType::PhaseStateChanged,
            Some(phase),
            serde_json::json!({"status": "completed"}),
        );

        if let Some(next) = next_phase {
            let ready_to_start = matches!(metadata.status(next), PhaseStatus::Ready | PhaseStatus::Configured)
                && (next == Phase::Generation || metadata.params(next).is_some());
            if auto_advance && ready_to_start {
                let started = transition(metadata.status(next), Trigger::Start)?;
                metadata.set_status(next, started);
                let campaign = self.persist(campaign, &metadata)?;
                self.store.enqueue_job(campaign.id, next)?;
                self.emit(
                    campaign.id,
                    EventType::PhaseStateChanged,
                    Some(next),
                    serde_json::json!({"status": started.label()}),
                );
            }
        }
        Ok(())
    }

    /// Deletes campaigns and their child records, cascading. Each id is access-checked individually before any
    /// deletion is issued.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] on access denial or storage failure.
    pub fn bulk_delete(
        &self,
        caller: OwnerId,
        has_admin_role: bool,
        ids: &[CampaignId],
    ) -> Result<(), OrchestratorError> {
        for &id in ids {
            self.load_authorized(caller, has_admin_role, id, CampaignAction::Write)?;
        }
        self.store.bulk_delete(ids)?;
        for &id in ids {
            self.record_audit(id, "bulk_delete", caller, Outcome::Ok);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use leadgen_core::DomainPattern;
    use leadgen_core::PatternType;
    use leadgen_core::interfaces::NoopAuditSink;
    use leadgen_core::interfaces::NoopMetrics;
    use leadgen_events::SqliteEventStore;
    use leadgen_store::SqliteCampaignStore;
    use uuid::Uuid;

    use super::*;

    fn harness() -> (CampaignOrchestrator, OwnerId) {
        let store = Arc::new(SqliteCampaignStore::open_in_memory().expect("store"));
        let events = Arc::new(SqliteEventStore::open_in_memory().expect("events"));
        let orchestrator = CampaignOrchestrator::new(CampaignOrchestratorConfig {
            store,
            events,
            metrics: Arc::new(NoopMetrics),
            audit: Arc::new(NoopAuditSink),
        });
        (orchestrator, OwnerId::new(Uuid::from_u128(1)))
    }

    fn generation_params() -> PhaseParams {
        PhaseParams::Generation {
            pattern: DomainPattern {
                pattern_type: PatternType::Suffix,
                variable_length: 3,
                character_set: "abc".chars().collect(),
                constant_string: "shop".to_string(),
                tld: "com".to_string(),
            },
            target_count: 10,
        }
    }

    #[test]
    fn create_campaign_starts_generation_configured() {
        let (orchestrator, owner) = harness();
        let campaign = orchestrator
            .create_campaign(owner, "q3-leads".to_string(), generation_params(), true)
            .expect("create");
        assert_eq!(campaign.current_phase, Some(Phase::Generation));
        assert_eq!(campaign.phase_status, PhaseStatus::Configured);
    }

    #[test]
    fn non_owner_gets_not_found_on_read() {
        let (orchestrator, owner) = harness();
        let campaign = orchestrator
            .create_campaign(owner, "q3-leads".to_string(), generation_params(), false)
            .expect("create");
        let stranger = OwnerId::new(Uuid::from_u128(2));
        let err = orchestrator
            .get_details(stranger, false, campaign.id)
            .expect_err("denied");
        assert!(matches!(err, OrchestratorError::NotFound(_)));
    }

    #[test]
    fn start_then_pause_then_resume_round_trips() {
        let (orchestrator, owner) = harness();
        let campaign = orchestrator
            .create_campaign(owner, "q3-leads".to_string(), generation_params(), false)
            .expect("create");
        let campaign = orchestrator
            .start_phase(owner, false, campaign.id, Phase::Generation)
            .expect("start");
        assert_eq!(campaign.phase_status, PhaseStatus::InProgress);

        let campaign = orchestrator.pause(owner, false, campaign.id).expect("pause");
        assert_eq!(campaign.phase_status, PhaseStatus::Paused);
        assert_eq!(campaign.current_phase, Some(Phase::Generation));

        let campaign = orchestrator.resume(owner, false, campaign.id).expect("resume");
        assert_eq!(campaign.phase_status, PhaseStatus::InProgress);
    }

    #[test]
    fn rerun_blocked_while_another_phase_active() {
        let (orchestrator, owner) = harness();
        let campaign = orchestrator
            .create_campaign(owner, "q3-leads".to_string(), generation_params(), false)
            .expect("create");
        orchestrator
            .start_phase(owner, false, campaign.id, Phase::Generation)
            .expect("start");
        orchestrator
            .configure_phase(
                owner,
                false,
                campaign.id,
                PhaseParams::Dns {
                    personas: vec!["default".to_string()],
                    max_attempts: 3,
                },
            )
            .expect("pre-configure dns");
        orchestrator
            .handle_completion(campaign.id, Phase::Generation)
            .expect("complete generation");
        orchestrator
            .start_phase(owner, false, campaign.id, Phase::Dns)
            .expect("start dns");
        let err = orchestrator
            .rerun_phase(owner, false, campaign.id, Phase::Generation)
            .expect_err("blocked");
        assert!(matches!(err, OrchestratorError::RerunPrecondition(_)));
    }

    #[test]
    fn configure_phase_has_no_ordering_precondition() {
        let (orchestrator, owner) = harness();
        let campaign = orchestrator
            .create_campaign(owner, "q3-leads".to_string(), generation_params(), false)
            .expect("create");
        let campaign = orchestrator
            .configure_phase(
                owner,
                false,
                campaign.id,
                PhaseParams::Dns {
                    personas: vec!["default".to_string()],
                    max_attempts: 3,
                },
            )
            .expect("dns may be pre-configured while generation has not run yet");
        let metadata = CampaignMetadata::from_value(&campaign.metadata);
        assert_eq!(metadata.status(Phase::Dns), PhaseStatus::Configured);
    }

    #[test]
    fn start_phase_rejects_out_of_order_phase() {
        let (orchestrator, owner) = harness();
        let campaign = orchestrator
            .create_campaign(owner, "q3-leads".to_string(), generation_params(), false)
            .expect("create");
        orchestrator
            .configure_phase(
                owner,
                false,
                campaign.id,
                PhaseParams::Dns {
                    personas: vec!["default".to_string()],
                    max_attempts: 3,
                },
            )
            .expect("pre-configure dns");
        let err = orchestrator
            .start_phase(owner, false, campaign.id, Phase::Dns)
            .expect_err("generation has not completed yet");
        assert!(matches!(err, OrchestratorError::Validation(_)));
    }

    #[test]
    fn handle_completion_auto_starts_preconfigured_next_phase() {
        let (orchestrator, owner) = harness();
        let campaign = orchestrator
            .create_campaign(owner, "q3-leads".to_string(), generation_params(), true)
            .expect("create");
        orchestrator
            .start_phase(owner, false, campaign.id, Phase::Generation)
            .expect("start");
        orchestrator
            .configure_phase(
                owner,
                false,
                campaign.id,
                PhaseParams::Dns {
                    personas: vec!["default".to_string()],
                    max_attempts: 3,
                },
            )
            .expect("pre-configure dns while generation runs");
        orchestrator
            .handle_completion(campaign.id, Phase::Generation)
            .expect("complete generation");
        let progress = orchestrator
            .get_progress(owner, false, campaign.id)
            .expect("progress");
        assert_eq!(progress.phases[1].status, PhaseStatus::InProgress);
    }

    #[test]
    fn handle_completion_marks_phase_completed_and_promotes_next() {
        let (orchestrator, owner) = harness();
        let campaign = orchestrator
            .create_campaign(owner, "q3-leads".to_string(), generation_params(), false)
            .expect("create");
        orchestrator
            .start_phase(owner, false, campaign.id, Phase::Generation)
            .expect("start");
        orchestrator
            .handle_completion(campaign.id, Phase::Generation)
            .expect("complete");
        let progress = orchestrator
            .get_progress(owner, false, campaign.id)
            .expect("progress");
        assert_eq!(progress.phases[0].status, PhaseStatus::Completed);
        assert_eq!(progress.phases[1].status, PhaseStatus::Ready);
    }

    #[test]
    fn bulk_delete_removes_campaign() {
        let (orchestrator, owner) = harness();
        let campaign = orchestrator
            .create_campaign(owner, "q3-leads".to_string(), generation_params(), false)
            .expect("create");
        orchestrator
            .bulk_delete(owner, false, &[campaign.id])
            .expect("delete");
        assert!(
            orchestrator
                .get_details(owner, false, campaign.id)
                .is_err()
        );
    }
}
