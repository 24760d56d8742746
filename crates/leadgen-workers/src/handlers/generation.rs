// crates/leadgen-workers/src/handlers/generation.rs
// ============================================================================
// Module: Generation Phase Handler
// Description: Streams the next batch of a campaign's domain pattern.
// Purpose: Advance the per-campaign cursor,
// bump the shared high-water mark, and complete the phase when the target
// or the pattern's combination space is exhausted.
// Dependencies: leadgen-core, leadgen-config, leadgen-orchestrator, time
// ============================================================================

use std::time::Duration;

use leadgen_core::CampaignId;
use leadgen_core::EventType;
use leadgen_core::OrchestratorError;
use leadgen_core::Phase;
use leadgen_core::PhaseParams;
use leadgen_core::PhaseStatus;
use leadgen_core::Timestamp;
use leadgen_core::Trigger;
use leadgen_core::config_hash;
use leadgen_core::interfaces::ConfigMutator;
use leadgen_core::interfaces::GeneratedDomain;
use leadgen_core::interfaces::LockType;
use leadgen_core::interfaces::VersionedConfigRecord;
use leadgen_core::transition;
use leadgen_orchestrator::CampaignMetadata;
use time::OffsetDateTime;

use super::BatchOutcome;
use super::PhaseHandler;
use crate::collaborators::HandlerError;
use crate::collaborators::WorkerCollaborators;

/// Advances the generation phase by one batch.
pub struct GenerationHandler;

impl PhaseHandler for GenerationHandler {
    fn process(
        &self,
        collaborators: &WorkerCollaborators,
        worker_id: &str,
        campaign_id: CampaignId,
        batch_size: usize,
    ) -> Result<BatchOutcome, HandlerError> {
        let campaign = collaborators
            .store
            .get_campaign(campaign_id)?
            .ok_or_else(|| OrchestratorError::NotFound(format!("campaign {campaign_id} not found")))?;
        let mut metadata = CampaignMetadata::from_value(&campaign.metadata);

        let Some(PhaseParams::Generation { pattern, target_count }) =
            metadata.params(Phase::Generation).cloned()
        else {
            return Err(OrchestratorError::Validation(
                "generation phase has no pattern/target_count configured".to_string(),
            ));
        };

        let current_status = metadata.status(Phase::Generation);
        if matches!(current_status, PhaseStatus::Ready | PhaseStatus::Configured) {
            let started = transition(current_status, Trigger::Start)?;
            metadata.set_status(Phase::Generation, started);
        }

        let current_offset = metadata.generation_offset();
        let processed_so_far = collaborators.store.count_generated_domains(campaign_id)?;
        let total = pattern.total_combinations()?;

        let remaining_by_target = u128::from(target_count.saturating_sub(processed_so_far));
        let remaining_by_space = total.saturating_sub(current_offset);
        let remaining = remaining_by_target.min(remaining_by_space).min(batch_size as u128);
        let remaining = usize::try_from(remaining).unwrap_or(batch_size);

        let (domains, next_offset) = pattern.generate_batch(current_offset, remaining)?;

        let now = Timestamp::new(OffsetDateTime::now_utc());
        let generated: Vec<GeneratedDomain> = domains
            .iter()
            .enumerate()
            .map(|(index, domain_name)| GeneratedDomain {
                campaign_id,
                offset_index: current_offset + index as u128,
                domain_name: domain_name.clone(),
                generated_at: now,
            })
            .collect();
        collaborators.store.insert_generated_domains(&generated)?;

        advance_shared_offset(collaborators, worker_id, &pattern, next_offset)?;

        metadata.set_generation_offset(next_offset);
        let processed = processed_so_far + domains.len() as u64;
        let batch_done = processed >= target_count || next_offset >= total;
        if batch_done {
            metadata.set_status(Phase::Generation, PhaseStatus::Completed);
        }

        let mut campaign = campaign;
        campaign.metadata = metadata
            .into_value()
            .map_err(|err| OrchestratorError::Internal(err.to_string()))?;
        collaborators.store.save_campaign(campaign)?;

        let pct = if target_count == 0 {
            100
        } else {
            u8::try_from((processed * 100 / target_count.max(1)).min(100)).unwrap_or(100)
        };
        collaborators
            .store
            .update_campaign_progress(campaign_id, processed, target_count, pct, false)?;

        for domain_name in &domains {
            collaborators.emit(
                campaign_id,
                EventType::DomainGenerated,
                Some(Phase::Generation),
                serde_json::json!({ "domain_name": domain_name }),
            );
        }
        collaborators.emit(
            campaign_id,
            EventType::PhaseProgress,
            Some(Phase::Generation),
            serde_json::json!({ "processed": processed, "target": target_count, "pct": pct }),
        );

        if batch_done {
            collaborators.orchestrator.handle_completion(campaign_id, Phase::Generation)?;
        }

        Ok(BatchOutcome {
            batch_done,
            processed_count: domains.len() as u64,
        })
    }
}

/// Bumps the pattern's process-wide `last_offset` high-water mark via the
/// versioned config store's CAS retry loop, never moving it backward (spec
/// §4.G.1 step 5, §4.B invariant 3).
fn advance_shared_offset(
    collaborators: &WorkerCollaborators,
    worker_id: &str,
    pattern: &leadgen_core::DomainPattern,
    next_offset: u128,
) -> Result<(), HandlerError> {
    let hash = config_hash(pattern).map_err(|err| OrchestratorError::Internal(err.to_string()))?;
    let details = serde_json::to_value(pattern).map_err(|err| OrchestratorError::Internal(err.to_string()))?;
    let lease = collaborators.config_store.acquire_lock(
        &hash,
        LockType::Exclusive,
        worker_id,
        Duration::from_millis(collaborators.config.config_lease_ttl_ms),
    )?;
    let mutator: ConfigMutator = Box::new(move |existing| {
        let last_offset = existing.map_or(next_offset, |record| record.last_offset.max(next_offset));
        Ok(VersionedConfigRecord {
            config_hash: hash.clone(),
            last_offset,
            config_details: details.clone(),
            version: existing.map_or(0, |record| record.version),
        })
    });
    let result = collaborators.config_store.update_with_retry(
        &hash,
        worker_id,
        mutator,
        collaborators.config.config_cas_max_retries,
    );
    let _ = collaborators.config_store.release_lock(&lease.id, worker_id);
    result.map(|_| ())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use leadgen_core::Campaign;
    use leadgen_core::CampaignType;
    use leadgen_core::DomainPattern;
    use leadgen_core::PatternType;
    use leadgen_core::interfaces::CampaignStore;
    use leadgen_config::SqliteConfigStore;
    use leadgen_config::WorkerConfig;
    use leadgen_events::SqliteEventStore;
    use leadgen_orchestrator::CampaignOrchestrator;
    use leadgen_orchestrator::CampaignOrchestratorConfig;
    use leadgen_store::SqliteCampaignStore;
    use std::sync::Arc;

    use super::*;
    use crate::testing::StubDnsValidator;
    use crate::testing::StubHttpValidator;

    fn collaborators() -> WorkerCollaborators {
        let store: Arc<dyn CampaignStore> = Arc::new(SqliteCampaignStore::open_in_memory().expect("campaign store"));
        let config_store = Arc::new(SqliteConfigStore::open_in_memory().expect("config store"));
        let events = Arc::new(SqliteEventStore::open_in_memory().expect("event store"));
        let orchestrator = CampaignOrchestrator::new(CampaignOrchestratorConfig {
            store: Arc::clone(&store),
            events: events.clone(),
            metrics: Arc::new(leadgen_core::interfaces::NoopMetrics),
            audit: Arc::new(leadgen_core::interfaces::NoopAuditSink),
        });
        WorkerCollaborators {
            store,
            config_store,
            events,
            metrics: Arc::new(leadgen_core::interfaces::NoopMetrics),
            dns_validator: Arc::new(StubDnsValidator::always_resolved()),
            http_validator: Arc::new(StubHttpValidator::always_empty()),
            shuffler: Arc::new(leadgen_core::interfaces::IdentityShuffler),
            orchestrator,
            config: WorkerConfig::default(),
        }
    }

    fn sample_pattern() -> DomainPattern {
        DomainPattern {
            pattern_type: PatternType::Suffix,
            variable_length: 2,
            character_set: vec!['a', 'b'],
            constant_string: "lead".to_string(),
            tld: "com".to_string(),
        }
    }

    fn seed_campaign(collaborators: &WorkerCollaborators, target_count: u64) -> CampaignId {
        let now = Timestamp::new(OffsetDateTime::now_utc());
        let mut metadata = CampaignMetadata::default();
        metadata.set_params(PhaseParams::Generation {
            pattern: sample_pattern(),
            target_count,
        });
        let campaign = Campaign {
            id: CampaignId::generate(),
            name: "test".to_string(),
            owner: None,
            campaign_type: CampaignType::LeadGeneration,
            created_at: now,
            updated_at: now,
            current_phase: Some(Phase::Generation),
            phase_status: PhaseStatus::Ready,
            total_phases: leadgen_core::TOTAL_PHASES,
            completed_phases: 0,
            overall_progress: 0,
            started_at: None,
            completed_at: None,
            error_message: None,
            metadata: metadata.into_value().expect("serialize"),
            auto_advance: false,
        };
        let id = campaign.id;
        collaborators.store.create_campaign(campaign).expect("create");
        id
    }

    #[test]
    fn completes_when_target_reached() {
        let collaborators = collaborators();
        let id = seed_campaign(&collaborators, 3);
        let outcome = GenerationHandler
            .process(&collaborators, "worker-1", id, 10)
            .expect("process");
        assert!(outcome.batch_done);
        assert_eq!(outcome.processed_count, 3);
        assert_eq!(collaborators.store.count_generated_domains(id).expect("count"), 3);
    }

    #[test]
    fn stops_short_of_target_when_batch_size_limits_it() {
        let collaborators = collaborators();
        let id = seed_campaign(&collaborators, 4);
        let outcome = GenerationHandler
            .process(&collaborators, "worker-1", id, 2)
            .expect("process");
        assert!(!outcome.batch_done);
        assert_eq!(outcome.processed_count, 2);
    }

    #[test]
    fn rejects_campaign_missing_generation_params() {
        let collaborators = collaborators();
        let now = Timestamp::new(OffsetDateTime::now_utc());
        let campaign = Campaign {
            id: CampaignId::generate(),
            name: "test".to_string(),
            owner: None,
            campaign_type: CampaignType::LeadGeneration,
            created_at: now,
            updated_at: now,
            current_phase: Some(Phase::Generation),
            phase_status: PhaseStatus::Ready,
            total_phases: leadgen_core::TOTAL_PHASES,
            completed_phases: 0,
            overall_progress: 0,
            started_at: None,
            completed_at: None,
            error_message: None,
            metadata: serde_json::json!({}),
            auto_advance: false,
        };
        let id = campaign.id;
        collaborators.store.create_campaign(campaign).expect("create");
        let err = GenerationHandler.process(&collaborators, "worker-1", id, 10).expect_err("should fail");
        assert!(!err.is_retryable());
    }
}
