// crates/leadgen-workers/src/handlers/dns.rs
// ============================================================================
// Module: DNS Validation Phase Handler
// Description: Resolves the next slice of generated domains.
// Purpose: Probe domains lacking a terminal DNS
// result, retry transient probe failures up to the configured persona
// attempt budget, and complete the phase once every generated domain has a
// terminal result.
// Dependencies: leadgen-core, leadgen-orchestrator
// ============================================================================

use leadgen_core::CampaignId;
use leadgen_core::EventType;
use leadgen_core::OrchestratorError;
use leadgen_core::Phase;
use leadgen_core::PhaseParams;
use leadgen_core::PhaseStatus;
use leadgen_core::Trigger;
use leadgen_core::interfaces::DnsResult;
use leadgen_core::interfaces::DnsValidationStatus;
use leadgen_core::transition;
use leadgen_orchestrator::CampaignMetadata;

use super::BatchOutcome;
use super::PhaseHandler;
use crate::collaborators::HandlerError;
use crate::collaborators::WorkerCollaborators;

/// Advances the DNS validation phase by one batch.
pub struct DnsHandler;

impl PhaseHandler for DnsHandler {
    fn process(
        &self,
        collaborators: &WorkerCollaborators,
        _worker_id: &str,
        campaign_id: CampaignId,
        batch_size: usize,
    ) -> Result<BatchOutcome, HandlerError> {
        let campaign = collaborators
            .store
            .get_campaign(campaign_id)?
            .ok_or_else(|| OrchestratorError::NotFound(format!("campaign {campaign_id} not found")))?;
        let mut metadata = CampaignMetadata::from_value(&campaign.metadata);

        let Some(PhaseParams::Dns { personas, max_attempts }) = metadata.params(Phase::Dns).cloned() else {
            return Err(OrchestratorError::Validation(
                "dns phase has no personas/max_attempts configured".to_string(),
            ));
        };

        let current_status = metadata.status(Phase::Dns);
        if matches!(current_status, PhaseStatus::Ready | PhaseStatus::Configured) {
            let started = transition(current_status, Trigger::Start)?;
            metadata.set_status(Phase::Dns, started);
        }

        let candidates = collaborators.store.domains_needing_dns(campaign_id, batch_size)?;
        let domain_names: Vec<String> = candidates.iter().map(|domain| domain.domain_name.clone()).collect();
        let visitation_order = collaborators.shuffler.shuffle(domain_names);

        let mut processed = 0u64;
        for (index, domain_name) in visitation_order.iter().enumerate() {
            let persona = pick_persona(&personas, index);
            let (status, attempts_used, persona_used) = probe_with_retries(collaborators, domain_name, persona.as_deref(), max_attempts);
            collaborators.store.upsert_dns_result(DnsResult {
                campaign_id,
                domain_name: domain_name.clone(),
                status,
                attempts: attempts_used,
                persona_id: persona_used,
            })?;
            processed += 1;
        }

        let total = collaborators.store.count_generated_domains(campaign_id)?;
        let terminal = collaborators.store.count_dns_terminal(campaign_id)?;
        let batch_done = total > 0 && terminal >= total;
        if batch_done {
            metadata.set_status(Phase::Dns, PhaseStatus::Completed);
        }

        let mut campaign = campaign;
        campaign.metadata = metadata
            .into_value()
            .map_err(|err| OrchestratorError::Internal(err.to_string()))?;
        collaborators.store.save_campaign(campaign)?;

        let pct = progress_percent(terminal, total);
        collaborators.store.update_campaign_progress(campaign_id, terminal, total, pct, false)?;
        collaborators.emit(
            campaign_id,
            EventType::PhaseProgress,
            Some(Phase::Dns),
            serde_json::json!({ "processed": terminal, "total": total, "pct": pct }),
        );

        if batch_done {
            collaborators.orchestrator.handle_completion(campaign_id, Phase::Dns)?;
        }

        Ok(BatchOutcome { batch_done, processed_count: processed })
    }
}

fn pick_persona(personas: &[String], index: usize) -> Option<String> {
    if personas.is_empty() {
        return None;
    }
    Some(personas[index % personas.len()].clone())
}

/// Retries `probe` up to `max_attempts` times, returning the last outcome
/// and the number of attempts actually made. A non-pending status (or a
/// transient probe error exhausting the budget) ends the loop.
fn probe_with_retries(
    collaborators: &WorkerCollaborators,
    domain_name: &str,
    persona: Option<&str>,
    max_attempts: u32,
) -> (DnsValidationStatus, u32, Option<String>) {
    let mut last_status = DnsValidationStatus::Error;
    let mut last_persona = persona.map(str::to_string);
    let attempts_budget = max_attempts.max(1);
    for attempt in 1..=attempts_budget {
        match collaborators.dns_validator.probe(domain_name, persona) {
            Ok(outcome) => {
                last_status = outcome.status;
                last_persona = outcome.persona_id.or_else(|| persona.map(str::to_string));
                if !matches!(last_status, DnsValidationStatus::Pending) {
                    return (last_status, attempt, last_persona);
                }
            }
            Err(_) => {
                last_status = DnsValidationStatus::Error;
            }
        }
    }
    (last_status, attempts_budget, last_persona)
}

fn progress_percent(processed: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from((processed * 100 / total).min(100)).unwrap_or(100)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use std::sync::Arc;

    use leadgen_core::Campaign;
    use leadgen_core::CampaignType;
    use leadgen_core::Timestamp;
    use leadgen_core::interfaces::CampaignStore;
    use leadgen_core::interfaces::GeneratedDomain;
    use leadgen_config::SqliteConfigStore;
    use leadgen_config::WorkerConfig;
    use leadgen_events::SqliteEventStore;
    use leadgen_orchestrator::CampaignOrchestrator;
    use leadgen_orchestrator::CampaignOrchestratorConfig;
    use leadgen_store::SqliteCampaignStore;
    use time::OffsetDateTime;

    use super::*;
    use crate::testing::StubDnsValidator;
    use crate::testing::StubHttpValidator;

    fn collaborators(dns_validator: StubDnsValidator) -> WorkerCollaborators {
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
            dns_validator: Arc::new(dns_validator),
            http_validator: Arc::new(StubHttpValidator::always_empty()),
            shuffler: Arc::new(leadgen_core::interfaces::IdentityShuffler),
            orchestrator,
            config: WorkerConfig::default(),
        }
    }

    fn seed_campaign(collaborators: &WorkerCollaborators, domain_count: u64) -> CampaignId {
        let now = Timestamp::new(OffsetDateTime::now_utc());
        let mut metadata = CampaignMetadata::default();
        metadata.set_status(Phase::Generation, PhaseStatus::Completed);
        metadata.set_status(Phase::Dns, PhaseStatus::Ready);
        metadata.set_params(PhaseParams::Dns {
            personas: vec!["default".to_string()],
            max_attempts: 3,
        });
        let campaign = Campaign {
            id: CampaignId::generate(),
            name: "test".to_string(),
            owner: None,
            campaign_type: CampaignType::LeadGeneration,
            created_at: now,
            updated_at: now,
            current_phase: Some(Phase::Dns),
            phase_status: PhaseStatus::Ready,
            total_phases: leadgen_core::TOTAL_PHASES,
            completed_phases: 1,
            overall_progress: 0,
            started_at: None,
            completed_at: None,
            error_message: None,
            metadata: metadata.into_value().expect("serialize"),
            auto_advance: false,
        };
        let id = campaign.id;
        collaborators.store.create_campaign(campaign).expect("create");
        let domains: Vec<GeneratedDomain> = (0..domain_count)
            .map(|index| GeneratedDomain {
                campaign_id: id,
                offset_index: u128::from(index),
                domain_name: format!("lead{index}.com"),
                generated_at: now,
            })
            .collect();
        collaborators.store.insert_generated_domains(&domains).expect("insert domains");
        id
    }

    #[test]
    fn completes_when_every_domain_resolved() {
        let collaborators = collaborators(StubDnsValidator::always_resolved());
        let id = seed_campaign(&collaborators, 3);
        let outcome = DnsHandler.process(&collaborators, "worker-1", id, 10).expect("process");
        assert!(outcome.batch_done);
        assert_eq!(outcome.processed_count, 3);
        assert_eq!(collaborators.store.count_dns_terminal(id).expect("count"), 3);
    }

    #[test]
    fn unresolved_domains_still_count_as_terminal() {
        let collaborators = collaborators(StubDnsValidator::with_unresolved(["lead1.com".to_string()]));
        let id = seed_campaign(&collaborators, 2);
        let outcome = DnsHandler.process(&collaborators, "worker-1", id, 10).expect("process");
        assert!(outcome.batch_done);
        assert_eq!(collaborators.store.count_dns_terminal(id).expect("count"), 2);
    }

    #[test]
    fn batch_size_limits_progress_in_one_call() {
        let collaborators = collaborators(StubDnsValidator::always_resolved());
        let id = seed_campaign(&collaborators, 5);
        let outcome = DnsHandler.process(&collaborators, "worker-1", id, 2).expect("process");
        assert!(!outcome.batch_done);
        assert_eq!(outcome.processed_count, 2);
    }
}
