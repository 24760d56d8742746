// crates/leadgen-workers/src/handlers/http.rs
// ============================================================================
// Module: HTTP Keyword Validation Phase Handler
// Description: Fetches and keyword-matches the next slice of resolved
// domains.
// Purpose: Never re-fetch a domain with a terminal
// success result, and complete the phase once every DNS-resolved domain has
// a terminal HTTP result.
// Dependencies: leadgen-core, leadgen-orchestrator
// ============================================================================

use leadgen_core::CampaignId;
use leadgen_core::EventType;
use leadgen_core::OrchestratorError;
use leadgen_core::Phase;
use leadgen_core::PhaseParams;
use leadgen_core::PhaseStatus;
use leadgen_core::Trigger;
use leadgen_core::interfaces::DnsValidationStatus;
use leadgen_core::interfaces::HttpResult;
use leadgen_core::transition;
use leadgen_orchestrator::CampaignMetadata;

use super::BatchOutcome;
use super::PhaseHandler;
use crate::collaborators::HandlerError;
use crate::collaborators::WorkerCollaborators;

/// Advances the HTTP keyword validation phase by one batch.
pub struct HttpHandler;

impl PhaseHandler for HttpHandler {
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

        let Some(PhaseParams::Http {
            personas,
            keyword_sets,
            adhoc_keywords,
        }) = metadata.params(Phase::Http).cloned()
        else {
            return Err(OrchestratorError::Validation(
                "http phase has no personas/keyword_sets configured".to_string(),
            ));
        };

        let current_status = metadata.status(Phase::Http);
        if matches!(current_status, PhaseStatus::Ready | PhaseStatus::Configured) {
            let started = transition(current_status, Trigger::Start)?;
            metadata.set_status(Phase::Http, started);
        }

        let candidates = collaborators.store.domains_needing_http(campaign_id, batch_size)?;
        let visitation_order = collaborators.shuffler.shuffle(candidates);

        let mut processed = 0u64;
        for (index, domain_name) in visitation_order.iter().enumerate() {
            let persona = pick_persona(&personas, index);
            let outcome = collaborators
                .http_validator
                .fetch_and_match(domain_name, persona.as_deref(), &keyword_sets, &adhoc_keywords);
            let result = match outcome {
                Ok(probe) => HttpResult {
                    campaign_id,
                    domain_name: domain_name.clone(),
                    http_status: probe.http_status,
                    page_title: probe.page_title,
                    extracted_snippet: probe.extracted_snippet,
                    found_keywords_from_sets: probe.found_keywords_from_sets,
                    found_adhoc_keywords: probe.found_adhoc_keywords,
                    validation_status: probe.status,
                    attempts: 1,
                },
                Err(_) => HttpResult {
                    campaign_id,
                    domain_name: domain_name.clone(),
                    http_status: None,
                    page_title: None,
                    extracted_snippet: None,
                    found_keywords_from_sets: Vec::new(),
                    found_adhoc_keywords: Vec::new(),
                    validation_status: DnsValidationStatus::Error,
                    attempts: 1,
                },
            };
            collaborators.store.upsert_http_result(result)?;
            processed += 1;
        }

        let remaining = collaborators.store.domains_needing_http(campaign_id, 1)?;
        let batch_done = remaining.is_empty();
        if batch_done {
            metadata.set_status(Phase::Http, PhaseStatus::Completed);
        }

        let mut campaign = campaign;
        campaign.metadata = metadata
            .into_value()
            .map_err(|err| OrchestratorError::Internal(err.to_string()))?;
        collaborators.store.save_campaign(campaign)?;

        let total = collaborators.store.count_generated_domains(campaign_id)?;
        let resolved_terminal = collaborators.store.count_dns_terminal(campaign_id)?;
        let completed = resolved_terminal.saturating_sub(remaining.len() as u64);
        let pct = progress_percent(completed, total);
        collaborators.store.update_campaign_progress(campaign_id, completed, total, pct, false)?;
        collaborators.emit(
            campaign_id,
            EventType::PhaseProgress,
            Some(Phase::Http),
            serde_json::json!({ "processed": processed, "batch_done": batch_done }),
        );

        if batch_done {
            collaborators.orchestrator.handle_completion(campaign_id, Phase::Http)?;
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
    use leadgen_core::interfaces::DnsResult;
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

    fn collaborators(http_validator: StubHttpValidator) -> WorkerCollaborators {
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
            http_validator: Arc::new(http_validator),
            shuffler: Arc::new(leadgen_core::interfaces::IdentityShuffler),
            orchestrator,
            config: WorkerConfig::default(),
        }
    }

    fn seed_campaign(collaborators: &WorkerCollaborators, domain_count: u64) -> CampaignId {
        let now = Timestamp::new(OffsetDateTime::now_utc());
        let mut metadata = CampaignMetadata::default();
        metadata.set_status(Phase::Generation, PhaseStatus::Completed);
        metadata.set_status(Phase::Dns, PhaseStatus::Completed);
        metadata.set_status(Phase::Http, PhaseStatus::Ready);
        metadata.set_params(PhaseParams::Http {
            personas: vec!["default".to_string()],
            keyword_sets: vec![vec!["lead".to_string()]],
            adhoc_keywords: vec![],
        });
        let campaign = Campaign {
            id: CampaignId::generate(),
            name: "test".to_string(),
            owner: None,
            campaign_type: CampaignType::LeadGeneration,
            created_at: now,
            updated_at: now,
            current_phase: Some(Phase::Http),
            phase_status: PhaseStatus::Ready,
            total_phases: leadgen_core::TOTAL_PHASES,
            completed_phases: 2,
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
        for domain in &domains {
            collaborators
                .store
                .upsert_dns_result(DnsResult {
                    campaign_id: id,
                    domain_name: domain.domain_name.clone(),
                    status: DnsValidationStatus::Resolved,
                    attempts: 1,
                    persona_id: None,
                })
                .expect("seed dns result");
        }
        id
    }

    #[test]
    fn completes_when_all_resolved_domains_fetched() {
        let collaborators = collaborators(StubHttpValidator::always_empty());
        let id = seed_campaign(&collaborators, 3);
        let outcome = HttpHandler.process(&collaborators, "worker-1", id, 10).expect("process");
        assert!(outcome.batch_done);
        assert_eq!(outcome.processed_count, 3);
    }

    #[test]
    fn batch_size_limits_progress_in_one_call() {
        let collaborators = collaborators(StubHttpValidator::always_empty());
        let id = seed_campaign(&collaborators, 5);
        let outcome = HttpHandler.process(&collaborators, "worker-1", id, 2).expect("process");
        assert!(!outcome.batch_done);
        assert_eq!(outcome.processed_count, 2);
    }

    #[test]
    fn does_not_refetch_domain_with_terminal_result() {
        let collaborators = collaborators(StubHttpValidator::always_empty());
        let id = seed_campaign(&collaborators, 2);
        let first = HttpHandler.process(&collaborators, "worker-1", id, 1).expect("first batch");
        assert!(!first.batch_done);
        let remaining_before = collaborators.store.domains_needing_http(id, 10).expect("query");
        assert_eq!(remaining_before.len(), 1);
        let second = HttpHandler.process(&collaborators, "worker-1", id, 10).expect("second batch");
        assert!(second.batch_done);
        assert_eq!(second.processed_count, 1);
    }
}
