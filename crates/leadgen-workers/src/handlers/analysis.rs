// crates/leadgen-workers/src/handlers/analysis.rs
// ============================================================================
// Module: Analysis Phase Handler
// Description: Scores every keyword-matched HTTP result and aggregates the
// campaign-level summary.
// Purpose: Compute the fixed lead-score formula and persist the
// single analysis results blob in one batch.
// Dependencies: leadgen-core, leadgen-orchestrator
// ============================================================================

use leadgen_core::CampaignId;
use leadgen_core::EventType;
use leadgen_core::OrchestratorError;
use leadgen_core::Phase;
use leadgen_core::PhaseStatus;
use leadgen_core::Trigger;
use leadgen_core::interfaces::DnsValidationStatus;
use leadgen_core::interfaces::HttpResult;
use leadgen_core::transition;
use leadgen_orchestrator::CampaignMetadata;
use serde::Serialize;

use super::BatchOutcome;
use super::PhaseHandler;
use crate::collaborators::HandlerError;
use crate::collaborators::WorkerCollaborators;

/// Scores keyword matches and produces the campaign's analysis summary
///. Runs as a single batch: there is nothing to page through.
pub struct AnalysisHandler;

impl PhaseHandler for AnalysisHandler {
    fn process(
        &self,
        collaborators: &WorkerCollaborators,
        _worker_id: &str,
        campaign_id: CampaignId,
        _batch_size: usize,
    ) -> Result<BatchOutcome, HandlerError> {
        let campaign = collaborators
            .store
            .get_campaign(campaign_id)?
            .ok_or_else(|| OrchestratorError::NotFound(format!("campaign {campaign_id} not found")))?;
        let mut metadata = CampaignMetadata::from_value(&campaign.metadata);

        let current_status = metadata.status(Phase::Analysis);
        if matches!(current_status, PhaseStatus::Ready | PhaseStatus::Configured) {
            let started = transition(current_status, Trigger::Start)?;
            metadata.set_status(Phase::Analysis, started);
        }

        let http_results = collaborators.store.list_http_results(campaign_id)?;
        let matched: Vec<&HttpResult> = http_results
            .iter()
            .filter(|result| !result.found_keywords_from_sets.is_empty() || !result.found_adhoc_keywords.is_empty())
            .collect();

        let leads: Vec<LeadScore> = matched.iter().map(|result| score_lead(result)).collect();

        let urls_with_keywords = matched.len() as u64;
        let urls_without_keywords = (http_results.len() as u64).saturating_sub(urls_with_keywords);
        let unique_keywords = count_unique_keywords(&matched);
        let total_keyword_hits: u64 = matched
            .iter()
            .map(|result| (result.found_keywords_from_sets.len() + result.found_adhoc_keywords.len()) as u64)
            .sum();
        let avg_keywords_per_url = if urls_with_keywords == 0 {
            0.0
        } else {
            total_keyword_hits as f64 / urls_with_keywords as f64
        };

        let summary = AnalysisSummary {
            urls_with_keywords,
            urls_without_keywords,
            unique_keyword_count: unique_keywords,
            avg_keywords_per_url,
            leads,
        };
        let summary_value = serde_json::to_value(&summary).map_err(|err| OrchestratorError::Internal(err.to_string()))?;
        collaborators.store.save_analysis_results(campaign_id, summary_value)?;

        metadata.set_status(Phase::Analysis, PhaseStatus::Completed);
        let mut campaign = campaign;
        campaign.metadata = metadata
            .into_value()
            .map_err(|err| OrchestratorError::Internal(err.to_string()))?;
        collaborators.store.save_campaign(campaign)?;

        collaborators.emit(
            campaign_id,
            EventType::PhaseProgress,
            Some(Phase::Analysis),
            serde_json::json!({ "urls_with_keywords": urls_with_keywords, "urls_without_keywords": urls_without_keywords }),
        );

        collaborators.orchestrator.handle_completion(campaign_id, Phase::Analysis)?;

        Ok(BatchOutcome {
            batch_done: true,
            processed_count: urls_with_keywords,
        })
    }
}

/// Per-domain analysis output.
#[derive(Debug, Clone, Serialize)]
struct LeadScore {
    domain_name: String,
    score: u8,
}

/// Campaign-level analysis summary persisted as the single results blob.
#[derive(Debug, Clone, Serialize)]
struct AnalysisSummary {
    urls_with_keywords: u64,
    urls_without_keywords: u64,
    unique_keyword_count: u64,
    avg_keywords_per_url: f64,
    leads: Vec<LeadScore>,
}

/// Computes one domain's lead score, clamped to 100 (verified
/// against the 110-before-clamp example: `30+15*2+10+10+15+10+5=110`).
fn score_lead(result: &HttpResult) -> LeadScore {
    let mut score: u32 = 0;
    if matches!(result.http_status, Some(status) if (200..300).contains(&status)) {
        score += 30;
    }
    score += 15 * result.found_keywords_from_sets.len() as u32;
    score += 10 * result.found_adhoc_keywords.len() as u32;
    if result.page_title.as_ref().is_some_and(|title| !title.is_empty()) {
        score += 10;
    }
    if result.extracted_snippet.as_ref().is_some_and(|snippet| !snippet.is_empty()) {
        score += 15;
    }
    if result.validation_status == DnsValidationStatus::Resolved {
        score += 10;
    }
    if result.attempts == 1 {
        score += 5;
    }
    LeadScore {
        domain_name: result.domain_name.clone(),
        score: u8::try_from(score.min(100)).unwrap_or(100),
    }
}

fn count_unique_keywords(matched: &[&HttpResult]) -> u64 {
    let mut seen = std::collections::HashSet::new();
    for result in matched {
        for keyword in result.found_keywords_from_sets.iter().chain(result.found_adhoc_keywords.iter()) {
            seen.insert(keyword.as_str());
        }
    }
    seen.len() as u64
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use std::sync::Arc;

    use leadgen_core::Campaign;
    use leadgen_core::CampaignType;
    use leadgen_core::Timestamp;
    use leadgen_core::interfaces::CampaignStore;
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

    fn seed_campaign(collaborators: &WorkerCollaborators, results: Vec<HttpResult>) -> CampaignId {
        let now = Timestamp::new(OffsetDateTime::now_utc());
        let mut metadata = CampaignMetadata::default();
        metadata.set_status(Phase::Generation, PhaseStatus::Completed);
        metadata.set_status(Phase::Dns, PhaseStatus::Completed);
        metadata.set_status(Phase::Http, PhaseStatus::Completed);
        metadata.set_status(Phase::Analysis, PhaseStatus::Ready);
        metadata.set_params(leadgen_core::PhaseParams::Analysis {
            weights: serde_json::json!({}),
        });
        let campaign = Campaign {
            id: CampaignId::generate(),
            name: "test".to_string(),
            owner: None,
            campaign_type: CampaignType::LeadGeneration,
            created_at: now,
            updated_at: now,
            current_phase: Some(Phase::Analysis),
            phase_status: PhaseStatus::Ready,
            total_phases: leadgen_core::TOTAL_PHASES,
            completed_phases: 3,
            overall_progress: 0,
            started_at: None,
            completed_at: None,
            error_message: None,
            metadata: metadata.into_value().expect("serialize"),
            auto_advance: false,
        };
        let id = campaign.id;
        collaborators.store.create_campaign(campaign).expect("create");
        for mut result in results {
            result.campaign_id = id;
            collaborators.store.upsert_http_result(result).expect("seed http result");
        }
        id
    }

    #[test]
    fn clamps_score_at_100_for_the_worked_example() {
        let result = HttpResult {
            campaign_id: CampaignId::generate(),
            domain_name: "lead.com".to_string(),
            http_status: Some(200),
            page_title: Some("title".to_string()),
            extracted_snippet: Some("snippet".to_string()),
            found_keywords_from_sets: vec!["a".to_string(), "b".to_string()],
            found_adhoc_keywords: vec!["c".to_string()],
            validation_status: DnsValidationStatus::Resolved,
            attempts: 1,
        };
        assert_eq!(score_lead(&result).score, 100);
    }

    #[test]
    fn completes_and_persists_summary() {
        let collaborators = collaborators();
        let matched = HttpResult {
            campaign_id: CampaignId::generate(),
            domain_name: "lead1.com".to_string(),
            http_status: Some(200),
            page_title: None,
            extracted_snippet: None,
            found_keywords_from_sets: vec!["a".to_string()],
            found_adhoc_keywords: vec![],
            validation_status: DnsValidationStatus::Resolved,
            attempts: 2,
        };
        let unmatched = HttpResult {
            campaign_id: CampaignId::generate(),
            domain_name: "lead2.com".to_string(),
            http_status: Some(200),
            page_title: None,
            extracted_snippet: None,
            found_keywords_from_sets: vec![],
            found_adhoc_keywords: vec![],
            validation_status: DnsValidationStatus::Resolved,
            attempts: 1,
        };
        let id = seed_campaign(&collaborators, vec![matched, unmatched]);
        let outcome = AnalysisHandler.process(&collaborators, "worker-1", id, 100).expect("process");
        assert!(outcome.batch_done);
        assert_eq!(outcome.processed_count, 1);
    }
}
