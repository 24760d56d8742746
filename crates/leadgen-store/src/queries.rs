// crates/leadgen-store/src/queries.rs
// ============================================================================
// Module: Row Mapping
// Description: Conversions between SQLite rows and the domain types.
// Purpose: Keep `store.rs` focused on transaction shape, not column plumbing.
// Dependencies: leadgen-core, rusqlite
// ============================================================================

use leadgen_core::Campaign;
use leadgen_core::CampaignId;
use leadgen_core::CampaignJob;
use leadgen_core::CampaignType;
use leadgen_core::JobId;
use leadgen_core::JobStatus;
use leadgen_core::OwnerId;
use leadgen_core::Phase;
use leadgen_core::PhaseStatus;
use leadgen_core::Timestamp;
use leadgen_core::interfaces::CampaignStoreError;
use leadgen_core::interfaces::DnsResult;
use leadgen_core::interfaces::DnsValidationStatus;
use leadgen_core::interfaces::GeneratedDomain;
use leadgen_core::interfaces::HttpResult;
use rusqlite::Row;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

pub fn parse_timestamp(value: &str) -> Result<Timestamp, CampaignStoreError> {
    let parsed = OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
    Ok(Timestamp::new(parsed))
}

pub fn format_timestamp(value: Timestamp) -> Result<String, CampaignStoreError> {
    value.to_rfc3339().map_err(|err| CampaignStoreError::Store(err.to_string()))
}

pub fn parse_campaign_id(value: &str) -> Result<CampaignId, CampaignStoreError> {
    Uuid::parse_str(value)
        .map(CampaignId::new)
        .map_err(|err| CampaignStoreError::Store(err.to_string()))
}

pub const fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Generation => "generation",
        Phase::Dns => "dns",
        Phase::Http => "http",
        Phase::Analysis => "analysis",
    }
}

pub fn parse_phase(value: &str) -> Result<Phase, CampaignStoreError> {
    match value {
        "generation" => Ok(Phase::Generation),
        "dns" => Ok(Phase::Dns),
        "http" => Ok(Phase::Http),
        "analysis" => Ok(Phase::Analysis),
        other => Err(CampaignStoreError::Store(format!("unknown phase: {other}"))),
    }
}

pub const fn phase_status_label(status: PhaseStatus) -> &'static str {
    match status {
        PhaseStatus::NotStarted => "not_started",
        PhaseStatus::Ready => "ready",
        PhaseStatus::Configured => "configured",
        PhaseStatus::InProgress => "in_progress",
        PhaseStatus::Paused => "paused",
        PhaseStatus::Completed => "completed",
        PhaseStatus::Failed => "failed",
        PhaseStatus::Skipped => "skipped",
    }
}

pub fn parse_phase_status(value: &str) -> Result<PhaseStatus, CampaignStoreError> {
    match value {
        "not_started" => Ok(PhaseStatus::NotStarted),
        "ready" => Ok(PhaseStatus::Ready),
        "configured" => Ok(PhaseStatus::Configured),
        "in_progress" => Ok(PhaseStatus::InProgress),
        "paused" => Ok(PhaseStatus::Paused),
        "completed" => Ok(PhaseStatus::Completed),
        "failed" => Ok(PhaseStatus::Failed),
        "skipped" => Ok(PhaseStatus::Skipped),
        other => Err(CampaignStoreError::Store(format!("unknown phase status: {other}"))),
    }
}

pub const fn job_status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "pending",
        JobStatus::InProgress => "in_progress",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
    }
}

pub fn parse_job_status(value: &str) -> Result<JobStatus, CampaignStoreError> {
    match value {
        "pending" => Ok(JobStatus::Pending),
        "in_progress" => Ok(JobStatus::InProgress),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed),
        other => Err(CampaignStoreError::Store(format!("unknown job status: {other}"))),
    }
}

pub const fn dns_status_label(status: DnsValidationStatus) -> &'static str {
    match status {
        DnsValidationStatus::Resolved => "resolved",
        DnsValidationStatus::Unresolved => "unresolved",
        DnsValidationStatus::Error => "error",
        DnsValidationStatus::Pending => "pending",
    }
}

pub fn parse_dns_status(value: &str) -> Result<DnsValidationStatus, CampaignStoreError> {
    match value {
        "resolved" => Ok(DnsValidationStatus::Resolved),
        "unresolved" => Ok(DnsValidationStatus::Unresolved),
        "error" => Ok(DnsValidationStatus::Error),
        "pending" => Ok(DnsValidationStatus::Pending),
        other => Err(CampaignStoreError::Store(format!("unknown dns status: {other}"))),
    }
}

pub fn campaign_from_row(row: &Row<'_>) -> rusqlite::Result<RawCampaign> {
    Ok(RawCampaign {
        id: row.get(0)?,
        name: row.get(1)?,
        owner: row.get(2)?,
        campaign_type: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        current_phase: row.get(6)?,
        phase_status: row.get(7)?,
        total_phases: row.get(8)?,
        completed_phases: row.get(9)?,
        overall_progress: row.get(10)?,
        started_at: row.get(11)?,
        completed_at: row.get(12)?,
        error_message: row.get(13)?,
        metadata_json: row.get(14)?,
        auto_advance: row.get(15)?,
    })
}

/// Intermediate row shape decoded straight off the `campaigns` table before
/// its string/int columns are parsed into domain types.
pub struct RawCampaign {
    pub id: String,
    pub name: String,
    pub owner: Option<String>,
    pub campaign_type: String,
    pub created_at: String,
    pub updated_at: String,
    pub current_phase: Option<String>,
    pub phase_status: String,
    pub total_phases: i64,
    pub completed_phases: i64,
    pub overall_progress: i64,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
    pub metadata_json: Vec<u8>,
    pub auto_advance: i64,
}

impl RawCampaign {
    pub fn into_campaign(self) -> Result<Campaign, CampaignStoreError> {
        Ok(Campaign {
            id: parse_campaign_id(&self.id)?,
            name: self.name,
            owner: self
                .owner
                .map(|value| Uuid::parse_str(&value).map(OwnerId::new))
                .transpose()
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?,
            campaign_type: match self.campaign_type.as_str() {
                "lead_generation" => CampaignType::LeadGeneration,
                other => return Err(CampaignStoreError::Store(format!("unknown campaign type: {other}"))),
            },
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            current_phase: self.current_phase.map(|value| parse_phase(&value)).transpose()?,
            phase_status: parse_phase_status(&self.phase_status)?,
            total_phases: u32::try_from(self.total_phases)
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?,
            completed_phases: u32::try_from(self.completed_phases)
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?,
            overall_progress: u8::try_from(self.overall_progress)
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?,
            started_at: self.started_at.map(|value| parse_timestamp(&value)).transpose()?,
            completed_at: self.completed_at.map(|value| parse_timestamp(&value)).transpose()?,
            error_message: self.error_message,
            metadata: serde_json::from_slice(&self.metadata_json)
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?,
            auto_advance: self.auto_advance != 0,
        })
    }
}

pub fn generated_domain_from_row(row: &Row<'_>) -> rusqlite::Result<(String, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

pub fn build_generated_domain(
    campaign_id: String,
    offset_index: String,
    domain_name: String,
    generated_at: String,
) -> Result<GeneratedDomain, CampaignStoreError> {
    Ok(GeneratedDomain {
        campaign_id: parse_campaign_id(&campaign_id)?,
        offset_index: offset_index
            .parse()
            .map_err(|_| CampaignStoreError::Store("corrupt offset_index".to_string()))?,
        domain_name,
        generated_at: parse_timestamp(&generated_at)?,
    })
}

pub fn build_dns_result(
    campaign_id: String,
    domain_name: String,
    status: String,
    attempts: i64,
    persona_id: Option<String>,
) -> Result<DnsResult, CampaignStoreError> {
    Ok(DnsResult {
        campaign_id: parse_campaign_id(&campaign_id)?,
        domain_name,
        status: parse_dns_status(&status)?,
        attempts: u32::try_from(attempts).map_err(|err| CampaignStoreError::Store(err.to_string()))?,
        persona_id,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn build_http_result(
    campaign_id: String,
    domain_name: String,
    http_status: Option<i64>,
    page_title: Option<String>,
    extracted_snippet: Option<String>,
    found_keywords_from_sets_json: Vec<u8>,
    found_adhoc_keywords_json: Vec<u8>,
    validation_status: String,
    attempts: i64,
) -> Result<HttpResult, CampaignStoreError> {
    Ok(HttpResult {
        campaign_id: parse_campaign_id(&campaign_id)?,
        domain_name,
        http_status: http_status
            .map(u16::try_from)
            .transpose()
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?,
        page_title,
        extracted_snippet,
        found_keywords_from_sets: serde_json::from_slice(&found_keywords_from_sets_json)
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?,
        found_adhoc_keywords: serde_json::from_slice(&found_adhoc_keywords_json)
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?,
        validation_status: parse_dns_status(&validation_status)?,
        attempts: u32::try_from(attempts).map_err(|err| CampaignStoreError::Store(err.to_string()))?,
    })
}

pub fn build_job(
    id: String,
    campaign_id: String,
    phase_type: String,
    status: String,
    next_attempt_at: String,
    attempts: i64,
    last_error: Option<String>,
    worker_id: Option<String>,
) -> Result<CampaignJob, CampaignStoreError> {
    Ok(CampaignJob {
        id: Uuid::parse_str(&id).map(JobId::new).map_err(|err| CampaignStoreError::Store(err.to_string()))?,
        campaign_id: parse_campaign_id(&campaign_id)?,
        phase_type: parse_phase(&phase_type)?,
        status: parse_job_status(&status)?,
        next_attempt_at: parse_timestamp(&next_attempt_at)?,
        attempts: u32::try_from(attempts).map_err(|err| CampaignStoreError::Store(err.to_string()))?,
        last_error,
        worker_id,
    })
}
