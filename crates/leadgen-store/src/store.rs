// crates/leadgen-store/src/store.rs
// ============================================================================
// Module: SQLite Campaign Store
// Description: Implements `CampaignStore` over a single guarded connection.
// Purpose: Provide transactional, idempotent persistence for campaigns,
// their phase children, and the job queue.
// Dependencies: leadgen-core, rusqlite, crate::{queries, schema}
// ============================================================================

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use leadgen_core::Campaign;
use leadgen_core::CampaignId;
use leadgen_core::JobId;
use leadgen_core::OwnerId;
use leadgen_core::Phase;
use leadgen_core::PhaseStatus;
use leadgen_core::Timestamp;
use leadgen_core::interfaces::CampaignStore;
use leadgen_core::interfaces::CampaignStoreError;
use leadgen_core::interfaces::DnsResult;
use leadgen_core::interfaces::GeneratedDomain;
use leadgen_core::interfaces::HttpResult;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use thiserror::Error;
use time::OffsetDateTime;

use crate::queries;
use crate::schema;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Errors specific to opening the `SQLite` campaign store.
#[derive(Debug, Error)]
pub enum SqliteCampaignStoreError {
    /// Database could not be opened.
    #[error("campaign store open error: {0}")]
    Open(String),
    /// Schema initialization failed.
    #[error("campaign store schema error: {0}")]
    Schema(String),
}

/// `SQLite`-backed campaign store.
#[derive(Clone)]
pub struct SqliteCampaignStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCampaignStore {
    /// Opens (creating if absent) a campaign store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteCampaignStoreError`] when the database cannot be
    /// opened or the schema cannot be initialized.
    pub fn open(path: &Path, busy_timeout_ms: Option<u64>) -> Result<Self, SqliteCampaignStoreError> {
        let connection =
            Connection::open(path).map_err(|err| SqliteCampaignStoreError::Open(err.to_string()))?;
        connection
            .busy_timeout(Duration::from_millis(busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS)))
            .map_err(|err| SqliteCampaignStoreError::Open(err.to_string()))?;
        connection
            .pragma_update(None, "journal_mode", "wal")
            .map_err(|err| SqliteCampaignStoreError::Open(err.to_string()))?;
        schema::initialize(&connection).map_err(|err| SqliteCampaignStoreError::Schema(err.to_string()))?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Opens an in-memory store, used in tests.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteCampaignStoreError`] when the schema cannot be
    /// initialized.
    pub fn open_in_memory() -> Result<Self, SqliteCampaignStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|err| SqliteCampaignStoreError::Open(err.to_string()))?;
        schema::initialize(&connection).map_err(|err| SqliteCampaignStoreError::Schema(err.to_string()))?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CampaignStoreError> {
        self.connection.lock().map_err(|_| CampaignStoreError::Store("campaign store mutex poisoned".to_string()))
    }
}

fn campaign_type_label(campaign_type: leadgen_core::CampaignType) -> &'static str {
    match campaign_type {
        leadgen_core::CampaignType::LeadGeneration => "lead_generation",
    }
}

impl CampaignStore for SqliteCampaignStore {
    fn create_campaign(&self, campaign: Campaign) -> Result<Campaign, CampaignStoreError> {
        let connection = self.lock()?;
        connection
            .execute(
                "INSERT INTO campaigns \
                 (id, name, owner, campaign_type, created_at, updated_at, current_phase, \
                  phase_status, total_phases, completed_phases, overall_progress, started_at, \
                  completed_at, error_message, metadata_json, auto_advance) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    campaign.id.to_string(),
                    campaign.name,
                    campaign.owner.map(|owner| owner.to_string()),
                    campaign_type_label(campaign.campaign_type),
                    queries::format_timestamp(campaign.created_at)?,
                    queries::format_timestamp(campaign.updated_at)?,
                    campaign.current_phase.map(queries::phase_label),
                    queries::phase_status_label(campaign.phase_status),
                    i64::from(campaign.total_phases),
                    i64::from(campaign.completed_phases),
                    i64::from(campaign.overall_progress),
                    campaign.started_at.map(queries::format_timestamp).transpose()?,
                    campaign.completed_at.map(queries::format_timestamp).transpose()?,
                    campaign.error_message,
                    serde_json::to_vec(&campaign.metadata).map_err(|err| CampaignStoreError::Store(err.to_string()))?,
                    i64::from(campaign.auto_advance),
                ],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        Ok(campaign)
    }

    fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>, CampaignStoreError> {
        let connection = self.lock()?;
        let raw = connection
            .query_row(
                "SELECT id, name, owner, campaign_type, created_at, updated_at, current_phase, \
                 phase_status, total_phases, completed_phases, overall_progress, started_at, \
                 completed_at, error_message, metadata_json, auto_advance FROM campaigns WHERE id = ?1",
                params![id.to_string()],
                queries::campaign_from_row,
            )
            .optional()
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        raw.map(queries::RawCampaign::into_campaign).transpose()
    }

    fn list_campaigns(&self, owner: Option<OwnerId>) -> Result<Vec<Campaign>, CampaignStoreError> {
        let connection = self.lock()?;
        let mut statement = if owner.is_some() {
            connection
                .prepare(
                    "SELECT id, name, owner, campaign_type, created_at, updated_at, current_phase, \
                     phase_status, total_phases, completed_phases, overall_progress, started_at, \
                     completed_at, error_message, metadata_json, auto_advance FROM campaigns WHERE \
                     owner = ?1 ORDER BY created_at",
                )
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?
        } else {
            connection
                .prepare(
                    "SELECT id, name, owner, campaign_type, created_at, updated_at, current_phase, \
                     phase_status, total_phases, completed_phases, overall_progress, started_at, \
                     completed_at, error_message, metadata_json, auto_advance FROM campaigns ORDER BY \
                     created_at",
                )
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?
        };
        let rows = if let Some(owner) = owner {
            statement
                .query_map(params![owner.to_string()], queries::campaign_from_row)
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?
        } else {
            statement
                .query_map([], queries::campaign_from_row)
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?
        };
        rows.into_iter().map(queries::RawCampaign::into_campaign).collect()
    }

    fn save_campaign(&self, campaign: Campaign) -> Result<Campaign, CampaignStoreError> {
        let connection = self.lock()?;
        let previous_updated_at: Option<String> = connection
            .query_row(
                "SELECT updated_at FROM campaigns WHERE id = ?1",
                params![campaign.id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        let Some(previous_updated_at) = previous_updated_at else {
            return Err(CampaignStoreError::NotFound(campaign.id));
        };
        let changed = connection
            .execute(
                "UPDATE campaigns SET name = ?1, owner = ?2, updated_at = ?3, current_phase = ?4, \
                 phase_status = ?5, completed_phases = ?6, overall_progress = ?7, started_at = ?8, \
                 completed_at = ?9, error_message = ?10, metadata_json = ?11, auto_advance = ?12 \
                 WHERE id = ?13 AND updated_at = ?14",
                params![
                    campaign.name,
                    campaign.owner.map(|owner| owner.to_string()),
                    queries::format_timestamp(Timestamp::new(OffsetDateTime::now_utc()))?,
                    campaign.current_phase.map(queries::phase_label),
                    queries::phase_status_label(campaign.phase_status),
                    i64::from(campaign.completed_phases),
                    i64::from(campaign.overall_progress),
                    campaign.started_at.map(queries::format_timestamp).transpose()?,
                    campaign.completed_at.map(queries::format_timestamp).transpose()?,
                    campaign.error_message,
                    serde_json::to_vec(&campaign.metadata).map_err(|err| CampaignStoreError::Store(err.to_string()))?,
                    i64::from(campaign.auto_advance),
                    campaign.id.to_string(),
                    previous_updated_at,
                ],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        if changed == 0 {
            return Err(CampaignStoreError::Conflict(campaign.id));
        }
        drop(connection);
        self.get_campaign(campaign.id)?.ok_or(CampaignStoreError::NotFound(campaign.id))
    }

    fn bulk_delete(&self, ids: &[CampaignId]) -> Result<(), CampaignStoreError> {
        let mut connection = self.lock()?;
        let tx = connection.transaction().map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        for id in ids {
            let id_text = id.to_string();
            tx.execute("DELETE FROM campaigns WHERE id = ?1", params![id_text])
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
            tx.execute("DELETE FROM generated_domains WHERE campaign_id = ?1", params![id_text])
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
            tx.execute("DELETE FROM dns_results WHERE campaign_id = ?1", params![id_text])
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
            tx.execute("DELETE FROM http_results WHERE campaign_id = ?1", params![id_text])
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
            tx.execute("DELETE FROM analysis_results WHERE campaign_id = ?1", params![id_text])
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
            tx.execute(
                "DELETE FROM campaign_jobs WHERE campaign_id = ?1 AND status IN ('pending')",
                params![id_text],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        }
        tx.commit().map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn update_campaign_progress(
        &self,
        id: CampaignId,
        processed: u64,
        total: u64,
        pct: u8,
        reset: bool,
    ) -> Result<(), CampaignStoreError> {
        let connection = self.lock()?;
        if reset {
            connection
                .execute(
                    "UPDATE campaigns SET overall_progress = ?1, updated_at = ?2 WHERE id = ?3",
                    params![
                        i64::from(pct),
                        queries::format_timestamp(Timestamp::new(OffsetDateTime::now_utc()))?,
                        id.to_string(),
                    ],
                )
                .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
            return Ok(());
        }
        let _ = (processed, total);
        let changed = connection
            .execute(
                "UPDATE campaigns SET overall_progress = ?1, updated_at = ?2 WHERE id = ?3 AND \
                 overall_progress <= ?1",
                params![
                    i64::from(pct),
                    queries::format_timestamp(Timestamp::new(OffsetDateTime::now_utc()))?,
                    id.to_string(),
                ],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        let _ = changed;
        Ok(())
    }

    fn update_phase_status(
        &self,
        id: CampaignId,
        phase: Phase,
        status: PhaseStatus,
    ) -> Result<(), CampaignStoreError> {
        let connection = self.lock()?;
        let now = queries::format_timestamp(Timestamp::new(OffsetDateTime::now_utc()))?;
        let mut touched_started_at = None;
        let mut touched_completed_at = None;
        if matches!(status, PhaseStatus::InProgress) {
            touched_started_at = Some(now.clone());
        }
        if matches!(status, PhaseStatus::Completed) {
            touched_completed_at = Some(now.clone());
        }
        connection
            .execute(
                "UPDATE campaigns SET current_phase = ?1, phase_status = ?2, updated_at = ?3, \
                 started_at = COALESCE(?4, started_at), completed_at = COALESCE(?5, completed_at), \
                 completed_phases = completed_phases + (CASE WHEN ?2 = 'completed' THEN 1 ELSE 0 END) \
                 WHERE id = ?6",
                params![
                    queries::phase_label(phase),
                    queries::phase_status_label(status),
                    now,
                    touched_started_at,
                    touched_completed_at,
                    id.to_string(),
                ],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn insert_generated_domains(&self, domains: &[GeneratedDomain]) -> Result<(), CampaignStoreError> {
        let mut connection = self.lock()?;
        let tx = connection.transaction().map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        for domain in domains {
            tx.execute(
                "INSERT INTO generated_domains (campaign_id, offset_index, domain_name, generated_at) \
                 VALUES (?1, ?2, ?3, ?4) ON CONFLICT(campaign_id, offset_index) DO NOTHING",
                params![
                    domain.campaign_id.to_string(),
                    domain.offset_index.to_string(),
                    domain.domain_name,
                    queries::format_timestamp(domain.generated_at)?,
                ],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        }
        tx.commit().map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn count_generated_domains(&self, id: CampaignId) -> Result<u64, CampaignStoreError> {
        let connection = self.lock()?;
        let count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM generated_domains WHERE campaign_id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        u64::try_from(count).map_err(|err| CampaignStoreError::Store(err.to_string()))
    }

    fn domains_needing_dns(
        &self,
        id: CampaignId,
        limit: usize,
    ) -> Result<Vec<GeneratedDomain>, CampaignStoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(
                "SELECT gd.campaign_id, gd.offset_index, gd.domain_name, gd.generated_at FROM \
                 generated_domains gd LEFT JOIN dns_results dr ON dr.campaign_id = gd.campaign_id \
                 AND dr.domain_name = gd.domain_name WHERE gd.campaign_id = ?1 AND (dr.domain_name \
                 IS NULL OR dr.status = 'pending') ORDER BY gd.offset_index LIMIT ?2",
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = statement
            .query_map(params![id.to_string(), limit], queries::generated_domain_from_row)
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        rows.into_iter()
            .map(|(campaign_id, offset_index, domain_name, generated_at)| {
                queries::build_generated_domain(campaign_id, offset_index, domain_name, generated_at)
            })
            .collect()
    }

    fn upsert_dns_result(&self, result: DnsResult) -> Result<(), CampaignStoreError> {
        let connection = self.lock()?;
        connection
            .execute(
                "INSERT INTO dns_results (campaign_id, domain_name, status, attempts, persona_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5) ON CONFLICT(campaign_id, domain_name) DO UPDATE SET \
                 status = excluded.status, attempts = excluded.attempts, persona_id = \
                 excluded.persona_id",
                params![
                    result.campaign_id.to_string(),
                    result.domain_name,
                    queries::dns_status_label(result.status),
                    i64::from(result.attempts),
                    result.persona_id,
                ],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn count_dns_terminal(&self, id: CampaignId) -> Result<u64, CampaignStoreError> {
        let connection = self.lock()?;
        let count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM dns_results WHERE campaign_id = ?1 AND status != 'pending'",
                params![id.to_string()],
                |row| row.get(0),
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        u64::try_from(count).map_err(|err| CampaignStoreError::Store(err.to_string()))
    }

    fn domains_needing_http(&self, id: CampaignId, limit: usize) -> Result<Vec<String>, CampaignStoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(
                "SELECT dr.domain_name FROM dns_results dr LEFT JOIN http_results hr ON \
                 hr.campaign_id = dr.campaign_id AND hr.domain_name = dr.domain_name WHERE \
                 dr.campaign_id = ?1 AND dr.status = 'resolved' AND (hr.domain_name IS NULL OR \
                 hr.validation_status = 'pending') LIMIT ?2",
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        statement
            .query_map(params![id.to_string(), limit], |row| row.get(0))
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CampaignStoreError::Store(err.to_string()))
    }

    fn upsert_http_result(&self, result: HttpResult) -> Result<(), CampaignStoreError> {
        let connection = self.lock()?;
        connection
            .execute(
                "INSERT INTO http_results \
                 (campaign_id, domain_name, http_status, page_title, extracted_snippet, \
                  found_keywords_from_sets_json, found_adhoc_keywords_json, validation_status, \
                  attempts) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) ON \
                 CONFLICT(campaign_id, domain_name) DO UPDATE SET http_status = excluded.http_status, \
                 page_title = excluded.page_title, extracted_snippet = excluded.extracted_snippet, \
                 found_keywords_from_sets_json = excluded.found_keywords_from_sets_json, \
                 found_adhoc_keywords_json = excluded.found_adhoc_keywords_json, validation_status = \
                 excluded.validation_status, attempts = excluded.attempts",
                params![
                    result.campaign_id.to_string(),
                    result.domain_name,
                    result.http_status.map(i64::from),
                    result.page_title,
                    result.extracted_snippet,
                    serde_json::to_vec(&result.found_keywords_from_sets)
                        .map_err(|err| CampaignStoreError::Store(err.to_string()))?,
                    serde_json::to_vec(&result.found_adhoc_keywords)
                        .map_err(|err| CampaignStoreError::Store(err.to_string()))?,
                    queries::dns_status_label(result.validation_status),
                    i64::from(result.attempts),
                ],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn list_http_results(&self, id: CampaignId) -> Result<Vec<HttpResult>, CampaignStoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(
                "SELECT campaign_id, domain_name, http_status, page_title, extracted_snippet, \
                 found_keywords_from_sets_json, found_adhoc_keywords_json, validation_status, \
                 attempts FROM http_results WHERE campaign_id = ?1",
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        let rows = statement
            .query_map(params![id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Vec<u8>>(5)?,
                    row.get::<_, Vec<u8>>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            })
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        rows.into_iter()
            .map(|(campaign_id, domain_name, http_status, page_title, extracted_snippet, sets, adhoc, status, attempts)| {
                queries::build_http_result(
                    campaign_id,
                    domain_name,
                    http_status,
                    page_title,
                    extracted_snippet,
                    sets,
                    adhoc,
                    status,
                    attempts,
                )
            })
            .collect()
    }

    fn save_analysis_results(&self, id: CampaignId, results: serde_json::Value) -> Result<(), CampaignStoreError> {
        let connection = self.lock()?;
        connection
            .execute(
                "INSERT INTO analysis_results (campaign_id, results_json) VALUES (?1, ?2) ON \
                 CONFLICT(campaign_id) DO UPDATE SET results_json = excluded.results_json",
                params![
                    id.to_string(),
                    serde_json::to_vec(&results).map_err(|err| CampaignStoreError::Store(err.to_string()))?,
                ],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn get_analysis_results(&self, id: CampaignId) -> Result<Option<serde_json::Value>, CampaignStoreError> {
        let connection = self.lock()?;
        let blob: Option<Vec<u8>> = connection
            .query_row(
                "SELECT results_json FROM analysis_results WHERE campaign_id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        blob.map(|bytes| serde_json::from_slice(&bytes).map_err(|err| CampaignStoreError::Store(err.to_string())))
            .transpose()
    }

    fn list_generated_domains(
        &self,
        id: CampaignId,
        after: Option<u128>,
        limit: usize,
    ) -> Result<Vec<GeneratedDomain>, CampaignStoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(
                "SELECT campaign_id, offset_index, domain_name, generated_at FROM generated_domains \
                 WHERE campaign_id = ?1 AND CAST(offset_index AS INTEGER) > ?2 ORDER BY \
                 CAST(offset_index AS INTEGER) LIMIT ?3",
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        let after = after.map_or(-1i64, |value| i64::try_from(value).unwrap_or(i64::MAX));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = statement
            .query_map(params![id.to_string(), after, limit], queries::generated_domain_from_row)
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        rows.into_iter()
            .map(|(campaign_id, offset_index, domain_name, generated_at)| {
                queries::build_generated_domain(campaign_id, offset_index, domain_name, generated_at)
            })
            .collect()
    }

    fn list_dns_results(
        &self,
        id: CampaignId,
        after: Option<String>,
        limit: usize,
    ) -> Result<Vec<DnsResult>, CampaignStoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(
                "SELECT campaign_id, domain_name, status, attempts, persona_id FROM dns_results \
                 WHERE campaign_id = ?1 AND domain_name > ?2 ORDER BY domain_name LIMIT ?3",
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        let after = after.unwrap_or_default();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = statement
            .query_map(params![id.to_string(), after, limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        rows.into_iter()
            .map(|(campaign_id, domain_name, status, attempts, persona_id)| {
                queries::build_dns_result(campaign_id, domain_name, status, attempts, persona_id)
            })
            .collect()
    }

    fn list_http_results_page(
        &self,
        id: CampaignId,
        after: Option<String>,
        limit: usize,
    ) -> Result<Vec<HttpResult>, CampaignStoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(
                "SELECT campaign_id, domain_name, http_status, page_title, extracted_snippet, \
                 found_keywords_from_sets_json, found_adhoc_keywords_json, validation_status, \
                 attempts FROM http_results WHERE campaign_id = ?1 AND domain_name > ?2 ORDER BY \
                 domain_name LIMIT ?3",
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        let after = after.unwrap_or_default();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = statement
            .query_map(params![id.to_string(), after, limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Vec<u8>>(5)?,
                    row.get::<_, Vec<u8>>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            })
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        rows.into_iter()
            .map(|(campaign_id, domain_name, http_status, page_title, extracted_snippet, sets, adhoc, status, attempts)| {
                queries::build_http_result(
                    campaign_id,
                    domain_name,
                    http_status,
                    page_title,
                    extracted_snippet,
                    sets,
                    adhoc,
                    status,
                    attempts,
                )
            })
            .collect()
    }

    fn enqueue_job(&self, campaign_id: CampaignId, phase: Phase) -> Result<JobId, CampaignStoreError> {
        let connection = self.lock()?;
        let job_id = JobId::generate();
        connection
            .execute(
                "INSERT INTO campaign_jobs \
                 (id, campaign_id, phase_type, status, next_attempt_at, attempts, last_error, \
                  worker_id, heartbeat_at) VALUES (?1, ?2, ?3, 'pending', ?4, 0, NULL, NULL, NULL)",
                params![
                    job_id.get().to_string(),
                    campaign_id.to_string(),
                    queries::phase_label(phase),
                    queries::format_timestamp(Timestamp::new(OffsetDateTime::now_utc()))?,
                ],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        Ok(job_id)
    }

    fn claim_job(&self, worker_id: &str) -> Result<Option<leadgen_core::CampaignJob>, CampaignStoreError> {
        let mut connection = self.lock()?;
        let now = queries::format_timestamp(Timestamp::new(OffsetDateTime::now_utc()))?;
        let tx = connection.transaction().map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        let candidate: Option<String> = tx
            .query_row(
                "SELECT id FROM campaign_jobs WHERE status = 'pending' AND next_attempt_at <= ?1 \
                 ORDER BY next_attempt_at LIMIT 1",
                params![now],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        let Some(candidate_id) = candidate else {
            tx.commit().map_err(|err| CampaignStoreError::Store(err.to_string()))?;
            return Ok(None);
        };
        tx.execute(
            "UPDATE campaign_jobs SET status = 'in_progress', worker_id = ?1, heartbeat_at = ?2 \
             WHERE id = ?3",
            params![worker_id, now, candidate_id],
        )
        .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        let row = tx
            .query_row(
                "SELECT id, campaign_id, phase_type, status, next_attempt_at, attempts, last_error, \
                 worker_id FROM campaign_jobs WHERE id = ?1",
                params![candidate_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, Option<String>>(7)?,
                    ))
                },
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        tx.commit().map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        let (id, campaign_id, phase_type, status, next_attempt_at, attempts, last_error, worker_id) = row;
        queries::build_job(id, campaign_id, phase_type, status, next_attempt_at, attempts, last_error, worker_id)
            .map(Some)
    }

    fn complete_job(&self, id: JobId) -> Result<(), CampaignStoreError> {
        let connection = self.lock()?;
        connection
            .execute(
                "UPDATE campaign_jobs SET status = 'completed' WHERE id = ?1",
                params![id.get().to_string()],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn fail_job_attempt(
        &self,
        id: JobId,
        error: &str,
        backoff: Duration,
        max_attempts: u32,
    ) -> Result<(), CampaignStoreError> {
        let connection = self.lock()?;
        let attempts: i64 = connection
            .query_row(
                "SELECT attempts FROM campaign_jobs WHERE id = ?1",
                params![id.get().to_string()],
                |row| row.get(0),
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        let next_attempts = attempts + 1;
        let next_status = if u32::try_from(next_attempts).unwrap_or(u32::MAX) >= max_attempts {
            "failed"
        } else {
            "pending"
        };
        let next_attempt_at = Timestamp::new(OffsetDateTime::now_utc().saturating_add(
            time::Duration::try_from(backoff).unwrap_or(time::Duration::ZERO),
        ));
        connection
            .execute(
                "UPDATE campaign_jobs SET status = ?1, attempts = ?2, last_error = ?3, \
                 next_attempt_at = ?4, worker_id = NULL WHERE id = ?5",
                params![
                    next_status,
                    next_attempts,
                    error,
                    queries::format_timestamp(next_attempt_at)?,
                    id.get().to_string(),
                ],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn heartbeat_job(&self, id: JobId, worker_id: &str) -> Result<(), CampaignStoreError> {
        let connection = self.lock()?;
        connection
            .execute(
                "UPDATE campaign_jobs SET heartbeat_at = ?1 WHERE id = ?2 AND worker_id = ?3 AND \
                 status = 'in_progress'",
                params![
                    queries::format_timestamp(Timestamp::new(OffsetDateTime::now_utc()))?,
                    id.get().to_string(),
                    worker_id,
                ],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn requeue_continuation(&self, id: JobId) -> Result<(), CampaignStoreError> {
        let connection = self.lock()?;
        connection
            .execute(
                "UPDATE campaign_jobs SET status = 'pending', worker_id = NULL, heartbeat_at = NULL \
                 WHERE id = ?1",
                params![id.get().to_string()],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn reap_stale_jobs(&self, stale_after: Duration) -> Result<u64, CampaignStoreError> {
        let connection = self.lock()?;
        let threshold = Timestamp::new(
            OffsetDateTime::now_utc()
                .saturating_sub(time::Duration::try_from(stale_after).unwrap_or(time::Duration::ZERO)),
        );
        let changed = connection
            .execute(
                "UPDATE campaign_jobs SET status = 'pending', worker_id = NULL, heartbeat_at = NULL \
                 WHERE status = 'in_progress' AND heartbeat_at < ?1",
                params![queries::format_timestamp(threshold)?],
            )
            .map_err(|err| CampaignStoreError::Store(err.to_string()))?;
        u64::try_from(changed).map_err(|err| CampaignStoreError::Store(err.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use super::*;
    use leadgen_core::CampaignType;

    fn sample_campaign() -> Campaign {
        let now = Timestamp::new(OffsetDateTime::now_utc());
        Campaign {
            id: CampaignId::generate(),
            name: "test".to_string(),
            owner: None,
            campaign_type: CampaignType::LeadGeneration,
            created_at: now,
            updated_at: now,
            current_phase: None,
            phase_status: PhaseStatus::NotStarted,
            total_phases: 4,
            completed_phases: 0,
            overall_progress: 0,
            started_at: None,
            completed_at: None,
            error_message: None,
            metadata: serde_json::json!({}),
            auto_advance: false,
        }
    }

    #[test]
    fn create_then_get_round_trips() {
        let store = SqliteCampaignStore::open_in_memory().expect("open");
        let campaign = sample_campaign();
        let id = campaign.id;
        store.create_campaign(campaign).expect("create");
        let loaded = store.get_campaign(id).expect("get").expect("present");
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.phase_status, PhaseStatus::NotStarted);
    }

    #[test]
    fn save_with_stale_updated_at_conflicts() {
        let store = SqliteCampaignStore::open_in_memory().expect("open");
        let campaign = sample_campaign();
        let id = campaign.id;
        store.create_campaign(campaign.clone()).expect("create");
        store.save_campaign(campaign.clone()).expect("first save should succeed");
        let err = store.save_campaign(campaign).expect_err("second save should conflict");
        assert!(matches!(err, CampaignStoreError::Conflict(conflicted) if conflicted == id));
    }

    #[test]
    fn generated_domain_insert_is_idempotent() {
        let store = SqliteCampaignStore::open_in_memory().expect("open");
        let campaign = sample_campaign();
        let id = campaign.id;
        store.create_campaign(campaign).expect("create");
        let domain = GeneratedDomain {
            campaign_id: id,
            offset_index: 0,
            domain_name: "aax.com".to_string(),
            generated_at: Timestamp::new(OffsetDateTime::now_utc()),
        };
        store.insert_generated_domains(&[domain.clone()]).expect("insert");
        store.insert_generated_domains(&[domain]).expect("insert again");
        assert_eq!(store.count_generated_domains(id).expect("count"), 1);
    }

    #[test]
    fn claim_job_marks_in_progress_once() {
        let store = SqliteCampaignStore::open_in_memory().expect("open");
        let campaign = sample_campaign();
        let id = campaign.id;
        store.create_campaign(campaign).expect("create");
        store.enqueue_job(id, Phase::Generation).expect("enqueue");
        let claimed = store.claim_job("worker-1").expect("claim").expect("present");
        assert_eq!(claimed.status, leadgen_core::JobStatus::InProgress);
        let second = store.claim_job("worker-2").expect("claim");
        assert!(second.is_none());
    }

    #[test]
    fn list_generated_domains_pages_by_offset() {
        let store = SqliteCampaignStore::open_in_memory().expect("open");
        let campaign = sample_campaign();
        let id = campaign.id;
        store.create_campaign(campaign).expect("create");
        let now = Timestamp::new(OffsetDateTime::now_utc());
        let domains: Vec<GeneratedDomain> = (0..5)
            .map(|index| GeneratedDomain {
                campaign_id: id,
                offset_index: index,
                domain_name: format!("d{index}.com"),
                generated_at: now,
            })
            .collect();
        store.insert_generated_domains(&domains).expect("insert");

        let first_page = store.list_generated_domains(id, None, 2).expect("page 1");
        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page[0].offset_index, 0);
        assert_eq!(first_page[1].offset_index, 1);

        let second_page = store.list_generated_domains(id, Some(1), 2).expect("page 2");
        assert_eq!(second_page.len(), 2);
        assert_eq!(second_page[0].offset_index, 2);
    }

    #[test]
    fn analysis_results_round_trip() {
        let store = SqliteCampaignStore::open_in_memory().expect("open");
        let campaign = sample_campaign();
        let id = campaign.id;
        store.create_campaign(campaign).expect("create");
        assert!(store.get_analysis_results(id).expect("query").is_none());
        store
            .save_analysis_results(id, serde_json::json!({"urls_with_keywords": 3}))
            .expect("save");
        let loaded = store.get_analysis_results(id).expect("query").expect("present");
        assert_eq!(loaded["urls_with_keywords"], 3);
    }
}
