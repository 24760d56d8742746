// crates/leadgen-core/src/interfaces/mod.rs
// ============================================================================
// Module: Interfaces
// Description: Backend-agnostic traits consumed by the orchestrator.
// Purpose: Define the contract surfaces other crates implement, without
// embedding storage, transport, or DNS/HTTP backend details here.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the orchestrator integrates with persistence, the
//! event stream, and external validators without embedding backend-specific
//! details in `leadgen-core` itself. Implementations must be deterministic
//! deterministically where it matters (the domain generator is pure; DNS/HTTP
//! validators are not) and must fail closed on missing or invalid data.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::campaign::Campaign;
use crate::core::campaign::CampaignId;
use crate::core::campaign::CampaignJob;
use crate::core::campaign::JobId;
use crate::core::events::EventPayload;
use crate::core::events::EventType;
use crate::core::events::PhaseEvent;
use crate::core::identifiers::ConfigHash;
use crate::core::identifiers::Sequence;
use crate::core::state_machine::Phase;
use crate::core::state_machine::PhaseStatus;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Versioned Config Store (§4.B)
// ============================================================================

/// A versioned configuration record.
///
/// # Invariants
/// - `last_offset` is non-decreasing across successful updates for a given
///   `config_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedConfigRecord {
    /// Stable hash of the normalized domain-pattern tuple.
    pub config_hash: ConfigHash,
    /// Process-wide high-water mark shared by every campaign using this hash.
    pub last_offset: u128,
    /// Opaque configuration details (the normalized pattern tuple).
    pub config_details: serde_json::Value,
    /// CAS version, incremented on every successful update.
    pub version: u64,
}

/// Errors from the versioned config store.
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    /// CAS retries exhausted.
    #[error("CAS retries exhausted for config hash {0}")]
    Contention(ConfigHash),
    /// Lease already held by another owner.
    #[error("config hash {hash} is locked by {owner}")]
    Locked {
        /// Locked config hash.
        hash: ConfigHash,
        /// Current lease owner token.
        owner: String,
    },
    /// The mutator proposed a backward-moving `last_offset`.
    #[error("mutator proposed last_offset to move backward for {0}")]
    OffsetRegression(ConfigHash),
    /// Integrity check failed.
    #[error("config hash {0} failed integrity validation")]
    Corrupted(ConfigHash),
    /// Underlying storage error.
    #[error("config store error: {0}")]
    Store(String),
}

/// A pure, idempotent mutator applied to a (possibly absent) config record.
///
/// The framework may invoke this multiple times on CAS conflict, so it
/// must not have side effects beyond its return value.
pub type ConfigMutator =
    Box<dyn Fn(Option<&VersionedConfigRecord>) -> Result<VersionedConfigRecord, ConfigStoreError> + Send + Sync>;

/// Distributed lease type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockType {
    /// Multiple readers may hold a shared lease concurrently.
    Shared,
    /// At most one exclusive lease per `config_hash` is active at a time
    ///.
    Exclusive,
}

/// A distributed lease on a `config_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLockLease {
    /// Lease identifier.
    pub id: String,
    /// Locked config hash.
    pub config_hash: ConfigHash,
    /// Lease type.
    pub lock_type: LockType,
    /// Opaque owner token, used to authorize release.
    pub owner_token: String,
    /// Lease acquisition time.
    pub acquired_at: Timestamp,
    /// Lease expiry; expired leases are considered released.
    pub expires_at: Timestamp,
}

/// The versioned, CAS-protected configuration store.
pub trait VersionedConfigStore: Send + Sync {
    /// Reads the current record for `hash`, if any. Never blocks on writers
    ///.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError`] on storage failure.
    fn get(&self, hash: &ConfigHash) -> Result<Option<VersionedConfigRecord>, ConfigStoreError>;

    /// Applies `mutator` to the current record under the distributed lease
    /// and a CAS on `version`, retrying locally up to `max_retries` times on
    /// CAS conflict.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::Contention`] when retries are exhausted,
    /// [`ConfigStoreError::Locked`] when the lease cannot be acquired, or
    /// [`ConfigStoreError::OffsetRegression`] when the mutator proposes a
    /// backward-moving offset.
    fn update_with_retry(
        &self,
        hash: &ConfigHash,
        owner_token: &str,
        mutator: ConfigMutator,
        max_retries: u32,
    ) -> Result<VersionedConfigRecord, ConfigStoreError>;

    /// Acquires a lease on `hash`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::Locked`] when an incompatible lease is
    /// already held.
    fn acquire_lock(
        &self,
        hash: &ConfigHash,
        lock_type: LockType,
        owner_token: &str,
        ttl: std::time::Duration,
    ) -> Result<ConfigLockLease, ConfigStoreError>;

    /// Releases a previously acquired lease.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::Store`] when the lease is not held by
    /// `owner_token`.
    fn release_lock(&self, lease_id: &str, owner_token: &str) -> Result<(), ConfigStoreError>;

    /// Reports whether `hash` currently has an active exclusive lease (spec
    /// §4.B `IsLocked`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError`] on storage failure.
    fn is_locked(&self, hash: &ConfigHash) -> Result<bool, ConfigStoreError>;
}

/// Consistency check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationResult {
    /// True when the record's shape matches the expected schema.
    pub structure_valid: bool,
    /// True when the checksum over `(version, last_offset,
    /// canonical(config_details))` matches.
    pub integrity_valid: bool,
}

/// Corruption detection result.
#[derive(Debug, Clone)]
pub struct CorruptionReport {
    /// True when corruption was detected.
    pub is_corrupted: bool,
    /// Human-readable detail, when corrupted.
    pub details: Option<String>,
}

/// Validates structural and integrity invariants of a config record.
pub trait ConsistencyValidator: Send + Sync {
    /// Validates `proposed` against the record currently stored for `hash`.
    fn validate(&self, hash: &ConfigHash, proposed: &VersionedConfigRecord) -> ValidationResult;

    /// Checks the currently stored record for `hash` for corruption.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError`] on storage failure.
    fn detect_corruption(&self, hash: &ConfigHash) -> Result<CorruptionReport, ConfigStoreError>;
}

// ============================================================================
// SECTION: Campaign Store (§4.D)
// ============================================================================

/// Persistence errors from the campaign store.
#[derive(Debug, Error)]
pub enum CampaignStoreError {
    /// Campaign does not exist.
    #[error("campaign {0} not found")]
    NotFound(CampaignId),
    /// An optimistic-concurrency write lost the race.
    #[error("campaign {0} was concurrently modified")]
    Conflict(CampaignId),
    /// Underlying storage error.
    #[error("campaign store error: {0}")]
    Store(String),
}

/// A generated domain row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDomain {
    /// Owning campaign.
    pub campaign_id: CampaignId,
    /// Unique, monotonically increasing index within the campaign.
    pub offset_index: u128,
    /// Generated domain name.
    pub domain_name: String,
    /// Generation timestamp.
    pub generated_at: Timestamp,
}

/// DNS validation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnsValidationStatus {
    /// Domain resolved.
    Resolved,
    /// Domain did not resolve.
    Unresolved,
    /// Resolution attempt errored.
    Error,
    /// Resolution has not completed yet.
    Pending,
}

/// A DNS validation result row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsResult {
    /// Owning campaign.
    pub campaign_id: CampaignId,
    /// Domain that was validated.
    pub domain_name: String,
    /// Validation outcome.
    pub status: DnsValidationStatus,
    /// Number of resolution attempts made.
    pub attempts: u32,
    /// Resolver persona identifier used.
    pub persona_id: Option<String>,
}

/// An HTTP keyword validation result row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResult {
    /// Owning campaign.
    pub campaign_id: CampaignId,
    /// Domain that was fetched.
    pub domain_name: String,
    /// HTTP status code of the fetch, if one was received.
    pub http_status: Option<u16>,
    /// Extracted page title, if any.
    pub page_title: Option<String>,
    /// Extracted content snippet, if any.
    pub extracted_snippet: Option<String>,
    /// Named keyword sets that matched.
    pub found_keywords_from_sets: Vec<String>,
    /// Ad-hoc keywords that matched.
    pub found_adhoc_keywords: Vec<String>,
    /// Terminal validation status for this domain.
    pub validation_status: DnsValidationStatus,
    /// Number of fetch attempts made.
    pub attempts: u32,
}

/// The transactional persistence contract for campaigns and their children
///. Each method is independently atomic; callers that need
/// multi-step atomicity use the dedicated composite methods below rather
/// than a raw connection/transaction handle.
pub trait CampaignStore: Send + Sync {
    /// Creates a campaign together with its phase-1 parameters in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn create_campaign(&self, campaign: Campaign) -> Result<Campaign, CampaignStoreError>;

    /// Loads a campaign by id.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>, CampaignStoreError>;

    /// Lists campaigns, optionally restricted to `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn list_campaigns(
        &self,
        owner: Option<crate::core::identifiers::OwnerId>,
    ) -> Result<Vec<Campaign>, CampaignStoreError>;

    /// Persists `campaign` using optimistic concurrency on `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError::Conflict`] if `campaign.updated_at`
    /// does not match the stored row's current value.
    fn save_campaign(&self, campaign: Campaign) -> Result<Campaign, CampaignStoreError>;

    /// Deletes campaigns and cascades to all child records and unclaimed
    /// jobs.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn bulk_delete(&self, ids: &[CampaignId]) -> Result<(), CampaignStoreError>;

    /// Updates aggregate progress monotonically: `processed` and `pct` may
    /// only increase, except when `reset` is set on a rerun.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn update_campaign_progress(
        &self,
        id: CampaignId,
        processed: u64,
        total: u64,
        pct: u8,
        reset: bool,
    ) -> Result<(), CampaignStoreError>;

    /// Updates `phase`'s status, routing the transition through the state
    /// machine and reflecting it onto the campaign's aggregate columns
    ///.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn update_phase_status(
        &self,
        id: CampaignId,
        phase: Phase,
        status: PhaseStatus,
    ) -> Result<(), CampaignStoreError>;

    /// Inserts generated domains, batch-idempotent on
    /// `(campaign_id, offset_index)`.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn insert_generated_domains(
        &self,
        domains: &[GeneratedDomain],
    ) -> Result<(), CampaignStoreError>;

    /// Counts generated domains for a campaign.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn count_generated_domains(&self, id: CampaignId) -> Result<u64, CampaignStoreError>;

    /// Lists generated domains lacking a terminal DNS result (or pending).
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn domains_needing_dns(
        &self,
        id: CampaignId,
        limit: usize,
    ) -> Result<Vec<GeneratedDomain>, CampaignStoreError>;

    /// Upserts a DNS result, batch-idempotent on
    /// `(campaign_id, domain_name)`.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn upsert_dns_result(&self, result: DnsResult) -> Result<(), CampaignStoreError>;

    /// Counts DNS results with a terminal status for a campaign.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn count_dns_terminal(&self, id: CampaignId) -> Result<u64, CampaignStoreError>;

    /// Lists DNS-resolved domains lacking a terminal HTTP result.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn domains_needing_http(
        &self,
        id: CampaignId,
        limit: usize,
    ) -> Result<Vec<String>, CampaignStoreError>;

    /// Upserts an HTTP result, batch-idempotent on
    /// `(campaign_id, domain_name)`.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn upsert_http_result(&self, result: HttpResult) -> Result<(), CampaignStoreError>;

    /// Lists all HTTP results for a campaign (analysis input).
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn list_http_results(&self, id: CampaignId) -> Result<Vec<HttpResult>, CampaignStoreError>;

    /// Persists the single analysis results JSON blob for a campaign (spec
    /// §4.G.4).
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn save_analysis_results(
        &self,
        id: CampaignId,
        results: serde_json::Value,
    ) -> Result<(), CampaignStoreError>;

    /// Returns the persisted analysis summary, or `None` if the analysis
    /// phase has not completed a batch yet.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn get_analysis_results(&self, id: CampaignId) -> Result<Option<serde_json::Value>, CampaignStoreError>;

    /// Lists generated domains ordered by offset, page by page. `after`
    /// excludes everything up to and including that offset.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn list_generated_domains(
        &self,
        id: CampaignId,
        after: Option<u128>,
        limit: usize,
    ) -> Result<Vec<GeneratedDomain>, CampaignStoreError>;

    /// Lists DNS results ordered by domain name, page by page. `after`
    /// excludes every domain name up to and including it.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn list_dns_results(
        &self,
        id: CampaignId,
        after: Option<String>,
        limit: usize,
    ) -> Result<Vec<DnsResult>, CampaignStoreError>;

    /// Lists HTTP results ordered by domain name, page by page. `after`
    /// excludes every domain name up to and including it.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn list_http_results_page(
        &self,
        id: CampaignId,
        after: Option<String>,
        limit: usize,
    ) -> Result<Vec<HttpResult>, CampaignStoreError>;

    /// Enqueues a pending job for `phase`.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn enqueue_job(&self, campaign_id: CampaignId, phase: Phase) -> Result<JobId, CampaignStoreError>;

    /// Atomically claims one pending job, marking it `in_progress` with
    /// `worker_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn claim_job(&self, worker_id: &str) -> Result<Option<CampaignJob>, CampaignStoreError>;

    /// Marks a job completed.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn complete_job(&self, id: JobId) -> Result<(), CampaignStoreError>;

    /// Refreshes the heartbeat timestamp on an in-progress job so the reaper
    /// does not mistake a slow batch for a crashed worker.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn heartbeat_job(&self, id: JobId, worker_id: &str) -> Result<(), CampaignStoreError>;

    /// Records a failed attempt, rescheduling with the given backoff unless
    /// `attempts` has exhausted `max_attempts`.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn fail_job_attempt(
        &self,
        id: JobId,
        error: &str,
        backoff: std::time::Duration,
        max_attempts: u32,
    ) -> Result<(), CampaignStoreError>;

    /// Reinserts a continuation job (more batches remain).
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn requeue_continuation(&self, id: JobId) -> Result<(), CampaignStoreError>;

    /// Reaps jobs whose worker heartbeat is stale, marking them `pending`
    /// again.
    ///
    /// # Errors
    ///
    /// Returns [`CampaignStoreError`] on storage failure.
    fn reap_stale_jobs(&self, stale_after: std::time::Duration) -> Result<u64, CampaignStoreError>;
}

// ============================================================================
// SECTION: Event Sink (§4.H)
// ============================================================================

/// Errors from the event stream.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Underlying storage error.
    #[error("event store error: {0}")]
    Store(String),
}

/// Appends and replays the per-campaign ordered event stream.
pub trait EventSink: Send + Sync {
    /// Appends an event, assigning the next monotone sequence number for
    /// `campaign_id` at commit time.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError`] on storage failure.
    fn append(
        &self,
        campaign_id: CampaignId,
        event_type: EventType,
        phase: Option<Phase>,
        payload: EventPayload,
    ) -> Result<PhaseEvent, EventStoreError>;

    /// Replays events with `sequence > since` in order.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError`] on storage failure.
    fn replay(
        &self,
        campaign_id: CampaignId,
        since: Option<Sequence>,
    ) -> Result<Vec<PhaseEvent>, EventStoreError>;
}

// ============================================================================
// SECTION: External Validators (§4.G.2, §4.G.3)
// ============================================================================

/// DNS validation outcome returned by a [`DnsValidator`].
#[derive(Debug, Clone)]
pub struct DnsProbeOutcome {
    /// Resulting validation status.
    pub status: DnsValidationStatus,
    /// Persona used for this probe, if any.
    pub persona_id: Option<String>,
}

/// External DNS validator seam. Implementations are external
/// collaborators; this crate only defines the contract.
pub trait DnsValidator: Send + Sync {
    /// Probes `domain` and returns its validation outcome.
    ///
    /// # Errors
    ///
    /// Returns a message describing a transient probe failure (retryable by
    /// the caller).
    fn probe(&self, domain: &str, persona_id: Option<&str>) -> Result<DnsProbeOutcome, String>;
}

/// HTTP fetch + keyword-match outcome returned by an [`HttpKeywordValidator`].
#[derive(Debug, Clone)]
pub struct HttpProbeOutcome {
    /// HTTP status code received, if any.
    pub http_status: Option<u16>,
    /// Extracted page title.
    pub page_title: Option<String>,
    /// Extracted content snippet.
    pub extracted_snippet: Option<String>,
    /// Named keyword sets that matched.
    pub found_keywords_from_sets: Vec<String>,
    /// Ad-hoc keywords that matched.
    pub found_adhoc_keywords: Vec<String>,
    /// Resulting validation status.
    pub status: DnsValidationStatus,
}

/// External HTTP keyword validator seam.
pub trait HttpKeywordValidator: Send + Sync {
    /// Fetches `domain` and matches its content against `keyword_sets` and
    /// `adhoc_keywords`.
    ///
    /// # Errors
    ///
    /// Returns a message describing a transient fetch failure (retryable by
    /// the caller).
    fn fetch_and_match(
        &self,
        domain: &str,
        persona_id: Option<&str>,
        keyword_sets: &[Vec<String>],
        adhoc_keywords: &[String],
    ) -> Result<HttpProbeOutcome, String>;
}

/// Stealth shuffling contract: if applied, shuffling must preserve the
/// progress-tracking guarantees via original offsets. The default identity
/// shuffler satisfies this
/// trivially.
pub trait DomainShuffler: Send + Sync {
    /// Returns `domains` in the order they should be probed, preserving the
    /// original offsets for progress tracking even if the visitation order
    /// changes.
    fn shuffle(&self, domains: Vec<String>) -> Vec<String>;
}

/// Identity shuffler: preserves input order.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityShuffler;

impl DomainShuffler for IdentityShuffler {
    fn shuffle(&self, domains: Vec<String>) -> Vec<String> {
        domains
    }
}

// ============================================================================
// SECTION: Telemetry (ambient stack)
// ============================================================================

/// Outcome classification for a telemetry event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Operation succeeded.
    Ok,
    /// Operation failed.
    Error,
}

/// A single orchestrator metric observation.
#[derive(Debug, Clone)]
pub struct MetricEvent {
    /// Operation name (e.g. `"start_phase"`, `"claim_job"`).
    pub operation: &'static str,
    /// Outcome classification.
    pub outcome: Outcome,
    /// Observed latency, if measured.
    pub latency: Option<std::time::Duration>,
}

/// Dependency-light metrics sink: an intentionally thin telemetry seam so
/// deployments can plug in Prometheus or OpenTelemetry without redesigning
/// this trait.
pub trait Metrics: Send + Sync {
    /// Records a metric observation.
    fn record(&self, event: MetricEvent);
}

/// No-op metrics sink (default).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn record(&self, _event: MetricEvent) {}
}

/// An audit-log entry for a lifecycle operation.
#[derive(Clone)]
pub struct AuditEvent {
    /// Campaign the event concerns.
    pub campaign_id: CampaignId,
    /// Operation performed.
    pub operation: &'static str,
    /// Caller identifier, when known.
    pub actor: Option<String>,
    /// Outcome classification.
    pub outcome: Outcome,
    /// Event timestamp.
    pub timestamp: Timestamp,
}

/// Audit sink for lifecycle operations. Out of scope here are audit/log
/// sink *backends*, not the seam itself.
pub trait AuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: AuditEvent);
}

/// No-op audit sink (default for tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

/// Audit sink that writes one line per event to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrAuditSink;

impl fmt::Debug for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditEvent")
            .field("campaign_id", &self.campaign_id)
            .field("operation", &self.operation)
            .field("actor", &self.actor)
            .finish()
    }
}

impl AuditSink for StderrAuditSink {
    #[allow(clippy::print_stderr, reason = "This sink's entire purpose is writing to stderr.")]
    fn record(&self, event: AuditEvent) {
        eprintln!(
            "audit campaign={} operation={} actor={} outcome={:?}",
            event.campaign_id,
            event.operation,
            event.actor.as_deref().unwrap_or("-"),
            event.outcome
        );
    }
}
