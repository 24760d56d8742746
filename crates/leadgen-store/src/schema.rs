// crates/leadgen-store/src/schema.rs
// ============================================================================
// Module: Schema
// Description: SQLite DDL for campaigns and their child records.
// Purpose: Keep the schema in one file so migrations stay reviewable.
// Dependencies: rusqlite
// ============================================================================

use rusqlite::Connection;

const SCHEMA_VERSION: i64 = 1;

const DDL: &str = "
CREATE TABLE IF NOT EXISTS schema_meta (version INTEGER NOT NULL);

CREATE TABLE IF NOT EXISTS campaigns (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    owner TEXT,
    campaign_type TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    current_phase TEXT,
    phase_status TEXT NOT NULL,
    total_phases INTEGER NOT NULL,
    completed_phases INTEGER NOT NULL,
    overall_progress INTEGER NOT NULL,
    started_at TEXT,
    completed_at TEXT,
    error_message TEXT,
    metadata_json BLOB NOT NULL,
    auto_advance INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_campaigns_owner ON campaigns(owner);

CREATE TABLE IF NOT EXISTS generated_domains (
    campaign_id TEXT NOT NULL,
    offset_index TEXT NOT NULL,
    domain_name TEXT NOT NULL,
    generated_at TEXT NOT NULL,
    PRIMARY KEY (campaign_id, offset_index)
);

CREATE TABLE IF NOT EXISTS dns_results (
    campaign_id TEXT NOT NULL,
    domain_name TEXT NOT NULL,
    status TEXT NOT NULL,
    attempts INTEGER NOT NULL,
    persona_id TEXT,
    PRIMARY KEY (campaign_id, domain_name)
);

CREATE TABLE IF NOT EXISTS http_results (
    campaign_id TEXT NOT NULL,
    domain_name TEXT NOT NULL,
    http_status INTEGER,
    page_title TEXT,
    extracted_snippet TEXT,
    found_keywords_from_sets_json BLOB NOT NULL,
    found_adhoc_keywords_json BLOB NOT NULL,
    validation_status TEXT NOT NULL,
    attempts INTEGER NOT NULL,
    PRIMARY KEY (campaign_id, domain_name)
);

CREATE TABLE IF NOT EXISTS analysis_results (
    campaign_id TEXT PRIMARY KEY,
    results_json BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS campaign_jobs (
    id TEXT PRIMARY KEY,
    campaign_id TEXT NOT NULL,
    phase_type TEXT NOT NULL,
    status TEXT NOT NULL,
    next_attempt_at TEXT NOT NULL,
    attempts INTEGER NOT NULL,
    last_error TEXT,
    worker_id TEXT,
    heartbeat_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_campaign_jobs_claimable ON campaign_jobs(status, next_attempt_at);
";

/// Creates the schema if absent and records the current schema version.
///
/// # Errors
///
/// Returns a `rusqlite::Error` if any DDL statement fails.
pub fn initialize(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute_batch(DDL)?;
    let count: i64 = connection.query_row("SELECT COUNT(*) FROM schema_meta", [], |row| row.get(0))?;
    if count == 0 {
        connection.execute("INSERT INTO schema_meta (version) VALUES (?1)", [SCHEMA_VERSION])?;
    }
    Ok(())
}
