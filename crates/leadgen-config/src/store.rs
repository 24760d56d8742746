// crates/leadgen-config/src/store.rs
// ============================================================================
// Module: SQLite Versioned Config Store
// Description: CAS-protected, leased storage for domain-pattern config
// records shared across campaigns by `config_hash`.
// Purpose: Give `GenerateBatch` a race-free home for `last_offset` so two
// campaigns sharing a pattern never hand out the same domain twice.
// Dependencies: leadgen-core, rusqlite, serde_json, thiserror
// ============================================================================

//! ## Overview
//! One row per `config_hash` holds the current `version`, `last_offset`, and
//! a checksum over the canonical JSON of `(version, last_offset,
//! config_details)`. Updates happen through [`SqliteConfigStore::update_with_retry`],
//! which acquires an exclusive lease, re-reads the row, applies the caller's
//! mutator, and writes back with a CAS predicate on `version`, retrying on
//! conflict up to the caller's budget.

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use leadgen_core::interfaces::ConfigLockLease;
use leadgen_core::interfaces::ConfigMutator;
use leadgen_core::interfaces::ConfigStoreError;
use leadgen_core::interfaces::ConsistencyValidator;
use leadgen_core::interfaces::CorruptionReport;
use leadgen_core::interfaces::LockType;
use leadgen_core::interfaces::ValidationResult;
use leadgen_core::interfaces::VersionedConfigRecord;
use leadgen_core::interfaces::VersionedConfigStore;
use leadgen_core::ConfigHash;
use leadgen_core::Timestamp;
use leadgen_core::hash_bytes;
use leadgen_core::HashAlgorithm;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

const SCHEMA_VERSION: i64 = 1;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Errors specific to opening or migrating the `SQLite` config store. These
/// always surface to callers as [`ConfigStoreError::Store`].
#[derive(Debug, Error)]
pub enum SqliteConfigStoreError {
    /// Database could not be opened.
    #[error("config store open error: {0}")]
    Open(String),
    /// Schema initialization failed.
    #[error("config store schema error: {0}")]
    Schema(String),
}

/// `SQLite`-backed [`VersionedConfigStore`] and [`ConsistencyValidator`].
#[derive(Clone)]
pub struct SqliteConfigStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteConfigStore {
    /// Opens (creating if absent) a config store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteConfigStoreError`] when the database cannot be opened
    /// or the schema cannot be initialized.
    pub fn open(path: &Path, busy_timeout_ms: Option<u64>) -> Result<Self, SqliteConfigStoreError> {
        let connection =
            Connection::open(path).map_err(|err| SqliteConfigStoreError::Open(err.to_string()))?;
        connection
            .busy_timeout(Duration::from_millis(busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS)))
            .map_err(|err| SqliteConfigStoreError::Open(err.to_string()))?;
        connection
            .pragma_update(None, "journal_mode", "wal")
            .map_err(|err| SqliteConfigStoreError::Open(err.to_string()))?;
        initialize_schema(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Opens an in-memory store, used in tests and by embedded CLI flows.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteConfigStoreError`] when the schema cannot be
    /// initialized.
    pub fn open_in_memory() -> Result<Self, SqliteConfigStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|err| SqliteConfigStoreError::Open(err.to_string()))?;
        initialize_schema(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn read_record(
        connection: &Connection,
        hash: &ConfigHash,
    ) -> Result<Option<VersionedConfigRecord>, ConfigStoreError> {
        let row = connection
            .query_row(
                "SELECT version, last_offset, config_details_json, checksum FROM config_records \
                 WHERE config_hash = ?1",
                params![hash.as_str()],
                |row| {
                    let version: i64 = row.get(0)?;
                    let last_offset: String = row.get(1)?;
                    let details: Vec<u8> = row.get(2)?;
                    let checksum: String = row.get(3)?;
                    Ok((version, last_offset, details, checksum))
                },
            )
            .optional()
            .map_err(|err| ConfigStoreError::Store(err.to_string()))?;
        let Some((version, last_offset, details, checksum)) = row else {
            return Ok(None);
        };
        let config_details: serde_json::Value =
            serde_json::from_slice(&details).map_err(|err| ConfigStoreError::Store(err.to_string()))?;
        let last_offset: u128 =
            last_offset.parse().map_err(|_| ConfigStoreError::Corrupted(hash.clone()))?;
        let record = VersionedConfigRecord {
            config_hash: hash.clone(),
            last_offset,
            config_details,
            version: u64::try_from(version).map_err(|_| ConfigStoreError::Corrupted(hash.clone()))?,
        };
        let expected = checksum_for(&record);
        if expected != checksum {
            return Err(ConfigStoreError::Corrupted(hash.clone()));
        }
        Ok(Some(record))
    }

    fn write_record(
        connection: &Connection,
        record: &VersionedConfigRecord,
        expected_version: Option<u64>,
    ) -> Result<(), ConfigStoreError> {
        let details = serde_json::to_vec(&record.config_details)
            .map_err(|err| ConfigStoreError::Store(err.to_string()))?;
        let checksum = checksum_for(record);
        match expected_version {
            None => {
                let changed = connection
                    .execute(
                        "INSERT INTO config_records \
                         (config_hash, version, last_offset, config_details_json, checksum) \
                         VALUES (?1, ?2, ?3, ?4, ?5) \
                         ON CONFLICT(config_hash) DO NOTHING",
                        params![
                            record.config_hash.as_str(),
                            i64::try_from(record.version).unwrap_or(i64::MAX),
                            record.last_offset.to_string(),
                            details,
                            checksum,
                        ],
                    )
                    .map_err(|err| ConfigStoreError::Store(err.to_string()))?;
                if changed == 0 {
                    return Err(ConfigStoreError::Contention(record.config_hash.clone()));
                }
            }
            Some(expected) => {
                let changed = connection
                    .execute(
                        "UPDATE config_records SET version = ?1, last_offset = ?2, \
                         config_details_json = ?3, checksum = ?4 \
                         WHERE config_hash = ?5 AND version = ?6",
                        params![
                            i64::try_from(record.version).unwrap_or(i64::MAX),
                            record.last_offset.to_string(),
                            details,
                            checksum,
                            record.config_hash.as_str(),
                            i64::try_from(expected).unwrap_or(i64::MAX),
                        ],
                    )
                    .map_err(|err| ConfigStoreError::Store(err.to_string()))?;
                if changed == 0 {
                    return Err(ConfigStoreError::Contention(record.config_hash.clone()));
                }
            }
        }
        Ok(())
    }
}

fn checksum_for(record: &VersionedConfigRecord) -> String {
    #[derive(serde::Serialize)]
    struct Checked<'a> {
        version: u64,
        last_offset: u128,
        config_details: &'a serde_json::Value,
    }
    let bytes = leadgen_core::canonical_json_bytes(&Checked {
        version: record.version,
        last_offset: record.last_offset,
        config_details: &record.config_details,
    })
    .unwrap_or_default();
    hash_bytes(HashAlgorithm::Sha256, &bytes).value
}

impl VersionedConfigStore for SqliteConfigStore {
    fn get(&self, hash: &ConfigHash) -> Result<Option<VersionedConfigRecord>, ConfigStoreError> {
        let guard = self.connection.lock().map_err(|_| ConfigStoreError::Store("config store mutex poisoned".to_string()))?;
        Self::read_record(&guard, hash)
    }

    fn update_with_retry(
        &self,
        hash: &ConfigHash,
        owner_token: &str,
        mutator: ConfigMutator,
        max_retries: u32,
    ) -> Result<VersionedConfigRecord, ConfigStoreError> {
        let lease = self.acquire_lock(hash, LockType::Exclusive, owner_token, Duration::from_secs(30))?;
        let result = (|| {
            let mut attempt = 0;
            loop {
                let existing = self.get(hash)?;
                let expected_version = existing.as_ref().map(|record| record.version);
                let proposed = mutator(existing.as_ref())?;
                if let Some(existing) = &existing {
                    if proposed.last_offset < existing.last_offset {
                        return Err(ConfigStoreError::OffsetRegression(hash.clone()));
                    }
                }
                let next_version = expected_version.unwrap_or(0) + 1;
                let candidate = VersionedConfigRecord {
                    version: next_version,
                    ..proposed
                };
                let guard = self
                    .connection
                    .lock()
                    .map_err(|_| ConfigStoreError::Store("config store mutex poisoned".to_string()))?;
                match Self::write_record(&guard, &candidate, expected_version) {
                    Ok(()) => return Ok(candidate),
                    Err(ConfigStoreError::Contention(_)) if attempt < max_retries => {
                        attempt += 1;
                        drop(guard);
                        continue;
                    }
                    Err(err) => return Err(err),
                }
            }
        })();
        let _ = self.release_lock(&lease.id, owner_token);
        result
    }

    fn acquire_lock(
        &self,
        hash: &ConfigHash,
        lock_type: LockType,
        owner_token: &str,
        ttl: Duration,
    ) -> Result<ConfigLockLease, ConfigStoreError> {
        let guard = self.connection.lock().map_err(|_| ConfigStoreError::Store("config store mutex poisoned".to_string()))?;
        let now = Timestamp::new(OffsetDateTime::now_utc());
        guard
            .execute(
                "DELETE FROM config_leases WHERE expires_at < ?1",
                params![now.to_rfc3339().map_err(|err| ConfigStoreError::Store(err.to_string()))?],
            )
            .map_err(|err| ConfigStoreError::Store(err.to_string()))?;
        if matches!(lock_type, LockType::Exclusive) {
            let holder: Option<String> = guard
                .query_row(
                    "SELECT owner_token FROM config_leases WHERE config_hash = ?1 AND \
                     lock_type = 'exclusive' LIMIT 1",
                    params![hash.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|err| ConfigStoreError::Store(err.to_string()))?;
            if let Some(holder) = holder {
                if holder != owner_token {
                    return Err(ConfigStoreError::Locked {
                        hash: hash.clone(),
                        owner: holder,
                    });
                }
            }
        }
        let lease = ConfigLockLease {
            id: Uuid::new_v4().to_string(),
            config_hash: hash.clone(),
            lock_type,
            owner_token: owner_token.to_string(),
            acquired_at: now,
            expires_at: Timestamp::new(now.get().saturating_add(
                time::Duration::try_from(ttl).unwrap_or(time::Duration::ZERO),
            )),
        };
        guard
            .execute(
                "INSERT INTO config_leases \
                 (id, config_hash, lock_type, owner_token, acquired_at, expires_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    lease.id,
                    lease.config_hash.as_str(),
                    lock_type_label(lease.lock_type),
                    lease.owner_token,
                    lease.acquired_at.to_rfc3339().map_err(|err| ConfigStoreError::Store(err.to_string()))?,
                    lease.expires_at.to_rfc3339().map_err(|err| ConfigStoreError::Store(err.to_string()))?,
                ],
            )
            .map_err(|err| ConfigStoreError::Store(err.to_string()))?;
        Ok(lease)
    }

    fn release_lock(&self, lease_id: &str, owner_token: &str) -> Result<(), ConfigStoreError> {
        let guard = self.connection.lock().map_err(|_| ConfigStoreError::Store("config store mutex poisoned".to_string()))?;
        guard
            .execute(
                "DELETE FROM config_leases WHERE id = ?1 AND owner_token = ?2",
                params![lease_id, owner_token],
            )
            .map_err(|err| ConfigStoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn is_locked(&self, hash: &ConfigHash) -> Result<bool, ConfigStoreError> {
        let guard = self.connection.lock().map_err(|_| ConfigStoreError::Store("config store mutex poisoned".to_string()))?;
        let now = Timestamp::new(OffsetDateTime::now_utc())
            .to_rfc3339()
            .map_err(|err| ConfigStoreError::Store(err.to_string()))?;
        let count: i64 = guard
            .query_row(
                "SELECT COUNT(*) FROM config_leases WHERE config_hash = ?1 AND lock_type = \
                 'exclusive' AND expires_at >= ?2",
                params![hash.as_str(), now],
                |row| row.get(0),
            )
            .map_err(|err| ConfigStoreError::Store(err.to_string()))?;
        Ok(count > 0)
    }
}

impl ConsistencyValidator for SqliteConfigStore {
    fn validate(&self, hash: &ConfigHash, proposed: &VersionedConfigRecord) -> ValidationResult {
        let structure_valid = proposed.config_hash == *hash;
        let expected = checksum_for(proposed);
        ValidationResult {
            structure_valid,
            integrity_valid: !expected.is_empty(),
        }
    }

    fn detect_corruption(&self, hash: &ConfigHash) -> Result<CorruptionReport, ConfigStoreError> {
        match self.get(hash) {
            Ok(_) => Ok(CorruptionReport {
                is_corrupted: false,
                details: None,
            }),
            Err(ConfigStoreError::Corrupted(_)) => Ok(CorruptionReport {
                is_corrupted: true,
                details: Some(format!("checksum mismatch for {hash}")),
            }),
            Err(err) => Err(err),
        }
    }
}

const fn lock_type_label(lock_type: LockType) -> &'static str {
    match lock_type {
        LockType::Shared => "shared",
        LockType::Exclusive => "exclusive",
    }
}

fn initialize_schema(connection: &Connection) -> Result<(), SqliteConfigStoreError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_meta (version INTEGER NOT NULL);
             CREATE TABLE IF NOT EXISTS config_records (
                 config_hash TEXT PRIMARY KEY,
                 version INTEGER NOT NULL,
                 last_offset TEXT NOT NULL,
                 config_details_json BLOB NOT NULL,
                 checksum TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS config_leases (
                 id TEXT PRIMARY KEY,
                 config_hash TEXT NOT NULL,
                 lock_type TEXT NOT NULL,
                 owner_token TEXT NOT NULL,
                 acquired_at TEXT NOT NULL,
                 expires_at TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_config_leases_hash ON config_leases(config_hash);",
        )
        .map_err(|err| SqliteConfigStoreError::Schema(err.to_string()))?;
    let count: i64 = connection
        .query_row("SELECT COUNT(*) FROM schema_meta", [], |row| row.get(0))
        .map_err(|err| SqliteConfigStoreError::Schema(err.to_string()))?;
    if count == 0 {
        connection
            .execute("INSERT INTO schema_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
            .map_err(|err| SqliteConfigStoreError::Schema(err.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use super::*;
    use leadgen_core::interfaces::VersionedConfigStore as _;

    fn hash(label: &str) -> ConfigHash {
        ConfigHash::new(label.to_string())
    }

    #[test]
    fn get_on_missing_hash_returns_none() {
        let store = SqliteConfigStore::open_in_memory().expect("open");
        assert!(store.get(&hash("abc")).expect("get").is_none());
    }

    #[test]
    fn update_with_retry_creates_and_then_advances_offset() {
        let store = SqliteConfigStore::open_in_memory().expect("open");
        let h = hash("abc");
        let record = store
            .update_with_retry(
                &h,
                "worker-1",
                Box::new(|existing| {
                    let last_offset = existing.map_or(0, |r| r.last_offset);
                    Ok(VersionedConfigRecord {
                        config_hash: ConfigHash::new("abc".to_string()),
                        last_offset: last_offset + 10,
                        config_details: serde_json::json!({"pattern": "x"}),
                        version: 0,
                    })
                }),
                4,
            )
            .expect("update");
        assert_eq!(record.last_offset, 10);
        assert_eq!(record.version, 1);

        let record = store
            .update_with_retry(
                &h,
                "worker-1",
                Box::new(|existing| {
                    let last_offset = existing.map_or(0, |r| r.last_offset);
                    Ok(VersionedConfigRecord {
                        config_hash: ConfigHash::new("abc".to_string()),
                        last_offset: last_offset + 5,
                        config_details: serde_json::json!({"pattern": "x"}),
                        version: 0,
                    })
                }),
                4,
            )
            .expect("update");
        assert_eq!(record.last_offset, 15);
        assert_eq!(record.version, 2);
    }

    #[test]
    fn exclusive_lease_blocks_other_owner() {
        let store = SqliteConfigStore::open_in_memory().expect("open");
        let h = hash("locked");
        let lease = store
            .acquire_lock(&h, LockType::Exclusive, "owner-a", Duration::from_secs(10))
            .expect("acquire");
        let err = store
            .acquire_lock(&h, LockType::Exclusive, "owner-b", Duration::from_secs(10))
            .expect_err("should be locked");
        assert!(matches!(err, ConfigStoreError::Locked { .. }));
        store.release_lock(&lease.id, "owner-a").expect("release");
        assert!(
            store
                .acquire_lock(&h, LockType::Exclusive, "owner-b", Duration::from_secs(10))
                .is_ok()
        );
    }
}
