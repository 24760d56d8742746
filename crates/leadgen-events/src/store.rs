// crates/leadgen-events/src/store.rs
// ============================================================================
// Module: SQLite Event Store
// Description: Durable, sequenced per-campaign event log.
// Purpose: Implement EventSink with the same guarded-connection pattern used
// by the other persistence crates in this workspace.
// Dependencies: leadgen-core, rusqlite
// ============================================================================

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use leadgen_core::CampaignId;
use leadgen_core::EventPayload;
use leadgen_core::EventType;
use leadgen_core::Phase;
use leadgen_core::PhaseEvent;
use leadgen_core::Sequence;
use leadgen_core::Timestamp;
use leadgen_core::interfaces::EventSink;
use leadgen_core::interfaces::EventStoreError;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

const DDL: &str = "
CREATE TABLE IF NOT EXISTS phase_events (
    campaign_id TEXT NOT NULL,
    sequence INTEGER NOT NULL,
    id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    phase TEXT,
    timestamp TEXT NOT NULL,
    payload_json BLOB NOT NULL,
    PRIMARY KEY (campaign_id, sequence)
);
";

/// Errors specific to opening the event store.
#[derive(Debug, Error)]
pub enum SqliteEventStoreError {
    /// Database could not be opened.
    #[error("event store open error: {0}")]
    Open(String),
    /// Schema initialization failed.
    #[error("event store schema error: {0}")]
    Schema(String),
}

/// `SQLite`-backed, sequence-numbered event log.
#[derive(Clone)]
pub struct SqliteEventStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteEventStore {
    /// Opens (creating if absent) an event store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteEventStoreError`] when the database cannot be opened
    /// or the schema cannot be initialized.
    pub fn open(path: &Path) -> Result<Self, SqliteEventStoreError> {
        let connection =
            Connection::open(path).map_err(|err| SqliteEventStoreError::Open(err.to_string()))?;
        connection
            .busy_timeout(Duration::from_millis(5_000))
            .map_err(|err| SqliteEventStoreError::Open(err.to_string()))?;
        connection
            .pragma_update(None, "journal_mode", "wal")
            .map_err(|err| SqliteEventStoreError::Open(err.to_string()))?;
        connection.execute_batch(DDL).map_err(|err| SqliteEventStoreError::Schema(err.to_string()))?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Opens an in-memory store, used in tests.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteEventStoreError`] when the schema cannot be
    /// initialized.
    pub fn open_in_memory() -> Result<Self, SqliteEventStoreError> {
        let connection = Connection::open_in_memory()
            .map_err(|err| SqliteEventStoreError::Open(err.to_string()))?;
        connection.execute_batch(DDL).map_err(|err| SqliteEventStoreError::Schema(err.to_string()))?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }
}

fn event_type_label(event_type: EventType) -> &'static str {
    match event_type {
        EventType::PhaseStateChanged => "phase_state_changed",
        EventType::PhaseConfigurationRequired => "phase_configuration_required",
        EventType::CampaignPhaseTransition => "campaign_phase_transition",
        EventType::CampaignProgress => "campaign_progress",
        EventType::DomainGenerated => "domain_generated",
        EventType::PhaseProgress => "phase_progress",
        EventType::CampaignCompleted => "campaign_completed",
        EventType::CampaignCancelled => "campaign_cancelled",
        EventType::CampaignError => "campaign_error",
    }
}

fn parse_event_type(value: &str) -> Result<EventType, EventStoreError> {
    match value {
        "phase_state_changed" => Ok(EventType::PhaseStateChanged),
        "phase_configuration_required" => Ok(EventType::PhaseConfigurationRequired),
        "campaign_phase_transition" => Ok(EventType::CampaignPhaseTransition),
        "campaign_progress" => Ok(EventType::CampaignProgress),
        "domain_generated" => Ok(EventType::DomainGenerated),
        "phase_progress" => Ok(EventType::PhaseProgress),
        "campaign_completed" => Ok(EventType::CampaignCompleted),
        "campaign_cancelled" => Ok(EventType::CampaignCancelled),
        "campaign_error" => Ok(EventType::CampaignError),
        other => Err(EventStoreError::Store(format!("unknown event type: {other}"))),
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Generation => "generation",
        Phase::Dns => "dns",
        Phase::Http => "http",
        Phase::Analysis => "analysis",
    }
}

fn parse_phase(value: &str) -> Result<Phase, EventStoreError> {
    match value {
        "generation" => Ok(Phase::Generation),
        "dns" => Ok(Phase::Dns),
        "http" => Ok(Phase::Http),
        "analysis" => Ok(Phase::Analysis),
        other => Err(EventStoreError::Store(format!("unknown phase: {other}"))),
    }
}

impl EventSink for SqliteEventStore {
    fn append(
        &self,
        campaign_id: CampaignId,
        event_type: EventType,
        phase: Option<Phase>,
        payload: EventPayload,
    ) -> Result<PhaseEvent, EventStoreError> {
        let connection = self.connection.lock().map_err(|_| EventStoreError::Store("event store mutex poisoned".to_string()))?;
        let next_sequence: i64 = connection
            .query_row(
                "SELECT COALESCE(MAX(sequence), 0) + 1 FROM phase_events WHERE campaign_id = ?1",
                params![campaign_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|err| EventStoreError::Store(err.to_string()))?;
        let id = Uuid::new_v4();
        let timestamp = Timestamp::new(OffsetDateTime::now_utc());
        let timestamp_text = timestamp.to_rfc3339().map_err(|err| EventStoreError::Store(err.to_string()))?;
        connection
            .execute(
                "INSERT INTO phase_events (campaign_id, sequence, id, event_type, phase, \
                 timestamp, payload_json) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    campaign_id.to_string(),
                    next_sequence,
                    id.to_string(),
                    event_type_label(event_type),
                    phase.map(phase_label),
                    timestamp_text,
                    serde_json::to_vec(&payload).map_err(|err| EventStoreError::Store(err.to_string()))?,
                ],
            )
            .map_err(|err| EventStoreError::Store(err.to_string()))?;
        Ok(PhaseEvent {
            id,
            event_type,
            campaign_id,
            sequence: Sequence::new(next_sequence),
            phase,
            timestamp,
            payload,
        })
    }

    fn replay(&self, campaign_id: CampaignId, since: Option<Sequence>) -> Result<Vec<PhaseEvent>, EventStoreError> {
        let connection = self.connection.lock().map_err(|_| EventStoreError::Store("event store mutex poisoned".to_string()))?;
        let floor = since.map_or(0, Sequence::get);
        let mut statement = connection
            .prepare(
                "SELECT campaign_id, sequence, id, event_type, phase, timestamp, payload_json \
                 FROM phase_events WHERE campaign_id = ?1 AND sequence > ?2 ORDER BY sequence",
            )
            .map_err(|err| EventStoreError::Store(err.to_string()))?;
        let rows = statement
            .query_map(params![campaign_id.to_string(), floor], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Vec<u8>>(6)?,
                ))
            })
            .map_err(|err| EventStoreError::Store(err.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| EventStoreError::Store(err.to_string()))?;
        rows.into_iter()
            .map(|(_campaign_id, sequence, id, event_type, phase, timestamp, payload_json)| {
                Ok(PhaseEvent {
                    id: Uuid::parse_str(&id).map_err(|err| EventStoreError::Store(err.to_string()))?,
                    event_type: parse_event_type(&event_type)?,
                    campaign_id,
                    sequence: Sequence::new(sequence),
                    phase: phase.map(|value| parse_phase(&value)).transpose()?,
                    timestamp: Timestamp::new(
                        OffsetDateTime::parse(&timestamp, &Rfc3339)
                            .map_err(|err| EventStoreError::Store(err.to_string()))?,
                    ),
                    payload: serde_json::from_slice(&payload_json)
                        .map_err(|err| EventStoreError::Store(err.to_string()))?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_increasing_sequence() {
        let store = SqliteEventStore::open_in_memory().expect("open");
        let campaign_id = CampaignId::generate();
        let first = store
            .append(campaign_id, EventType::CampaignProgress, None, serde_json::json!({}))
            .expect("append");
        let second = store
            .append(campaign_id, EventType::CampaignProgress, None, serde_json::json!({}))
            .expect("append");
        assert_eq!(first.sequence, Sequence::new(1));
        assert_eq!(second.sequence, Sequence::new(2));
    }

    #[test]
    fn replay_filters_by_since() {
        let store = SqliteEventStore::open_in_memory().expect("open");
        let campaign_id = CampaignId::generate();
        store
            .append(campaign_id, EventType::CampaignProgress, None, serde_json::json!({"n": 1}))
            .expect("append");
        let second = store
            .append(campaign_id, EventType::CampaignProgress, None, serde_json::json!({"n": 2}))
            .expect("append");
        let replayed = store.replay(campaign_id, Some(Sequence::new(1))).expect("replay");
        assert_eq!(replayed.len(), 1);
        assert_eq!(replayed[0].sequence, second.sequence);
    }

    #[test]
    fn replay_is_scoped_per_campaign() {
        let store = SqliteEventStore::open_in_memory().expect("open");
        let first_campaign = CampaignId::generate();
        let second_campaign = CampaignId::generate();
        store
            .append(first_campaign, EventType::CampaignProgress, None, serde_json::json!({}))
            .expect("append");
        let replayed = store.replay(second_campaign, None).expect("replay");
        assert!(replayed.is_empty());
    }
}
