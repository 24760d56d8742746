// crates/leadgen-core/src/core/events.rs
// ============================================================================
// Module: Event Types
// Description: Wire shape for campaign and phase events.
// Purpose: Give the event stream, the store, and the HTTP surface one shared
// event type.
// Dependencies: crate::core::{identifiers, state_machine, time}, serde_json
// ============================================================================

//! ## Overview
//! Every event carries a monotone per-campaign [`Sequence`], assigned at
//! commit time by whatever persists it. This module only defines the wire
//! shape; sequencing and fan-out live in the events crate.

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::core::campaign::CampaignId;
use crate::core::identifiers::Sequence;
use crate::core::state_machine::Phase;
use crate::core::time::Timestamp;

/// Event type discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A phase transitioned from one state to another.
    PhaseStateChanged,
    /// A phase requires configuration before it can start.
    PhaseConfigurationRequired,
    /// The campaign's control phase changed.
    CampaignPhaseTransition,
    /// Overall campaign progress was updated.
    CampaignProgress,
    /// A single domain was generated.
    DomainGenerated,
    /// A batch-level progress update for the active phase.
    PhaseProgress,
    /// The campaign reached its terminal completed state.
    CampaignCompleted,
    /// The campaign was cancelled.
    CampaignCancelled,
    /// The campaign encountered a fatal error.
    CampaignError,
}

/// Free-form event payload, kept as JSON so each event type can carry its own
/// shape without a combinatorial explosion of Rust types.
pub type EventPayload = serde_json::Value;

/// A single ordered campaign event.
///
/// # Invariants
/// - `sequence` is strictly increasing per `campaign_id`, assigned at commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseEvent {
    /// Event identifier.
    pub id: Uuid,
    /// Event type discriminant.
    pub event_type: EventType,
    /// Campaign this event belongs to.
    pub campaign_id: CampaignId,
    /// Monotone per-campaign sequence number.
    pub sequence: Sequence,
    /// Phase this event concerns, when applicable.
    pub phase: Option<Phase>,
    /// Event commit timestamp.
    pub timestamp: Timestamp,
    /// Event-specific payload.
    pub payload: EventPayload,
}
