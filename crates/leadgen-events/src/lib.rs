// crates/leadgen-events/src/lib.rs
// ============================================================================
// Module: Event Stream
// Description: Durable, sequenced per-campaign event log with live fan-out.
// Purpose: Give the orchestrator one place to append lifecycle events and
// give HTTP/SSE subscribers one place to replay and follow them.
// Dependencies: leadgen-core, rusqlite, tokio
// ============================================================================

//! ## Overview
//! [`SqliteEventStore`] persists every [`leadgen_core::PhaseEvent`] durably
//! and assigns its sequence number at commit time. A
//! [`broadcast::LiveEventBroadcaster`] wraps it to additionally fan events
//! out to live subscribers over bounded `tokio::sync::mpsc` channels, the
//! same primitive used elsewhere in this workspace to push
//! `axum::response::Sse` events to HTTP clients.

mod broadcast;
mod store;

pub use broadcast::LiveEventBroadcaster;
pub use broadcast::LiveEventSource;
pub use store::SqliteEventStore;
pub use store::SqliteEventStoreError;
