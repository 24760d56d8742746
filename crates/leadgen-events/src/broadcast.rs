// crates/leadgen-events/src/broadcast.rs
// ============================================================================
// Module: Live Event Broadcaster
// Description: Fans out appended events to live per-campaign subscribers.
// Purpose: Let the HTTP/SSE surface follow a campaign without polling, while
// persistence and replay remain the durable source of truth.
// Dependencies: leadgen-core, tokio
// ============================================================================

//! ## Overview
//! [`LiveEventBroadcaster`] wraps any [`EventSink`] and additionally pushes
//! every appended event onto a bounded `tokio::sync::mpsc` channel per
//! subscriber, the same
//! `tokio::sync::mpsc::channel::<Result<Event, Infallible>>` SSE push
//! pattern used for streaming responses elsewhere in this workspace. A dropped or lagging subscriber only loses its own live feed;
//! it can always recover lost events via [`EventSink::replay`].

use std::collections::HashMap;
use std::sync::Mutex;

use leadgen_core::CampaignId;
use leadgen_core::EventPayload;
use leadgen_core::EventType;
use leadgen_core::Phase;
use leadgen_core::PhaseEvent;
use leadgen_core::Sequence;
use leadgen_core::interfaces::EventSink;
use leadgen_core::interfaces::EventStoreError;
use tokio::sync::mpsc;

const SUBSCRIBER_CHANNEL_CAPACITY: usize = 256;

/// Wraps an [`EventSink`] with live per-campaign subscriber fan-out.
pub struct LiveEventBroadcaster<S> {
    inner: S,
    subscribers: Mutex<HashMap<CampaignId, Vec<mpsc::Sender<PhaseEvent>>>>,
}

impl<S: EventSink> LiveEventBroadcaster<S> {
    /// Wraps `inner`, starting with no subscribers.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribes to `campaign_id`'s live event feed, returning the receiver
    /// half. Events appended before this call are not delivered; callers
    /// that need history should call [`EventSink::replay`] first.
    pub fn subscribe(&self, campaign_id: CampaignId) -> mpsc::Receiver<PhaseEvent> {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        let mut subscribers = self.subscribers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        subscribers.entry(campaign_id).or_default().push(sender);
        receiver
    }

    fn notify(&self, event: &PhaseEvent) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(senders) = subscribers.get_mut(&event.campaign_id) {
            senders.retain(|sender| sender.try_send(event.clone()).is_ok());
        }
    }
}

/// A live, per-campaign event subscription source. Kept separate from
/// [`EventSink`] because durability and live fan-out are different
/// concerns — a plain `SqliteEventStore` satisfies the former without
/// being able to do the latter.
pub trait LiveEventSource: Send + Sync {
    /// Subscribes to `campaign_id`'s live event feed; see
    /// [`LiveEventBroadcaster::subscribe`].
    fn subscribe(&self, campaign_id: CampaignId) -> mpsc::Receiver<PhaseEvent>;
}

impl<S: EventSink + Send + Sync> LiveEventSource for LiveEventBroadcaster<S> {
    fn subscribe(&self, campaign_id: CampaignId) -> mpsc::Receiver<PhaseEvent> {
        Self::subscribe(self, campaign_id)
    }
}

impl<S: EventSink> EventSink for LiveEventBroadcaster<S> {
    fn append(
        &self,
        campaign_id: CampaignId,
        event_type: EventType,
        phase: Option<Phase>,
        payload: EventPayload,
    ) -> Result<PhaseEvent, EventStoreError> {
        let event = self.inner.append(campaign_id, event_type, phase, payload)?;
        self.notify(&event);
        Ok(event)
    }

    fn replay(&self, campaign_id: CampaignId, since: Option<Sequence>) -> Result<Vec<PhaseEvent>, EventStoreError> {
        self.inner.replay(campaign_id, since)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Unit tests use expect for setup clarity.")]
mod tests {
    use super::*;
    use crate::store::SqliteEventStore;

    #[tokio::test]
    async fn subscriber_receives_appended_event() {
        let broadcaster = LiveEventBroadcaster::new(SqliteEventStore::open_in_memory().expect("open"));
        let campaign_id = CampaignId::generate();
        let mut receiver = broadcaster.subscribe(campaign_id);
        broadcaster
            .append(campaign_id, EventType::CampaignProgress, None, serde_json::json!({}))
            .expect("append");
        let received = receiver.recv().await.expect("receive");
        assert_eq!(received.campaign_id, campaign_id);
    }

    #[tokio::test]
    async fn subscriber_for_other_campaign_does_not_receive() {
        let broadcaster = LiveEventBroadcaster::new(SqliteEventStore::open_in_memory().expect("open"));
        let watched = CampaignId::generate();
        let other = CampaignId::generate();
        let mut receiver = broadcaster.subscribe(watched);
        broadcaster
            .append(other, EventType::CampaignProgress, None, serde_json::json!({}))
            .expect("append");
        assert!(receiver.try_recv().is_err());
    }
}
