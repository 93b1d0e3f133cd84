//! State-change event emission.
//!
//! The engine publishes a [`StateChangeEvent`] after every transition.
//! Delivery to clients is someone else's job; the broadcast sink lets any
//! number of in-process subscribers observe events.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::models::StateChangeEvent;

/// Receives state-change events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publishes an event. Must not fail the transition that produced it.
    async fn publish(&self, event: StateChangeEvent);
}

/// Fans events out over a `tokio::sync::broadcast` channel.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<StateChangeEvent>,
}

impl BroadcastEventSink {
    /// Creates a sink buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventSink for BroadcastEventSink {
    async fn publish(&self, event: StateChangeEvent) {
        tracing::debug!(
            event_type = ?event.event_type,
            employee_id = %event.employee_id,
            date = %event.date,
            new_status = %event.new_status,
            "Publishing state change"
        );
        if self.sender.send(event).is_err() {
            tracing::debug!("No subscribers for state change event");
        }
    }
}
