//! Channel abstraction and the in-memory implementation.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ChannelError;
use crate::event::Event;

/// Consuming end of a channel, held by the owning service's consumer.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Producer contract for one resource type's event stream.
///
/// `publish` returns once the event is durably enqueued, not once the
/// owning service has applied it; callers must not assume the entity
/// exists downstream when this returns.
#[async_trait]
pub trait EventChannel: Send + Sync {
    async fn publish(&self, event: Event) -> Result<(), ChannelError>;
}

/// In-memory, ordered, append-only channel.
///
/// A single queue per resource type, so FIFO order is preserved for all
/// events from one publisher handle — which covers the per-key ordering
/// guarantee. Cloning the channel shares the queue, letting many
/// orchestrator instances publish into one stream.
#[derive(Clone)]
pub struct InMemoryEventChannel {
    resource: String,
    tx: mpsc::UnboundedSender<Event>,
}

impl InMemoryEventChannel {
    /// Creates a channel for the named resource, returning the producer
    /// handle and the single consuming end.
    pub fn new(resource: impl Into<String>) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                resource: resource.into(),
                tx,
            },
            rx,
        )
    }

    /// The resource type this channel carries events for.
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

#[async_trait]
impl EventChannel for InMemoryEventChannel {
    async fn publish(&self, event: Event) -> Result<(), ChannelError> {
        tracing::debug!(
            resource = %self.resource,
            event_type = %event.event_type,
            key = event.key,
            "publishing event"
        );
        metrics::counter!("events_published_total").increment(1);

        self.tx.send(event).map_err(|_| ChannelError::Closed {
            resource: self.resource.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;

    #[tokio::test]
    async fn publish_preserves_order_for_one_key() {
        let (channel, mut rx) = InMemoryEventChannel::new("product");

        channel
            .publish(Event::create(1, &serde_json::json!({"id": 1})).unwrap())
            .await
            .unwrap();
        channel.publish(Event::delete(1)).await.unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.event_type, EventType::Create);
        assert_eq!(second.event_type, EventType::Delete);
        assert_eq!(first.key, 1);
        assert_eq!(second.key, 1);
    }

    #[tokio::test]
    async fn publish_after_receiver_dropped_fails() {
        let (channel, rx) = InMemoryEventChannel::new("review");
        drop(rx);

        let result = channel.publish(Event::delete(1)).await;
        assert!(matches!(result, Err(ChannelError::Closed { .. })));
    }

    #[tokio::test]
    async fn cloned_publishers_share_one_stream() {
        let (channel, mut rx) = InMemoryEventChannel::new("recommendation");
        let other = channel.clone();

        channel.publish(Event::delete(1)).await.unwrap();
        other.publish(Event::delete(2)).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().key, 1);
        assert_eq!(rx.recv().await.unwrap().key, 2);
    }
}
