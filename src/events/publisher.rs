use super::types::{DomainEvent, ProjectEvent};
use crate::constants::system::DEFAULT_EVENT_CHANNEL_CAPACITY;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

/// Fire-and-forget publisher for project domain events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Never fails and never waits on listeners.
    pub fn publish(&self, name: ProjectEvent, payload: Value) {
        let event = DomainEvent::new(name, payload);

        // No subscribers is acceptable - events are published even if no one is listening
        match self.sender.send(event) {
            Ok(receivers) => debug!(event = %name, receivers = receivers, "Domain event published"),
            Err(broadcast::error::SendError(_)) => {
                debug!(event = %name, "Domain event published with no listeners")
            }
        }
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let publisher = EventPublisher::default();
        publisher.publish(ProjectEvent::ProjectCreated, json!({"name": "Flood relief"}));
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let publisher = EventPublisher::new(8);
        let mut rx = publisher.subscribe();

        publisher.publish(ProjectEvent::RequestRedemption, Value::Null);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, ProjectEvent::RequestRedemption);
        assert_eq!(event.payload, Value::Null);
    }
}
