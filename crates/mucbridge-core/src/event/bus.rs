//! Fan-out of session lifecycle events.
//!
//! The bridge publishes one [`BridgeEvent`] per lifecycle step of a session
//! (created, attached, detached, failed, closed). Subscribers such as the
//! server's event log each get their own copy. A subscriber that falls more
//! than the bus capacity behind skips the oldest events and is told how many
//! it missed; the bridge itself never waits on a slow subscriber.

use mucbridge_types::event::BridgeEvent;
use tokio::sync::broadcast;

/// Lifecycle event bus shared by a [`Bridge`](crate::Bridge) and its tasks.
///
/// Clones publish to the same subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BridgeEvent>,
}

impl EventBus {
    /// Retain up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.sender.subscribe()
    }

    /// Publish without waiting. Dropped when nobody is subscribed.
    pub fn publish(&self, event: BridgeEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mucbridge_types::session::SessionId;
    use tokio::sync::broadcast::error::RecvError;

    fn lifecycle(id: &str) -> Vec<BridgeEvent> {
        let session_id = SessionId::new(id);
        vec![
            BridgeEvent::SessionCreated {
                session_id: session_id.clone(),
            },
            BridgeEvent::SessionAttached {
                session_id: session_id.clone(),
            },
            BridgeEvent::SessionClosed {
                session_id,
                discarded: 2,
            },
        ]
    }

    #[tokio::test]
    async fn subscribers_see_lifecycle_in_publish_order() {
        let bus = EventBus::new(16);
        let mut log = bus.subscribe();
        let mut other = bus.clone().subscribe();

        for event in lifecycle("s1") {
            bus.publish(event);
        }

        for expected in lifecycle("s1") {
            assert_eq!(log.recv().await.unwrap(), expected);
            assert_eq!(other.recv().await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(16);
        let mut events = lifecycle("s1").into_iter();
        bus.publish(events.next().unwrap());

        let mut late = bus.subscribe();
        for event in events {
            bus.publish(event);
        }

        assert!(matches!(late.recv().await.unwrap(), BridgeEvent::SessionAttached { .. }));
    }

    #[tokio::test]
    async fn slow_subscriber_is_told_how_many_it_skipped() {
        let bus = EventBus::new(2);
        let mut slow = bus.subscribe();

        for event in lifecycle("s1") {
            bus.publish(event);
        }

        assert!(matches!(slow.recv().await, Err(RecvError::Lagged(1))));
        assert!(matches!(slow.recv().await.unwrap(), BridgeEvent::SessionAttached { .. }));
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
        for event in lifecycle("s1") {
            bus.publish(event);
        }
        assert!(format!("{bus:?}").contains("subscribers: 0"));
    }
}
