//! In-memory relay for tests/dev.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc};

use crate::bus::{Relay, RelayError, RelaySession, Subscription};

type TopicMap = Arc<Mutex<HashMap<String, Vec<mpsc::Sender<String>>>>>;

/// In-memory topic bus.
///
/// - No IO / no async
/// - Broadcast per topic, best-effort fan-out
/// - Messages published while nobody is subscribed are dropped
///   (at-most-once, like the real broker)
#[derive(Debug, Clone, Default)]
pub struct InMemoryRelay {
    topics: TopicMap,
}

impl InMemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every subscriber on `topic`, as a broker restart would.
    ///
    /// Their subscriptions observe disconnection on the next receive,
    /// which exercises consumer reconnect paths in tests.
    pub fn drop_subscribers(&self, topic: &str) {
        if let Ok(mut map) = self.topics.lock() {
            map.remove(topic);
        }
    }
}

impl Relay for InMemoryRelay {
    type Session = InMemorySession;

    fn connect(&self) -> Result<Self::Session, RelayError> {
        Ok(InMemorySession {
            topics: self.topics.clone(),
        })
    }

    fn publish(&self, topic: &str, payload: String) -> Result<(), RelayError> {
        let mut map = self
            .topics
            .lock()
            .map_err(|_| RelayError::Publish("relay lock poisoned".to_string()))?;

        if let Some(subscribers) = map.get_mut(topic) {
            // Drop any dead subscribers while publishing.
            subscribers.retain(|tx| tx.send(payload.clone()).is_ok());
        }

        Ok(())
    }
}

/// A connected in-memory session.
#[derive(Debug)]
pub struct InMemorySession {
    topics: TopicMap,
}

impl RelaySession for InMemorySession {
    fn subscribe(self, topic: &str) -> Result<Subscription, RelayError> {
        let (tx, rx) = mpsc::channel();

        let mut map = self
            .topics
            .lock()
            .map_err(|_| RelayError::Subscribe("relay lock poisoned".to_string()))?;
        map.entry(topic.to_string()).or_default().push(tx);

        Ok(Subscription::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn delivers_to_topic_subscribers_in_order() {
        let relay = InMemoryRelay::new();
        let sub = relay.connect().unwrap().subscribe("A/inventory/updates").unwrap();

        relay.publish("A/inventory/updates", "one".to_string()).unwrap();
        relay.publish("A/inventory/updates", "two".to_string()).unwrap();

        assert_eq!(sub.recv().unwrap(), "one");
        assert_eq!(sub.recv().unwrap(), "two");
    }

    #[test]
    fn topics_are_isolated() {
        let relay = InMemoryRelay::new();
        let sub_a = relay.connect().unwrap().subscribe("A/inventory/updates").unwrap();
        let sub_b = relay.connect().unwrap().subscribe("B/inventory/updates").unwrap();

        relay.publish("B/inventory/updates", "for-b".to_string()).unwrap();

        assert_eq!(sub_b.recv().unwrap(), "for-b");
        assert!(sub_a.recv_timeout(Duration::from_millis(20)).is_err());
    }

    #[test]
    fn publish_without_subscribers_is_dropped_not_an_error() {
        let relay = InMemoryRelay::new();
        relay.publish("A/inventory/updates", "nobody-home".to_string()).unwrap();

        // A later subscriber does not see earlier messages.
        let sub = relay.connect().unwrap().subscribe("A/inventory/updates").unwrap();
        assert!(sub.recv_timeout(Duration::from_millis(20)).is_err());
    }

    #[test]
    fn dropped_subscribers_disconnect() {
        let relay = InMemoryRelay::new();
        let sub = relay.connect().unwrap().subscribe("A/inventory/updates").unwrap();

        relay.drop_subscribers("A/inventory/updates");
        assert!(matches!(sub.recv(), Err(std::sync::mpsc::RecvError)));
    }
}
