//! Publishing applied changes to the relay.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tracing::debug;

use stocksync_core::{ChangeEvent, WarehouseId};
use stocksync_relay::{Relay, RelayError};

use crate::wire::WireMessage;

/// Turns applied local changes into wire messages on the origin
/// warehouse's topic.
///
/// Best-effort: the caller has already committed the local mutation, so
/// a publish failure is surfaced for logging and nothing else. There is
/// no outbox or retry queue; a change whose publish fails is simply not
/// mirrored on the peer.
#[derive(Debug)]
pub struct ChangePublisher<R> {
    relay: R,
    origin: WarehouseId,
    topic: String,
    sequence: AtomicU64,
}

impl<R> ChangePublisher<R>
where
    R: Relay,
{
    pub fn new(relay: R, origin: WarehouseId) -> Self {
        // Seed the counter from wall-clock millis so a restarted process
        // resumes above everything it published before; the peer's
        // duplicate cursor keeps admitting its events.
        let seed = Utc::now().timestamp_millis().max(0) as u64;
        let topic = origin.updates_topic();
        Self {
            relay,
            origin,
            topic,
            sequence: AtomicU64::new(seed),
        }
    }

    pub fn origin(&self) -> &WarehouseId {
        &self.origin
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Serialize and publish one event. Returns the sequence number it
    /// went out with.
    pub fn publish(&self, event: &ChangeEvent) -> Result<u64, RelayError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;

        let payload = WireMessage::from_event(event, sequence)
            .encode()
            .map_err(|e| RelayError::Publish(e.to_string()))?;

        self.relay.publish(&self.topic, payload)?;

        debug!(
            topic = %self.topic,
            sequence,
            action = %event.action,
            barcode = %event.barcode,
            "published change event"
        );
        Ok(sequence)
    }
}
