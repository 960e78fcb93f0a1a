//! Subscribing to a remote warehouse's changes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use stocksync_core::{Barcode, WarehouseId};
use stocksync_relay::{Relay, RelaySession};
use stocksync_store::{AuditEntry, AuditLog, InventoryStore, StoreError};

use crate::wire::WireMessage;

/// How long one blocking receive waits before re-checking shutdown.
const RECV_TICK: Duration = Duration::from_millis(250);

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Cooperative cancellation for long-running loops.
///
/// Cloned into whoever needs to stop the subscriber; the loop observes
/// cancellation within one receive tick.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken(Arc<AtomicBool>);

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Transport lifecycle of the subscriber.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubscriberState {
    Disconnected,
    Connected,
    Subscribed,
}

impl SubscriberState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriberState::Disconnected => "DISCONNECTED",
            SubscriberState::Connected => "CONNECTED",
            SubscriberState::Subscribed => "SUBSCRIBED",
        }
    }
}

impl core::fmt::Display for SubscriberState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follows one remote warehouse's update topic.
///
/// Runs until cancelled: connect → subscribe → drain messages. A
/// transport failure at any point drops back to `Disconnected` and
/// reconnects with exponential backoff. A malformed message is logged
/// and discarded without leaving `Subscribed`; one bad payload must not
/// stop the ones behind it.
pub struct ChangeSubscriber<R, S, A> {
    relay: R,
    replica: S,
    audit: A,
    /// Remote warehouse whose topic this subscriber follows; replica
    /// records are written under this id.
    origin: WarehouseId,
    topic: String,
    state: Mutex<SubscriberState>,
    /// Last applied sequence from this origin; messages at or below it
    /// are duplicates and are dropped. `None` until the first sequenced
    /// message arrives. Unsequenced messages bypass suppression and
    /// re-apply on every delivery.
    cursor: Mutex<Option<u64>>,
    shutdown: ShutdownToken,
}

impl<R, S, A> ChangeSubscriber<R, S, A>
where
    R: Relay,
    S: InventoryStore,
    A: AuditLog,
{
    pub fn new(relay: R, replica: S, audit: A, origin: WarehouseId, shutdown: ShutdownToken) -> Self {
        let topic = origin.updates_topic();
        Self {
            relay,
            replica,
            audit,
            origin,
            topic,
            state: Mutex::new(SubscriberState::Disconnected),
            cursor: Mutex::new(None),
            shutdown,
        }
    }

    pub fn state(&self) -> SubscriberState {
        self.state.lock().map(|s| *s).unwrap_or(SubscriberState::Disconnected)
    }

    pub fn origin(&self) -> &WarehouseId {
        &self.origin
    }

    fn set_state(&self, next: SubscriberState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    /// Run until the shutdown token is cancelled. Blocking; callers put
    /// this on its own thread (or `spawn_blocking` task).
    pub fn run(&self) {
        let mut backoff = INITIAL_BACKOFF;

        while !self.shutdown.is_cancelled() {
            self.set_state(SubscriberState::Disconnected);

            let session = match self.relay.connect() {
                Ok(session) => session,
                Err(e) => {
                    warn!(topic = %self.topic, error = %e, "relay connect failed; retrying");
                    self.sleep_backoff(&mut backoff);
                    continue;
                }
            };
            self.set_state(SubscriberState::Connected);

            let subscription = match session.subscribe(&self.topic) {
                Ok(subscription) => subscription,
                Err(e) => {
                    warn!(topic = %self.topic, error = %e, "relay subscribe failed; retrying");
                    self.sleep_backoff(&mut backoff);
                    continue;
                }
            };
            self.set_state(SubscriberState::Subscribed);
            info!(topic = %self.topic, "subscribed to remote warehouse updates");
            backoff = INITIAL_BACKOFF;

            loop {
                if self.shutdown.is_cancelled() {
                    self.set_state(SubscriberState::Disconnected);
                    return;
                }
                match subscription.recv_timeout(RECV_TICK) {
                    Ok(payload) => self.handle_payload(&payload),
                    Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
                    Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                        warn!(topic = %self.topic, "relay transport dropped; reconnecting");
                        break;
                    }
                }
            }
        }

        self.set_state(SubscriberState::Disconnected);
    }

    /// Backoff sleep that still honors cancellation.
    fn sleep_backoff(&self, backoff: &mut Duration) {
        let mut remaining = *backoff;
        while remaining > Duration::ZERO && !self.shutdown.is_cancelled() {
            let slice = remaining.min(Duration::from_millis(100));
            std::thread::sleep(slice);
            remaining -= slice;
        }
        *backoff = (*backoff * 2).min(MAX_BACKOFF);
    }

    fn handle_payload(&self, payload: &str) {
        let message = match WireMessage::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(topic = %self.topic, error = %e, "discarding malformed event");
                return;
            }
        };

        let barcode = match Barcode::new(message.data.barcode.clone()) {
            Ok(barcode) => barcode,
            Err(e) => {
                warn!(topic = %self.topic, error = %e, "discarding event with invalid barcode");
                return;
            }
        };

        if let Some(sequence) = message.sequence {
            if let Ok(mut cursor) = self.cursor.lock() {
                if cursor.is_some_and(|last| sequence <= last) {
                    debug!(topic = %self.topic, sequence, "duplicate or replayed event; dropping");
                    return;
                }
                *cursor = Some(sequence);
            }
        }

        match self
            .replica
            .apply(&self.origin, &barcode, message.action, message.data.quantity)
        {
            Ok(record) => {
                debug!(
                    origin = %self.origin,
                    barcode = %barcode,
                    quantity = record.quantity,
                    "applied remote change to replica"
                );
            }
            Err(StoreError::InsufficientStock { available, requested, .. }) => {
                // The replica joined after the origin's restocks; record
                // receipt and move on.
                warn!(
                    origin = %self.origin,
                    barcode = %barcode,
                    available,
                    requested,
                    "replica behind origin; skipping apply"
                );
            }
            Err(e) => {
                warn!(origin = %self.origin, barcode = %barcode, error = %e, "replica apply failed");
            }
        }

        self.audit.append(
            &self.origin,
            AuditEntry {
                barcode,
                product_name: message.data.product_name,
                quantity: message.data.quantity,
                action: message.action,
                received_at: Utc::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use stocksync_relay::InMemoryRelay;
    use stocksync_store::{InMemoryAuditLog, InMemoryInventoryStore};

    fn warehouse_a() -> WarehouseId {
        WarehouseId::new("A").unwrap()
    }

    fn subscriber(
        relay: InMemoryRelay,
        shutdown: ShutdownToken,
    ) -> ChangeSubscriber<InMemoryRelay, Arc<InMemoryInventoryStore>, Arc<InMemoryAuditLog>> {
        ChangeSubscriber::new(
            relay,
            Arc::new(InMemoryInventoryStore::new()),
            Arc::new(InMemoryAuditLog::new()),
            warehouse_a(),
            shutdown,
        )
    }

    fn sale_payload(sequence: Option<u64>) -> String {
        let sequence = sequence.map_or(String::new(), |s| format!(r#","sequence":{s}"#));
        format!(
            r#"{{"action":"SALE","data":{{"barcode":"012345678905","product_name":"Widget","quantity":1}}{sequence}}}"#
        )
    }

    fn restock_payload(quantity: i64, sequence: Option<u64>) -> String {
        let sequence = sequence.map_or(String::new(), |s| format!(r#","sequence":{s}"#));
        format!(
            r#"{{"action":"RESTOCK","data":{{"barcode":"012345678905","product_name":"Widget","quantity":{quantity}}}{sequence}}}"#
        )
    }

    #[test]
    fn malformed_then_valid_yields_one_audit_row() {
        let sub = subscriber(InMemoryRelay::new(), ShutdownToken::new());

        sub.handle_payload("{this is not json");
        sub.handle_payload(&restock_payload(5, Some(1)));

        let rows = sub.audit.entries(&warehouse_a());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 5);

        let barcode = Barcode::new("012345678905").unwrap();
        assert_eq!(sub.replica.get(&warehouse_a(), &barcode).quantity, 5);
    }

    #[test]
    fn unsequenced_replay_double_counts() {
        // Without a sequence there is nothing to suppress duplicates
        // with: the same delta applies twice. Documented behavior for
        // legacy publishers, not a bug to mask.
        let sub = subscriber(InMemoryRelay::new(), ShutdownToken::new());

        sub.handle_payload(&restock_payload(5, None));
        sub.handle_payload(&restock_payload(5, None));

        let barcode = Barcode::new("012345678905").unwrap();
        assert_eq!(sub.replica.get(&warehouse_a(), &barcode).quantity, 10);
        assert_eq!(sub.audit.entries(&warehouse_a()).len(), 2);
    }

    #[test]
    fn sequenced_replay_is_suppressed() {
        let sub = subscriber(InMemoryRelay::new(), ShutdownToken::new());

        sub.handle_payload(&restock_payload(5, Some(3)));
        sub.handle_payload(&restock_payload(5, Some(3)));
        sub.handle_payload(&restock_payload(5, Some(2))); // out of order

        let barcode = Barcode::new("012345678905").unwrap();
        assert_eq!(sub.replica.get(&warehouse_a(), &barcode).quantity, 5);
        assert_eq!(sub.audit.entries(&warehouse_a()).len(), 1);
    }

    #[test]
    fn sale_on_empty_replica_is_audited_but_not_applied() {
        let sub = subscriber(InMemoryRelay::new(), ShutdownToken::new());

        sub.handle_payload(&sale_payload(Some(1)));

        let barcode = Barcode::new("012345678905").unwrap();
        assert_eq!(sub.replica.get(&warehouse_a(), &barcode).quantity, 0);
        assert_eq!(sub.audit.entries(&warehouse_a()).len(), 1);
    }

    #[test]
    fn resubscribes_after_transport_drop() {
        let relay = InMemoryRelay::new();
        let shutdown = ShutdownToken::new();
        let sub = Arc::new(subscriber(relay.clone(), shutdown.clone()));

        let runner = {
            let sub = sub.clone();
            thread::spawn(move || sub.run())
        };

        let wait_subscribed = |sub: &ChangeSubscriber<_, _, _>| {
            for _ in 0..100 {
                if sub.state() == SubscriberState::Subscribed {
                    return true;
                }
                thread::sleep(Duration::from_millis(10));
            }
            false
        };

        assert!(wait_subscribed(&sub));

        // Kill the transport out from under the subscriber.
        relay.drop_subscribers("A/inventory/updates");

        // Deliveries resume once it resubscribes. Publishes that land in
        // the reconnect window are dropped (at-most-once), so keep
        // publishing; sequence suppression absorbs the duplicates.
        let barcode = Barcode::new("012345678905").unwrap();
        let applied = (0..200).any(|_| {
            relay
                .publish("A/inventory/updates", restock_payload(2, Some(1)))
                .unwrap();
            thread::sleep(Duration::from_millis(10));
            sub.replica.get(&warehouse_a(), &barcode).quantity == 2
        });
        assert!(applied);
        assert_eq!(sub.state(), SubscriberState::Subscribed);

        shutdown.cancel();
        runner.join().unwrap();
        assert_eq!(sub.state(), SubscriberState::Disconnected);
    }
}
