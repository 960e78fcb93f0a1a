//! Redis pub/sub-backed relay.
//!
//! Channels are the relay topics. Redis pub/sub is not durable: messages
//! published while a warehouse is offline are gone, which matches the
//! at-most-once contract in `stocksync-relay`. Durable delivery would
//! need Redis Streams (or a broker); this implementation is
//! intentionally minimal.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use stocksync_relay::{Relay, RelayError, RelaySession, Subscription};

/// Bound on connection establishment so a down broker cannot stall the
/// scan response path.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis pub/sub relay.
#[derive(Debug, Clone)]
pub struct RedisRelay {
    client: redis::Client,
}

impl RedisRelay {
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, RelayError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| RelayError::Connect(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Relay for RedisRelay {
    type Session = RedisSession;

    fn connect(&self) -> Result<Self::Session, RelayError> {
        let conn = self
            .client
            .get_connection_with_timeout(CONNECT_TIMEOUT)
            .map_err(|e| RelayError::Connect(e.to_string()))?;
        Ok(RedisSession { conn })
    }

    fn publish(&self, topic: &str, payload: String) -> Result<(), RelayError> {
        let mut conn = self
            .client
            .get_connection_with_timeout(CONNECT_TIMEOUT)
            .map_err(|e| RelayError::Publish(e.to_string()))?;

        let _: i64 = redis::Commands::publish(&mut conn, topic, payload)
            .map_err(|e| RelayError::Publish(e.to_string()))?;

        Ok(())
    }
}

/// A connected Redis session, ready to subscribe one channel.
pub struct RedisSession {
    conn: redis::Connection,
}

impl RelaySession for RedisSession {
    fn subscribe(self, topic: &str) -> Result<Subscription, RelayError> {
        let (tx, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let mut conn = self.conn;
        let topic = topic.to_string();

        // Forwarding thread: owns the connection, pushes payloads into
        // the subscription channel. When the connection dies the thread
        // returns, the sender drops, and the consumer sees disconnection.
        thread::spawn(move || {
            let mut pubsub = conn.as_pubsub();
            if let Err(e) = pubsub.subscribe(&topic) {
                let _ = ready_tx.send(Err(RelayError::Subscribe(e.to_string())));
                return;
            }
            if ready_tx.send(Ok(())).is_err() {
                return;
            }

            loop {
                let msg = match pubsub.get_message() {
                    Ok(m) => m,
                    Err(_) => return,
                };

                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(_) => continue,
                };

                if tx.send(payload).is_err() {
                    return;
                }
            }
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Subscription::new(rx)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(RelayError::Subscribe("subscriber thread exited".to_string())),
        }
    }
}
