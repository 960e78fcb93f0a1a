//! Topic-based publish/subscribe abstraction over an external broker.
//!
//! ## Design Philosophy
//!
//! The relay is intentionally **lightweight** and makes minimal assumptions:
//!
//! - **Transport-agnostic**: works with in-memory channels, Redis pub/sub,
//!   MQTT brokers, etc.
//! - **At-most-once delivery**: from this system's perspective a published
//!   message either arrives once or not at all; subscribers that are
//!   offline miss messages. Local stores stay authoritative regardless.
//! - **Ordered per topic**: messages on one topic arrive in publish order
//!   while a subscription stays connected.
//! - **No persistence**: the relay distributes changes, it does not store
//!   them. The authoritative ledger is the source of truth.
//!
//! Connect and subscribe are separate steps so consumers can observe and
//! log the transport lifecycle (disconnected → connected → subscribed)
//! and drive their own reconnect policy.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use thiserror::Error;

/// Transport-level relay failure.
///
/// Publish failures degrade to log-and-continue at the call site (the
/// local mutation already succeeded); subscribe-side failures drive the
/// consumer's reconnect loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("relay connect failed: {0}")]
    Connect(String),

    #[error("relay subscribe failed: {0}")]
    Subscribe(String),

    #[error("relay publish failed: {0}")]
    Publish(String),
}

/// A subscription to one relay topic.
///
/// Receives raw message payloads in arrival order. Designed for
/// single-threaded consumption: one subscription, one consumer loop.
/// When the transport behind the subscription goes away, `recv` returns
/// a disconnection error and the consumer re-subscribes from scratch.
#[derive(Debug)]
pub struct Subscription {
    receiver: Receiver<String>,
}

impl Subscription {
    pub fn new(receiver: Receiver<String>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<String, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<String, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<String, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Handle to the broker.
///
/// `publish` is a bounded best-effort attempt: implementations must not
/// block indefinitely waiting for a broker that is down. `connect`
/// establishes a transport session for subscribing.
pub trait Relay: Send + Sync {
    type Session: RelaySession;

    fn connect(&self) -> Result<Self::Session, RelayError>;

    fn publish(&self, topic: &str, payload: String) -> Result<(), RelayError>;
}

impl<R> Relay for Arc<R>
where
    R: Relay + ?Sized,
{
    type Session = R::Session;

    fn connect(&self) -> Result<Self::Session, RelayError> {
        (**self).connect()
    }

    fn publish(&self, topic: &str, payload: String) -> Result<(), RelayError> {
        (**self).publish(topic, payload)
    }
}

/// A connected transport session, ready to subscribe.
///
/// Consumed by `subscribe`: one session backs one subscription, matching
/// brokers where a subscribed connection is dedicated to that stream.
pub trait RelaySession: Send {
    fn subscribe(self, topic: &str) -> Result<Subscription, RelayError>;
}
