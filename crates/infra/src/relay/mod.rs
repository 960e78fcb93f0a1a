//! Relay transport implementations.
//!
//! `stocksync-relay` holds the abstraction and the in-memory bus; this
//! module holds broker-backed transports.

#[cfg(feature = "redis")]
pub mod redis_pubsub;

#[cfg(feature = "redis")]
pub use redis_pubsub::RedisRelay;
