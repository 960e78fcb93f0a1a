//! Pub/sub relay abstraction (mechanics only).
//!
//! The relay is the transport between warehouses. Core code programs
//! against the traits here; backend implementations live in
//! `stocksync-infra` (Redis) and `in_memory` (dev/test).

pub mod bus;
pub mod in_memory;

pub use bus::{Relay, RelayError, RelaySession, Subscription};
pub use in_memory::InMemoryRelay;
