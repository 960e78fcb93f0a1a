//! Change replication between warehouses.
//!
//! The publisher turns applied local changes into wire messages on the
//! origin warehouse's relay topic; the subscriber follows a remote
//! warehouse's topic, mirrors its changes into a local replica store,
//! and appends every received event to the audit log.

pub mod publisher;
pub mod subscriber;
pub mod wire;

pub use publisher::ChangePublisher;
pub use subscriber::{ChangeSubscriber, ShutdownToken, SubscriberState};
pub use wire::{DecodeError, WireData, WireMessage};
