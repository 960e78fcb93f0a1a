//! Infrastructure layer: broker and database adapters.
//!
//! The core abstractions (relay, inventory store, audit log) live in
//! their own crates as pure mechanics. This crate provides the
//! infrastructure-backed implementations (Redis pub/sub, Postgres).

pub mod relay;
pub mod store;
