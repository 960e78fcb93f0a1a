//! Storage backend implementations.

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresAuditLog, PostgresInventoryStore};
