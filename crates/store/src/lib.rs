//! Inventory storage: the per-warehouse quantity ledger and the
//! replication audit log.
//!
//! One ledger instance can hold records for several warehouses; the
//! authoritative store uses it under the local warehouse id, replica
//! stores under the ids of remote warehouses.

pub mod audit;
pub mod ledger;

pub use audit::{AuditEntry, AuditLog, InMemoryAuditLog};
pub use ledger::{InMemoryInventoryStore, InventoryRecord, InventoryStore, StoreError};
