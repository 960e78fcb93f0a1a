//! Append-only audit log of received replication events.
//!
//! One row per received event in receipt order, keyed by the remote
//! warehouse the event originated at. No uniqueness constraint: a
//! redelivered event that passes the subscriber produces another row.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocksync_core::{Barcode, ScanAction, WarehouseId};

/// One received replication event, as recorded for later inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub barcode: Barcode,
    pub product_name: String,
    pub quantity: i64,
    pub action: ScanAction,
    pub received_at: DateTime<Utc>,
}

pub trait AuditLog: Send + Sync {
    /// Append a row for an event received from `origin`.
    fn append(&self, origin: &WarehouseId, entry: AuditEntry);

    /// All rows for one origin, in receipt order.
    fn entries(&self, origin: &WarehouseId) -> Vec<AuditEntry>;
}

impl<A> AuditLog for Arc<A>
where
    A: AuditLog + ?Sized,
{
    fn append(&self, origin: &WarehouseId, entry: AuditEntry) {
        (**self).append(origin, entry)
    }

    fn entries(&self, origin: &WarehouseId) -> Vec<AuditEntry> {
        (**self).entries(origin)
    }
}

/// In-memory audit log for dev/test.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    inner: Mutex<HashMap<WarehouseId, Vec<AuditEntry>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditLog for InMemoryAuditLog {
    fn append(&self, origin: &WarehouseId, entry: AuditEntry) {
        if let Ok(mut map) = self.inner.lock() {
            map.entry(origin.clone()).or_default().push(entry);
        }
    }

    fn entries(&self, origin: &WarehouseId) -> Vec<AuditEntry> {
        self.inner
            .lock()
            .ok()
            .and_then(|map| map.get(origin).cloned())
            .unwrap_or_default()
    }
}
