use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stocksync_core::{Barcode, ScanAction, WarehouseId};

/// Current quantity for one (barcode, warehouse) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub barcode: Barcode,
    pub warehouse_id: WarehouseId,
    /// Never negative; a decrement past zero is rejected before writing.
    pub quantity: i64,
}

impl InventoryRecord {
    pub fn zero(warehouse_id: WarehouseId, barcode: Barcode) -> Self {
        Self {
            barcode,
            warehouse_id,
            quantity: 0,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A decrement would drive the quantity below zero; the record is
    /// left unchanged.
    #[error("insufficient stock for {barcode} at {warehouse_id}: have {available}, need {requested}")]
    InsufficientStock {
        barcode: Barcode,
        warehouse_id: WarehouseId,
        available: i64,
        requested: i64,
    },

    /// The storage backend failed (connection, poisoned lock, ...).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Per-warehouse quantity ledger.
///
/// `apply` must be atomic per (warehouse, barcode) key: two concurrent
/// scans of the same item must not race read-modify-write. Distinct keys
/// may proceed concurrently. Callers never bypass this by reading and
/// writing around `apply`.
pub trait InventoryStore: Send + Sync {
    /// Current record; a zero-quantity record when the pair has never
    /// been written (absence is not an error).
    fn get(&self, warehouse_id: &WarehouseId, barcode: &Barcode) -> InventoryRecord;

    /// Apply one scan action. Check-then-write is atomic: on
    /// `InsufficientStock` the stored quantity is unchanged.
    fn apply(
        &self,
        warehouse_id: &WarehouseId,
        barcode: &Barcode,
        action: ScanAction,
        quantity: i64,
    ) -> Result<InventoryRecord, StoreError>;

    /// All records for one warehouse.
    fn list(&self, warehouse_id: &WarehouseId) -> Vec<InventoryRecord>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn get(&self, warehouse_id: &WarehouseId, barcode: &Barcode) -> InventoryRecord {
        (**self).get(warehouse_id, barcode)
    }

    fn apply(
        &self,
        warehouse_id: &WarehouseId,
        barcode: &Barcode,
        action: ScanAction,
        quantity: i64,
    ) -> Result<InventoryRecord, StoreError> {
        (**self).apply(warehouse_id, barcode, action, quantity)
    }

    fn list(&self, warehouse_id: &WarehouseId) -> Vec<InventoryRecord> {
        (**self).list(warehouse_id)
    }
}

/// In-memory ledger.
///
/// One mutex per (warehouse, barcode) key: same-key writers serialize,
/// distinct keys proceed concurrently. The outer map lock is held only
/// long enough to find or insert the key's cell.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    cells: RwLock<HashMap<(WarehouseId, Barcode), Arc<Mutex<i64>>>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, warehouse_id: &WarehouseId, barcode: &Barcode) -> Result<Arc<Mutex<i64>>, StoreError> {
        let key = (warehouse_id.clone(), barcode.clone());

        if let Ok(map) = self.cells.read() {
            if let Some(cell) = map.get(&key) {
                return Ok(cell.clone());
            }
        }

        let mut map = self
            .cells
            .write()
            .map_err(|_| StoreError::Backend("ledger lock poisoned".to_string()))?;
        Ok(map.entry(key).or_default().clone())
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn get(&self, warehouse_id: &WarehouseId, barcode: &Barcode) -> InventoryRecord {
        let quantity = self
            .cells
            .read()
            .ok()
            .and_then(|map| map.get(&(warehouse_id.clone(), barcode.clone())).cloned())
            .and_then(|cell| cell.lock().ok().map(|q| *q))
            .unwrap_or(0);

        InventoryRecord {
            barcode: barcode.clone(),
            warehouse_id: warehouse_id.clone(),
            quantity,
        }
    }

    fn apply(
        &self,
        warehouse_id: &WarehouseId,
        barcode: &Barcode,
        action: ScanAction,
        quantity: i64,
    ) -> Result<InventoryRecord, StoreError> {
        let delta = action.signed_delta(quantity);
        let cell = self.cell(warehouse_id, barcode)?;

        let mut current = cell
            .lock()
            .map_err(|_| StoreError::Backend("record lock poisoned".to_string()))?;

        let next = *current + delta;
        if next < 0 {
            return Err(StoreError::InsufficientStock {
                barcode: barcode.clone(),
                warehouse_id: warehouse_id.clone(),
                available: *current,
                requested: -delta,
            });
        }
        *current = next;

        Ok(InventoryRecord {
            barcode: barcode.clone(),
            warehouse_id: warehouse_id.clone(),
            quantity: next,
        })
    }

    fn list(&self, warehouse_id: &WarehouseId) -> Vec<InventoryRecord> {
        let map = match self.cells.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        map.iter()
            .filter(|((w, _), _)| w == warehouse_id)
            .filter_map(|((_, barcode), cell)| {
                let quantity = *cell.lock().ok()?;
                Some(InventoryRecord {
                    barcode: barcode.clone(),
                    warehouse_id: warehouse_id.clone(),
                    quantity,
                })
            })
            .collect()
    }
}
