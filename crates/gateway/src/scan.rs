use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use stocksync_catalog::Catalog;
use stocksync_core::{Barcode, BarcodeSymbology, ChangeEvent, DomainError, ScanAction, WarehouseId};
use stocksync_relay::Relay;
use stocksync_replication::ChangePublisher;
use stocksync_store::{InventoryRecord, InventoryStore, StoreError};

/// One decoded scan, as submitted by an input adapter.
///
/// A bare barcode means "one unit received": action defaults to RESTOCK,
/// quantity to 1, matching what a dock worker waving items past a
/// scanner expects.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub barcode: String,
    pub action: Option<ScanAction>,
    pub quantity: Option<i64>,
}

impl ScanRequest {
    pub fn bare(barcode: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
            action: None,
            quantity: None,
        }
    }
}

/// Outcome of a successfully applied scan.
#[derive(Debug, Clone)]
pub struct ScanReceipt {
    /// Correlation id for this scan (logs, client retries).
    pub scan_id: Uuid,
    pub action: ScanAction,
    pub symbology: BarcodeSymbology,
    pub record: InventoryRecord,
}

#[derive(Debug, Error)]
pub enum ScanError {
    /// The barcode has no mapped product; nothing was written.
    #[error("unknown barcode: {0}")]
    UnknownBarcode(String),

    /// Malformed input (empty barcode, zero/negative quantity, ...).
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The scan pipeline: resolve → apply → publish.
///
/// Two phases, deliberately decoupled: the local mutation commits first
/// and is never rolled back or blocked by propagation. Publishing is
/// fire-and-forget; a relay failure is logged and the scan still
/// succeeds.
pub struct ScanGateway<C, S, R> {
    catalog: C,
    store: S,
    publisher: ChangePublisher<R>,
    warehouse_id: WarehouseId,
}

impl<C, S, R> ScanGateway<C, S, R>
where
    C: Catalog,
    S: InventoryStore,
    R: Relay,
{
    pub fn new(catalog: C, store: S, publisher: ChangePublisher<R>, warehouse_id: WarehouseId) -> Self {
        Self {
            catalog,
            store,
            publisher,
            warehouse_id,
        }
    }

    pub fn warehouse_id(&self) -> &WarehouseId {
        &self.warehouse_id
    }

    pub fn handle(&self, request: ScanRequest) -> Result<ScanReceipt, ScanError> {
        let scan_id = Uuid::now_v7();
        let scanned = Barcode::new(request.barcode)?;
        let symbology = scanned.symbology();
        let barcode = scanned.catalog_key();

        let action = request.action.unwrap_or(ScanAction::Restock);
        let quantity = request.quantity.unwrap_or(1);
        validate_quantity(action, quantity)?;

        // 1. Resolve. An unknown barcode aborts before any store write.
        let product = self
            .catalog
            .resolve(&barcode)
            .ok_or_else(|| ScanError::UnknownBarcode(barcode.as_str().to_string()))?;

        // 2. Apply locally. Insufficient stock aborts with nothing
        //    written and nothing published.
        let record = self.store.apply(&self.warehouse_id, &barcode, action, quantity)?;

        debug!(
            %scan_id,
            barcode = %barcode,
            %action,
            quantity,
            new_quantity = record.quantity,
            "applied scan"
        );

        // 3. Propagate, best-effort. The mutation above already
        //    committed; a publish failure must not fail the scan.
        let event = ChangeEvent {
            action,
            barcode: barcode.clone(),
            product_name: product.name,
            quantity,
            origin_warehouse: self.warehouse_id.clone(),
            observed_at: Utc::now(),
        };
        if let Err(e) = self.publisher.publish(&event) {
            warn!(%scan_id, barcode = %barcode, error = %e, "change event publish failed; local state is committed");
        }

        Ok(ScanReceipt {
            scan_id,
            action,
            symbology,
            record,
        })
    }
}

fn validate_quantity(action: ScanAction, quantity: i64) -> Result<(), DomainError> {
    match action {
        ScanAction::Restock | ScanAction::Sale if quantity <= 0 => Err(DomainError::validation(
            format!("{action} quantity must be positive (got {quantity})"),
        )),
        ScanAction::Adjust if quantity == 0 => {
            Err(DomainError::validation("ADJUST quantity cannot be zero"))
        }
        _ => Ok(()),
    }
}
