use serde::Deserialize;
use serde_json::json;

use stocksync_gateway::{ScanReceipt, ScanRequest};
use stocksync_store::{AuditEntry, InventoryRecord};

// -------------------------
// Request DTOs
// -------------------------

/// Scan submission from an input adapter.
///
/// `action`/`quantity` are optional: a camera or hardware scanner that
/// just POSTs `{"barcode": "..."}` gets the restock-by-one default.
#[derive(Debug, Deserialize)]
pub struct ScanSubmission {
    pub barcode: String,
    pub action: Option<String>,
    pub quantity: Option<i64>,
}

impl ScanSubmission {
    pub fn into_request(self) -> Result<ScanRequest, stocksync_core::DomainError> {
        let action = match self.action {
            Some(raw) => Some(raw.parse()?),
            None => None,
        };
        Ok(ScanRequest {
            barcode: self.barcode,
            action,
            quantity: self.quantity,
        })
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn receipt_to_json(receipt: &ScanReceipt) -> serde_json::Value {
    json!({
        "status": "success",
        "action": receipt.action.as_str(),
        "barcode_type": receipt.symbology.as_str(),
        "barcode": receipt.record.barcode.as_str(),
        "quantity": receipt.record.quantity,
        "scan_id": receipt.scan_id.to_string(),
    })
}

pub fn record_to_json(record: &InventoryRecord, authoritative: bool) -> serde_json::Value {
    json!({
        "barcode": record.barcode.as_str(),
        "warehouse_id": record.warehouse_id.as_str(),
        "quantity": record.quantity,
        "authoritative": authoritative,
    })
}

pub fn audit_entry_to_json(entry: &AuditEntry) -> serde_json::Value {
    json!({
        "barcode": entry.barcode.as_str(),
        "product_name": entry.product_name,
        "quantity": entry.quantity,
        "action": entry.action.as_str(),
        "received_at": entry.received_at.to_rfc3339(),
    })
}
