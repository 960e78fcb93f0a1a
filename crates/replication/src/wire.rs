//! JSON wire format for relayed inventory changes.
//!
//! ```text
//! { "action": "<RESTOCK|SALE|ADJUST>",
//!   "data": { "barcode": "<string>", "product_name": "<string>", "quantity": <integer> },
//!   "sequence": <integer, optional> }
//! ```
//!
//! `sequence` is a per-origin monotonic counter used for duplicate
//! suppression. Messages without it (older publishers) are still
//! accepted; they just bypass suppression.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stocksync_core::{ChangeEvent, ScanAction};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed event payload: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireData {
    pub barcode: String,
    pub product_name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub action: ScanAction,
    pub data: WireData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
}

impl WireMessage {
    pub fn from_event(event: &ChangeEvent, sequence: u64) -> Self {
        Self {
            action: event.action,
            data: WireData {
                barcode: event.barcode.as_str().to_string(),
                product_name: event.product_name.clone(),
                quantity: event.quantity,
            },
            sequence: Some(sequence),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(payload: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(payload).map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stocksync_core::{Barcode, WarehouseId};

    fn sale_event() -> ChangeEvent {
        ChangeEvent {
            action: ScanAction::Sale,
            barcode: Barcode::new("012345678905").unwrap(),
            product_name: "Widget".to_string(),
            quantity: 1,
            origin_warehouse: WarehouseId::new("A").unwrap(),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn encodes_the_published_shape() {
        let msg = WireMessage::from_event(&sale_event(), 7);
        let json: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();

        assert_eq!(json["action"], "SALE");
        assert_eq!(json["data"]["barcode"], "012345678905");
        assert_eq!(json["data"]["product_name"], "Widget");
        assert_eq!(json["data"]["quantity"], 1);
        assert_eq!(json["sequence"], 7);
    }

    #[test]
    fn decodes_messages_without_a_sequence() {
        let msg = WireMessage::decode(
            r#"{"action":"RESTOCK","data":{"barcode":"110650","product_name":"HN440","quantity":5}}"#,
        )
        .unwrap();

        assert_eq!(msg.action, ScanAction::Restock);
        assert_eq!(msg.sequence, None);
        assert_eq!(msg.data.quantity, 5);
    }

    #[test]
    fn rejects_garbage_and_unknown_actions() {
        assert!(WireMessage::decode("not json at all").is_err());
        assert!(
            WireMessage::decode(
                r#"{"action":"TELEPORT","data":{"barcode":"1","product_name":"x","quantity":1}}"#
            )
            .is_err()
        );
        assert!(
            WireMessage::decode(r#"{"action":"SALE","data":{"barcode":"1","quantity":1}}"#).is_err()
        );
    }
}
