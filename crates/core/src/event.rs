//! Scan actions and the change event that replicates them.

use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::barcode::Barcode;
use crate::error::DomainError;
use crate::warehouse::WarehouseId;

/// What a scan does to the quantity of a record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanAction {
    Restock,
    Sale,
    Adjust,
}

impl ScanAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanAction::Restock => "RESTOCK",
            ScanAction::Sale => "SALE",
            ScanAction::Adjust => "ADJUST",
        }
    }

    /// Signed quantity delta this action applies to a record.
    ///
    /// `Restock` adds, `Sale` subtracts; `Adjust` carries the sign itself.
    pub fn signed_delta(&self, quantity: i64) -> i64 {
        match self {
            ScanAction::Restock => quantity,
            ScanAction::Sale => -quantity,
            ScanAction::Adjust => quantity,
        }
    }
}

impl core::fmt::Display for ScanAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RESTOCK" => Ok(ScanAction::Restock),
            "SALE" => Ok(ScanAction::Sale),
            "ADJUST" => Ok(ScanAction::Adjust),
            other => Err(DomainError::validation(format!(
                "action must be one of RESTOCK, SALE, ADJUST (got {other:?})"
            ))),
        }
    }
}

/// One applied local mutation, as a fact.
///
/// Created once per successful scan, serialized, published to the peer
/// warehouse, and discarded. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub action: ScanAction,
    pub barcode: Barcode,
    pub product_name: String,
    /// Quantity as submitted: magnitude for RESTOCK/SALE, signed for ADJUST.
    pub quantity: i64,
    pub origin_warehouse: WarehouseId,
    pub observed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parses_case_insensitively() {
        assert_eq!("sale".parse::<ScanAction>().unwrap(), ScanAction::Sale);
        assert_eq!("RESTOCK".parse::<ScanAction>().unwrap(), ScanAction::Restock);
        assert!("checkout".parse::<ScanAction>().is_err());
    }

    #[test]
    fn action_serializes_screaming_case() {
        assert_eq!(serde_json::to_string(&ScanAction::Adjust).unwrap(), "\"ADJUST\"");
    }

    #[test]
    fn signed_delta_follows_action() {
        assert_eq!(ScanAction::Restock.signed_delta(3), 3);
        assert_eq!(ScanAction::Sale.signed_delta(3), -3);
        assert_eq!(ScanAction::Adjust.signed_delta(-2), -2);
    }
}
