//! `stocksync-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod barcode;
pub mod error;
pub mod event;
pub mod warehouse;

pub use barcode::{Barcode, BarcodeSymbology};
pub use error::{DomainError, DomainResult};
pub use event::{ChangeEvent, ScanAction};
pub use warehouse::WarehouseId;
