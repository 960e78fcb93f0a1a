//! Barcode value type: validation, catalog-key normalization, symbology.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A decoded barcode string.
///
/// Constructed from whatever the input adapter decoded (camera or hardware
/// scanner); guaranteed non-empty and trimmed. Equality is on the raw string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Barcode(String);

impl Barcode {
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("barcode cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Catalog lookup key for this scan.
    ///
    /// Composite scans carry a serial suffix after a hyphen
    /// (e.g. `110650-2311164`); the catalog maps the prefix.
    pub fn catalog_key(&self) -> Barcode {
        match self.0.split_once('-') {
            Some((prefix, _)) if !prefix.is_empty() => Self(prefix.to_string()),
            _ => self.clone(),
        }
    }

    /// Classify the symbology by decoded length.
    pub fn symbology(&self) -> BarcodeSymbology {
        match self.0.len() {
            8 => BarcodeSymbology::Ean8,
            12 => BarcodeSymbology::UpcA,
            13 => BarcodeSymbology::Ean13,
            14 => BarcodeSymbology::Gtin14,
            _ => BarcodeSymbology::Code128,
        }
    }
}

impl core::fmt::Display for Barcode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Barcode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Barcode symbology, determined by decoded length.
///
/// Variable-length scans (alphanumeric, composite) fall back to CODE-128.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeSymbology {
    #[serde(rename = "EAN-8")]
    Ean8,
    #[serde(rename = "EAN-13")]
    Ean13,
    #[serde(rename = "UPC-A")]
    UpcA,
    #[serde(rename = "GTIN-14")]
    Gtin14,
    #[serde(rename = "CODE-128")]
    Code128,
}

impl BarcodeSymbology {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeSymbology::Ean8 => "EAN-8",
            BarcodeSymbology::Ean13 => "EAN-13",
            BarcodeSymbology::UpcA => "UPC-A",
            BarcodeSymbology::Gtin14 => "GTIN-14",
            BarcodeSymbology::Code128 => "CODE-128",
        }
    }
}

impl core::fmt::Display for BarcodeSymbology {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
