//! Product catalog: barcode → product resolution.
//!
//! The catalog is read-only to the scan pipeline; it is populated by
//! catalog administration, which lives outside this system.

pub mod product;

pub use product::{Catalog, InMemoryCatalog, Product};
