use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use stocksync_core::Barcode;

/// A catalog entry: the product identity a barcode maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub barcode: Barcode,
    pub name: String,
}

/// Barcode → product lookup.
///
/// Pure lookup, no mutation from the scan pipeline. `None` means the
/// barcode has no mapped product, which aborts a scan before any store
/// mutation.
pub trait Catalog: Send + Sync {
    fn resolve(&self, barcode: &Barcode) -> Option<Product>;
}

impl<C> Catalog for Arc<C>
where
    C: Catalog + ?Sized,
{
    fn resolve(&self, barcode: &Barcode) -> Option<Product> {
        (**self).resolve(barcode)
    }
}

/// In-memory catalog.
///
/// Seeded at startup; `upsert` exists for the external administration
/// path and for tests.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<HashMap<Barcode, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let catalog = Self::new();
        for product in products {
            catalog.upsert(product);
        }
        catalog
    }

    pub fn upsert(&self, product: Product) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(product.barcode.clone(), product);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Catalog for InMemoryCatalog {
    fn resolve(&self, barcode: &Barcode) -> Option<Product> {
        let map = self.inner.read().ok()?;
        map.get(barcode).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> Product {
        Product {
            barcode: Barcode::new("012345678905").unwrap(),
            name: "Widget".to_string(),
        }
    }

    #[test]
    fn resolves_known_barcode() {
        let catalog = InMemoryCatalog::with_products([widget()]);
        let found = catalog.resolve(&Barcode::new("012345678905").unwrap()).unwrap();
        assert_eq!(found.name, "Widget");
    }

    #[test]
    fn unknown_barcode_resolves_to_none() {
        let catalog = InMemoryCatalog::with_products([widget()]);
        assert!(catalog.resolve(&Barcode::new("999999999999").unwrap()).is_none());
    }

    #[test]
    fn upsert_replaces_existing_mapping() {
        let catalog = InMemoryCatalog::with_products([widget()]);
        catalog.upsert(Product {
            barcode: Barcode::new("012345678905").unwrap(),
            name: "Widget Mk2".to_string(),
        });
        let found = catalog.resolve(&Barcode::new("012345678905").unwrap()).unwrap();
        assert_eq!(found.name, "Widget Mk2");
        assert_eq!(catalog.len(), 1);
    }
}
