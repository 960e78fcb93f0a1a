//! Process configuration.
//!
//! Everything comes from environment variables so the two warehouse
//! deployments differ only in their environment:
//!
//! - `WAREHOUSE_ID` / `PEER_WAREHOUSE_ID`: this site and the site whose
//!   updates we mirror
//! - `BIND_ADDR`: HTTP listen address
//! - `CATALOG_SEED`: JSON array of `{"barcode", "name"}` products
//! - `USE_PERSISTENT_STORES`: select Postgres + Redis backends
//!   (`DATABASE_URL`, `REDIS_URL`) over the in-memory ones

use anyhow::Context;

use stocksync_catalog::Product;
use stocksync_core::{Barcode, WarehouseId};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub warehouse_id: WarehouseId,
    pub peer_warehouse_id: WarehouseId,
    pub bind_addr: String,
    pub catalog: Vec<Product>,
    pub use_persistent_stores: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let warehouse_id = match std::env::var("WAREHOUSE_ID") {
            Ok(v) => WarehouseId::new(v).context("WAREHOUSE_ID")?,
            Err(_) => {
                tracing::warn!("WAREHOUSE_ID not set; defaulting to \"A\"");
                WarehouseId::new("A").expect("static id")
            }
        };

        let peer_warehouse_id = match std::env::var("PEER_WAREHOUSE_ID") {
            Ok(v) => WarehouseId::new(v).context("PEER_WAREHOUSE_ID")?,
            Err(_) => {
                tracing::warn!("PEER_WAREHOUSE_ID not set; defaulting to \"B\"");
                WarehouseId::new("B").expect("static id")
            }
        };

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let catalog = match std::env::var("CATALOG_SEED") {
            Ok(json) => serde_json::from_str(&json).context("CATALOG_SEED is not a valid product list")?,
            Err(_) => {
                tracing::warn!("CATALOG_SEED not set; using the dev catalog");
                dev_catalog()
            }
        };

        let use_persistent_stores = std::env::var("USE_PERSISTENT_STORES")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        Ok(Self {
            warehouse_id,
            peer_warehouse_id,
            bind_addr,
            catalog,
            use_persistent_stores,
        })
    }

    /// In-memory configuration for dev/test wiring.
    pub fn in_memory(warehouse_id: WarehouseId, peer_warehouse_id: WarehouseId, catalog: Vec<Product>) -> Self {
        Self {
            warehouse_id,
            peer_warehouse_id,
            bind_addr: "127.0.0.1:0".to_string(),
            catalog,
            use_persistent_stores: false,
        }
    }
}

fn dev_catalog() -> Vec<Product> {
    [("110650", "HN440"), ("856413007606", "Death Wish Coffee"), ("012345678905", "Widget")]
        .into_iter()
        .map(|(barcode, name)| Product {
            barcode: Barcode::new(barcode).expect("static barcode"),
            name: name.to_string(),
        })
        .collect()
}
