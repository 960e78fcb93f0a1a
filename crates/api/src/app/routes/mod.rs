use axum::{
    Router,
    routing::{get, post},
};

pub mod catalog;
pub mod inventory;
pub mod replica;
pub mod scan;
pub mod system;

/// Router for all warehouse endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/scan", post(scan::submit_scan))
        .route("/inventory", get(inventory::list_inventory))
        .route("/inventory/:barcode", get(inventory::get_inventory))
        .route("/replica/:warehouse/:barcode", get(replica::get_replica))
        .route("/audit/:warehouse", get(replica::list_audit))
        .route("/catalog/:barcode", get(catalog::get_product))
}
