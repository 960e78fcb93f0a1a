use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use stocksync_core::Barcode;

use crate::app::services::AppServices;
use crate::app::errors;

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(barcode): Path<String>,
) -> axum::response::Response {
    let barcode: Barcode = match barcode.parse() {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    match services.catalog_resolve(&barcode) {
        Some(product) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "barcode": product.barcode.as_str(),
                "name": product.name,
            })),
        )
            .into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "unknown_barcode", "barcode not in catalog"),
    }
}
