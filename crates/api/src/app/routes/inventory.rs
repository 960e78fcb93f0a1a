use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use stocksync_core::Barcode;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn get_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Path(barcode): Path<String>,
) -> axum::response::Response {
    let barcode: Barcode = match barcode.parse() {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    let record = tokio::task::spawn_blocking(move || services.inventory_get(&barcode)).await;
    match record {
        Ok(record) => (StatusCode::OK, Json(dto::record_to_json(&record, true))).into_response(),
        Err(e) => errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", e.to_string()),
    }
}

pub async fn list_inventory(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let records = tokio::task::spawn_blocking(move || services.inventory_list()).await;
    match records {
        Ok(records) => {
            let items: Vec<_> = records.iter().map(|r| dto::record_to_json(r, true)).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", e.to_string()),
    }
}
