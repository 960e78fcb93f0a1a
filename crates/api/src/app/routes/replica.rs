use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use stocksync_core::{Barcode, WarehouseId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn get_replica(
    Extension(services): Extension<Arc<AppServices>>,
    Path((warehouse, barcode)): Path<(String, String)>,
) -> axum::response::Response {
    let warehouse: WarehouseId = match warehouse.parse() {
        Ok(w) => w,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };
    let barcode: Barcode = match barcode.parse() {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    let record = tokio::task::spawn_blocking(move || services.replica_get(&warehouse, &barcode)).await;
    match record {
        Ok(record) => (StatusCode::OK, Json(dto::record_to_json(&record, false))).into_response(),
        Err(e) => errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", e.to_string()),
    }
}

pub async fn list_audit(
    Extension(services): Extension<Arc<AppServices>>,
    Path(warehouse): Path<String>,
) -> axum::response::Response {
    let warehouse: WarehouseId = match warehouse.parse() {
        Ok(w) => w,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    let entries = tokio::task::spawn_blocking(move || services.audit_entries(&warehouse)).await;
    match entries {
        Ok(entries) => {
            let rows: Vec<_> = entries.iter().map(dto::audit_entry_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "entries": rows }))).into_response()
        }
        Err(e) => errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", e.to_string()),
    }
}
