use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stocksync_gateway::ScanError;
use stocksync_store::StoreError;

pub fn scan_error_to_response(err: ScanError) -> axum::response::Response {
    match err {
        ScanError::UnknownBarcode(barcode) => json_error(
            StatusCode::BAD_REQUEST,
            "unknown_barcode",
            format!("no product mapped for barcode {barcode}"),
        ),
        ScanError::Invalid(e) => json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
        ScanError::Store(StoreError::InsufficientStock { .. }) => json_error(
            StatusCode::CONFLICT,
            "insufficient_stock",
            err.to_string(),
        ),
        ScanError::Store(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "status": "error",
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
