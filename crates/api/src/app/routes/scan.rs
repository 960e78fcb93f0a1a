use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn submit_scan(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ScanSubmission>,
) -> axum::response::Response {
    let request = match body.into_request() {
        Ok(request) => request,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    // Store + relay IO; keep it off the async workers.
    let result = tokio::task::spawn_blocking(move || services.scan(request)).await;

    match result {
        Ok(Ok(receipt)) => (StatusCode::OK, Json(dto::receipt_to_json(&receipt))).into_response(),
        Ok(Err(e)) => errors::scan_error_to_response(e),
        Err(e) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            format!("scan task failed: {e}"),
        ),
    }
}
