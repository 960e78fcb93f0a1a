use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::services::AppServices;

pub async fn health(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "warehouse": services.warehouse_id().as_str(),
            "peer": services.peer_warehouse_id().as_str(),
            "replication": services.replication_state().as_str(),
        })),
    )
        .into_response()
}
