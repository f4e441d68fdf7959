use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use crate::app::services::AppServices;

/// GET /metrics
pub async fn get_metrics(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    Json(services.store().metrics()).into_response()
}
