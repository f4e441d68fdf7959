use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query, rejection::QueryRejection},
    response::IntoResponse,
};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

/// GET /search?q=&scope=services|performers&fields=a,b
///
/// Without `scope`, both collections are searched with their default fields.
pub async fn search(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::SearchQuery>, QueryRejection>,
) -> axum::response::Response {
    let q = match errors::query_params(params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let query = q.q.as_deref().unwrap_or("");
    let fields = dto::split_list(q.fields.as_deref());
    let store = services.store();

    match q.scope.as_deref().map(str::trim).unwrap_or("") {
        "services" => {
            let items: Vec<_> = store
                .search_services(query, &fields)
                .iter()
                .map(dto::service_to_json)
                .collect();
            Json(items).into_response()
        }
        "performers" => {
            let items: Vec<_> = store
                .search_performers(query, &fields)
                .iter()
                .map(dto::performer_to_json)
                .collect();
            Json(items).into_response()
        }
        "" | "all" => {
            let found_services: Vec<_> = store
                .search_services(query, &[])
                .iter()
                .map(dto::service_to_json)
                .collect();
            let found_performers: Vec<_> = store
                .search_performers(query, &[])
                .iter()
                .map(dto::performer_to_json)
                .collect();
            Json(serde_json::json!({
                "services": found_services,
                "performers": found_performers,
            }))
            .into_response()
        }
        other => errors::validation_error(format!(
            "scope must be services or performers (got {other:?})"
        )),
    }
}
