use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use unitdesk_catalog::ServiceStatus;
use unitdesk_core::ServiceId;
use unitdesk_infra::{ServiceFilter, ServiceSort};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_service).get(list_services))
        .route("/grouped", get(grouped_services))
        .route("/:id", get(get_service).delete(delete_service))
        .route("/:id/deactivate", post(deactivate_service))
}

pub async fn create_service(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreateServiceRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let input = match body.into_input() {
        Ok(i) => i,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store().add_service(input) {
        Ok(service) => (StatusCode::CREATED, Json(dto::service_to_json(&service))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_services(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::ListServicesQuery>, QueryRejection>,
) -> axum::response::Response {
    let q = match errors::query_params(params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let status = match q.status.as_deref().map(str::parse::<ServiceStatus>).transpose() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let sort = match q.sort.as_deref().map(str::trim) {
        None | Some("") | Some("insertion") => ServiceSort::Insertion,
        Some("recent") | Some("created_at") => ServiceSort::Recent,
        Some(other) => {
            return errors::validation_error(format!("sort must be insertion or recent (got {other:?})"));
        }
    };

    let filter = ServiceFilter {
        category: q.category.filter(|c| !c.trim().is_empty()),
        status,
        sort,
    };
    let items: Vec<_> = services
        .store()
        .list_services(&filter)
        .iter()
        .map(dto::service_to_json)
        .collect();
    Json(items).into_response()
}

/// GET /services/grouped: category → services.
pub async fn grouped_services(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let groups: serde_json::Map<String, serde_json::Value> = services
        .store()
        .services_by_category()
        .into_iter()
        .map(|(category, list)| {
            let items: Vec<_> = list.iter().map(dto::service_to_json).collect();
            (category, serde_json::Value::from(items))
        })
        .collect();
    Json(groups).into_response()
}

pub async fn get_service(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.store().get_service(&ServiceId::from(id.as_str())) {
        Ok(service) => Json(dto::service_to_json(&service)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_service(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.store().delete_service(&ServiceId::from(id.as_str())) {
        Ok(service) => Json(serde_json::json!({
            "deleted": true,
            "service": dto::service_to_json(&service),
        }))
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn deactivate_service(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.store().deactivate_service(&ServiceId::from(id.as_str())) {
        Ok(service) => Json(dto::service_to_json(&service)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
