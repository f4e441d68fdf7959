use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use unitdesk_assignments::AssignmentStatus;
use unitdesk_core::{AssignmentId, DomainError, DomainResult, PerformerId, ServiceId};
use unitdesk_infra::AssignmentFilter;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_assignment).get(list_assignments))
        .route("/:id/complete", post(complete_assignment))
}

fn required_id<T>(field: &str, raw: Option<String>) -> DomainResult<T>
where
    T: core::str::FromStr<Err = DomainError>,
{
    match raw {
        Some(v) => v.parse(),
        None => Err(DomainError::validation(format!("{field} is required"))),
    }
}

pub async fn create_assignment(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreateAssignmentRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let ids = required_id::<ServiceId>("service_id", body.service_id).and_then(|service_id| {
        required_id::<PerformerId>("performer_id", body.performer_id).map(|p| (service_id, p))
    });
    let (service_id, performer_id) = match ids {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store().create_assignment(&service_id, &performer_id) {
        Ok(a) => (StatusCode::CREATED, Json(dto::assignment_to_json(&a))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// GET /assignments: newest first, joined with service/performer names.
pub async fn list_assignments(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::ListAssignmentsQuery>, QueryRejection>,
) -> axum::response::Response {
    let q = match errors::query_params(params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let status = match q.status.as_deref().map(str::parse::<AssignmentStatus>).transpose() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let filter = AssignmentFilter {
        status,
        service_id: q.service_id.as_deref().map(ServiceId::from),
        performer_id: q.performer_id.as_deref().map(PerformerId::from),
    };
    let items: Vec<_> = services
        .store()
        .list_assignments(&filter)
        .iter()
        .map(dto::assignment_view_to_json)
        .collect();
    Json(items).into_response()
}

pub async fn complete_assignment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.store().complete_assignment(&AssignmentId::from(id.as_str())) {
        Ok(a) => Json(dto::assignment_to_json(&a)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
