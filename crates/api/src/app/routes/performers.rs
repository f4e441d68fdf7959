use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use unitdesk_catalog::PerformerStatus;
use unitdesk_core::PerformerId;
use unitdesk_infra::{PerformerFilter, PerformerSort};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_performer).get(list_performers))
        .route("/grouped", get(grouped_performers))
        .route("/:id", get(get_performer))
        .route("/:id/status", put(set_status))
}

pub async fn create_performer(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreatePerformerRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let input = match body.into_input() {
        Ok(i) => i,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store().add_performer(input) {
        Ok(p) => (StatusCode::CREATED, Json(dto::performer_to_json(&p))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_performers(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::ListPerformersQuery>, QueryRejection>,
) -> axum::response::Response {
    let q = match errors::query_params(params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let status = match q.status.as_deref().map(str::parse::<PerformerStatus>).transpose() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let sort = match q.sort.as_deref().map(str::trim) {
        None | Some("") | Some("insertion") => PerformerSort::Insertion,
        Some("status") | Some("rating") => PerformerSort::StatusThenRating,
        Some(other) => {
            return errors::validation_error(format!("sort must be insertion or status (got {other:?})"));
        }
    };

    let filter = PerformerFilter {
        status,
        skill: q.skill.filter(|s| !s.trim().is_empty()),
        sort,
    };
    let items: Vec<_> = services
        .store()
        .list_performers(&filter)
        .iter()
        .map(dto::performer_to_json)
        .collect();
    Json(items).into_response()
}

/// GET /performers/grouped: primary skill → performers.
pub async fn grouped_performers(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let groups: serde_json::Map<String, serde_json::Value> = services
        .store()
        .performers_by_skill()
        .into_iter()
        .map(|(skill, list)| {
            let items: Vec<_> = list.iter().map(dto::performer_to_json).collect();
            (skill, serde_json::Value::from(items))
        })
        .collect();
    Json(groups).into_response()
}

pub async fn get_performer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.store().get_performer(&PerformerId::from(id.as_str())) {
        Ok(p) => Json(dto::performer_to_json(&p)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::SetPerformerStatusRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let status = match body.status.as_deref().map(str::parse::<PerformerStatus>).transpose() {
        Ok(Some(s)) => s,
        Ok(None) => return errors::validation_error("status is required"),
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .store()
        .set_performer_status(&PerformerId::from(id.as_str()), status)
    {
        Ok(p) => Json(dto::performer_to_json(&p)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
