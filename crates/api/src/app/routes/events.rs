use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query, rejection::QueryRejection},
    response::IntoResponse,
};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

/// GET /events?from=&to=
///
/// Journal entries in commit order, optionally restricted to an inclusive
/// ISO-8601 range on `occurred_at`.
pub async fn list_events(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::DateRangeQuery>, QueryRejection>,
) -> axum::response::Response {
    let q = match errors::query_params(params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let events = services.store().events(q.from.as_deref(), q.to.as_deref());
    let items: Vec<_> = events.iter().map(dto::envelope_to_json).collect();
    Json(serde_json::json!({ "total": items.len(), "items": items })).into_response()
}
