//! Channel hub endpoints: channels, distribution, messages, data, stats.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::Value as JsonValue;

use unitdesk_channels::DataQuery;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/channels", get(list_channels))
        .route("/channels/:id", get(get_channel).put(update_channel))
        .route("/distribute", post(distribute))
        .route("/messages", get(list_messages).post(post_message))
        .route("/collect", post(collect))
        .route("/data", get(list_data))
        .route("/stats", get(stats))
}

pub async fn list_channels(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    Json(services.hub().list_channels()).into_response()
}

pub async fn get_channel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.hub().get_channel(&id) {
        Ok(c) => Json(c).into_response(),
        Err(e) => errors::channel_error_to_response(e),
    }
}

pub async fn update_channel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::UpdateChannelRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let Some(enabled) = body.enabled else {
        return errors::validation_error("enabled is required");
    };

    match services.hub().update_channel(&id, enabled) {
        Ok(c) => Json(c).into_response(),
        Err(e) => errors::channel_error_to_response(e),
    }
}

/// POST /distribute
///
/// Always 200 once validated: per-channel failures are reported in `results`.
pub async fn distribute(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::DistributeRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let message = body.message.unwrap_or_default();
    let channels = body.channels.unwrap_or_default();
    let settings = body.settings.unwrap_or(JsonValue::Null);

    match services.hub().distribute(&message, &channels, &settings) {
        Ok(d) => Json(d).into_response(),
        Err(e) => errors::channel_error_to_response(e),
    }
}

pub async fn list_messages(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    Json(services.hub().list_messages()).into_response()
}

pub async fn post_message(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::PostMessageRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let text = body.text.unwrap_or_default();

    match services.hub().post_message(&text, body.channel.as_deref()) {
        Ok(m) => (StatusCode::CREATED, Json(m)).into_response(),
        Err(e) => errors::channel_error_to_response(e),
    }
}

pub async fn collect(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CollectRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let source = body.source.unwrap_or_default();
    let data = body.data.unwrap_or(JsonValue::Null);

    match services.hub().collect(&source, data, body.kind.as_deref()) {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => errors::channel_error_to_response(e),
    }
}

/// GET /data?source=&type=&from=&to=&limit=
pub async fn list_data(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::ListDataQuery>, QueryRejection>,
) -> axum::response::Response {
    let q = match errors::query_params(params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let query = DataQuery {
        source: q.source,
        kind: q.kind,
        from: q.from,
        to: q.to,
        limit: q.limit,
    };
    Json(services.hub().list_data(&query)).into_response()
}

pub async fn stats(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    Json(services.hub().stats()).into_response()
}
