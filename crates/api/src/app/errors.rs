use axum::Json;
use axum::extract::Query;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use unitdesk_channels::ChannelError;
use unitdesk_core::DomainError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match &err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Unavailable(_) | DomainError::InvalidState(_) | DomainError::Conflict(_) => {
            StatusCode::CONFLICT
        }
    };
    json_error(status, err.code(), err.to_string())
}

pub fn channel_error_to_response(err: ChannelError) -> axum::response::Response {
    let status = match &err {
        ChannelError::Validation(_) => StatusCode::BAD_REQUEST,
        ChannelError::Unsupported(_) | ChannelError::Disabled(_) | ChannelError::NotConfigured(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };
    json_error(status, err.code(), err.to_string())
}

pub fn validation_error(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

/// Unwrap a JSON body, turning malformed payloads into `validation_error`.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| validation_error(rejection.body_text()))
}

/// Unwrap query parameters, turning unparsable values into `validation_error`.
pub fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, axum::response::Response> {
    params
        .map(|Query(query)| query)
        .map_err(|rejection| validation_error(rejection.body_text()))
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
