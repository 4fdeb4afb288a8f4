//! Error handler for converting AppError to HTTP responses.
//!
//! Client errors keep their message. Store and infrastructure failures are
//! reported as a generic `Server error` so internal details never reach the
//! caller; they are logged where they occur, not here.

use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;

/// Message returned for every server-side failure without a specific one.
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

impl IntoResponse for AppError {
    /// # Status Code Mapping
    /// - NotFound → 404 NOT_FOUND
    /// - Validation / ValidationErrors → 400 VALIDATION_ERROR
    /// - BadRequest → 400 BAD_REQUEST
    /// - Server → 500 with its own message
    /// - Database / ConnectionPool / Internal → 500 `Server error`
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::NotFound { entity, .. } => {
                (StatusCode::NOT_FOUND, ErrorResponse::not_found(entity))
            }
            AppError::Validation { field, reason } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_ERROR", reason)
                    .with_details(json!([{ "field": field, "message": reason }])),
            ),
            AppError::ValidationErrors { errors } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_ERROR", "Validation failed")
                    .with_details(json!(errors)),
            ),
            AppError::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("BAD_REQUEST", message),
            ),
            AppError::Server { message, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("INTERNAL_ERROR", message),
            ),
            AppError::Database { .. } | AppError::ConnectionPool { .. } | AppError::Internal { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("INTERNAL_ERROR", SERVER_ERROR_MESSAGE),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Rewrites error responses that are not JSON (axum rejections, unknown
/// routes, body limits) into the `ErrorResponse` format and tags JSON-less
/// errors with the request id.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().cloned();
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    let (_parts, body) = response.into_parts();
    let original_message = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(_) => String::new(),
    };

    let mut error_response = fallback_error(status, original_message);
    if let Some(RequestId(id)) = request_id {
        error_response = error_response.with_request_id(&id);
    }

    (status, Json(error_response)).into_response()
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

fn fallback_error(status: StatusCode, original_message: String) -> ErrorResponse {
    if status.is_server_error() {
        return ErrorResponse::new("INTERNAL_ERROR", SERVER_ERROR_MESSAGE);
    }

    let (code, default_message) = match status {
        StatusCode::BAD_REQUEST => ("BAD_REQUEST", "Bad request"),
        StatusCode::NOT_FOUND => ("NOT_FOUND", "The requested resource was not found"),
        StatusCode::METHOD_NOT_ALLOWED => {
            ("METHOD_NOT_ALLOWED", "HTTP method not allowed for this endpoint")
        }
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ("UNSUPPORTED_MEDIA_TYPE", "Unsupported media type"),
        StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "Request payload too large"),
        _ => ("BAD_REQUEST", "Bad request"),
    };

    if original_message.is_empty() {
        ErrorResponse::new(code, default_message)
    } else {
        ErrorResponse::new(code, &original_message)
    }
}
