//! API error types and the structured HTTP error envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use composite::CompositeError;
use resilient::DownstreamError;
use serde::Serialize;

/// Error envelope returned by every failing endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpErrorInfo {
    pub timestamp: DateTime<Utc>,
    pub path: String,
    pub http_status: String,
    pub message: String,
}

impl HttpErrorInfo {
    pub fn new(status: StatusCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            path: path.into(),
            http_status: status_name(status),
            message: message.into(),
        }
    }
}

/// Renders a status as its constant-style name, e.g. `NOT_FOUND`.
pub fn status_name(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => reason.to_uppercase().replace(' ', "_").replace('-', "_"),
        None => status.as_u16().to_string(),
    }
}

/// API-level error carrying the request path for the envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub path: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Maps a composite operation error onto an HTTP status.
    ///
    /// Invalid input (bad id, duplicate key) is the caller's fault: 422.
    /// A missing product is 404. An unavailable or timed-out critical leg
    /// is 503 so callers know to retry later. Everything else is 500.
    pub fn from_composite(path: &str, error: CompositeError) -> Self {
        let status = match &error {
            CompositeError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CompositeError::Downstream(downstream) => match downstream {
                DownstreamError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DownstreamError::NotFound(_) => StatusCode::NOT_FOUND,
                DownstreamError::Timeout { .. } | DownstreamError::Unavailable { .. } => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                DownstreamError::Unknown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            CompositeError::Channel(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, path, error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, path = %self.path, error = %self.message, "request failed");
        } else {
            tracing::debug!(status = %self.status, path = %self.path, error = %self.message, "request rejected");
        }
        metrics::counter!("http_request_errors_total", "status" => self.status.as_u16().to_string())
            .increment(1);

        let body = HttpErrorInfo::new(self.status, self.path, self.message);
        (self.status, Json(body)).into_response()
    }
}
