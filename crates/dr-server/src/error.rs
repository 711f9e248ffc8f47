//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`dr_core::Error`] so that route handlers
//! can return `Result<T, AppError>` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError {
    inner: dr_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: dr_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn inner(&self) -> &dr_core::Error {
        &self.inner
    }
}

impl From<dr_core::Error> for AppError {
    fn from(e: dr_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Full detail goes to the log only; the body carries the public summary.
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                request_id = ?self.request_id,
                "Server error in API handler"
            );
        } else {
            tracing::info!(status = %status, error = %self.inner, "Request rejected");
        }

        let body = json!({
            "detail": self.inner.public_message(),
            "code": self.inner.code(),
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}
