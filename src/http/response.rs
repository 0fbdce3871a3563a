//! Error-to-response mapping for the catalog surface.
//!
//! # Design Decisions
//! - Status codes follow the error taxonomy, one variant → one status
//! - Bodies are small JSON objects: `{"error": kind, "message": text}`
//! - Upstream detail is logged, not leaked beyond the message

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::catalog::CatalogError;

/// A [`CatalogError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub CatalogError);

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self(err)
    }
}

/// Status the presentation layer shows for each error.
pub fn status_for(err: &CatalogError) -> StatusCode {
    match err {
        CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
        CatalogError::Auth(_) => StatusCode::UNAUTHORIZED,
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        CatalogError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CatalogError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

/// JSON error body.
pub fn error_body(status: StatusCode, kind: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "error": kind, "message": message.into() })),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::warn!(error = %self.0, status = %status, "Catalog request failed");
        }
        error_body(status, self.0.kind(), self.0.to_string())
    }
}
