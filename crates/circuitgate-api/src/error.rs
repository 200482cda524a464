// circuitgate-api/src/error.rs
// ============================================================================
// Module: API Error Response
// Description: Translates `circuitgate_core::AppError` into the shared
//              `{error, message, error_code?, timestamp}` envelope (§6, §7).
// Purpose: One `IntoResponse` impl so every route returns `Result<_, ApiError>`
//          and never hand-builds an error response.
// Dependencies: circuitgate-core, axum, serde, time
// ============================================================================

//! ## Overview
//! `ApiError` wraps [`AppError`] with an optional stable error code
//! (`AUTH_###`, `UPLD_###`, `TASK_###`, `VALD_###` per §6) used for
//! programmatic handling by callers; the envelope's `message` is always a
//! safe summary, never an internal detail.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use circuitgate_core::AppError;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// An HTTP-facing error: an [`AppError`] plus an optional stable code.
#[derive(Debug)]
pub struct ApiError {
    /// The underlying error taxonomy variant.
    pub source: AppError,
    /// A stable machine-readable code (e.g. `"UPLD_001"`), when the route
    /// has one to offer.
    pub error_code: Option<&'static str>,
}

impl ApiError {
    /// Wraps an [`AppError`] with no error code.
    #[must_use]
    pub fn new(source: AppError) -> Self {
        Self { source, error_code: None }
    }

    /// Wraps an [`AppError`] with a stable error code.
    #[must_use]
    pub fn coded(source: AppError, error_code: &'static str) -> Self {
        Self { source, error_code: Some(error_code) }
    }
}

impl From<AppError> for ApiError {
    fn from(source: AppError) -> Self {
        Self::new(source)
    }
}

/// The wire shape of every 4xx/5xx response (§6).
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
    timestamp: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.source.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string());
        let body = ErrorBody {
            error: error_label(&self.source).to_string(),
            message: self.source.to_string(),
            error_code: self.error_code,
            timestamp,
        };
        (status, Json(body)).into_response()
    }
}

/// The `error` field's stable label for each taxonomy variant (§7).
fn error_label(error: &AppError) -> &'static str {
    match error {
        AppError::InvalidInput(_) => "InvalidInput",
        AppError::Authentication => "Authentication",
        AppError::Authorization => "Authorization",
        AppError::NotFound(_) => "NotFound",
        AppError::InvalidState(_) => "InvalidState",
        AppError::RateLimited => "RateLimited",
        AppError::External(_) => "External",
        AppError::Internal(_) => "Internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_matches_taxonomy() {
        let err = ApiError::new(AppError::NotFound("task".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn rate_limited_maps_to_429() {
        let err = ApiError::new(AppError::RateLimited);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
