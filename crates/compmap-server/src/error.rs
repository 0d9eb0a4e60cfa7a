use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use compmap_core::CompmapError;

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(CompmapError::Validation(msg.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if let Some(e) = self.0.downcast_ref::<CompmapError>() {
            match e {
                CompmapError::ProcessNotFound(_)
                | CompmapError::SubprocessNotFound(_)
                | CompmapError::UnitNotFound(_) => StatusCode::NOT_FOUND,
                CompmapError::RoleNotAllowed { .. } => StatusCode::FORBIDDEN,
                CompmapError::InvalidTransition { .. }
                | CompmapError::StaleEligibility { .. }
                | CompmapError::FinalizationBlocked { .. }
                | CompmapError::PartialBulkFailure { .. } => StatusCode::CONFLICT,
                CompmapError::Validation(_) => StatusCode::BAD_REQUEST,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
