use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reels_core::error::{ErrorKind, ReelError};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`ReelError`] for job failures and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses
/// of the form `{ "success": false, "error": ..., "code": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A job failure from the orchestrator.
    #[error(transparent)]
    Reel(#[from] ReelError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// HTTP status for a job failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        k if k.is_client_error() => StatusCode::BAD_REQUEST,
        ErrorKind::EngineUnavailable | ErrorKind::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Reel(err) => {
                let status = status_for(err.kind());
                if status.is_server_error() {
                    tracing::error!(code = err.code(), error = %err, "Reel job failed");
                }
                (status, err.code(), err.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "success": false,
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
