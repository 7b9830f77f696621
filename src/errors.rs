use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not authorized")]
    Unauthenticated,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("could not generate a unique share token")]
    CapabilityGenerationFailed,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            // Uniform message for every authentication failure so the
            // response never reveals whether the token was missing,
            // expired, malformed, or bound to a deleted account.
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "unauthenticated",
                "not authorized to access this route".to_string(),
            ),
            // Login failure is deliberately vague too: no distinction
            // between an unknown email and a wrong password.
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_credentials",
                "invalid email or password".to_string(),
            ),
            AppError::Forbidden(reason) => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "forbidden",
                reason.clone(),
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "not_found",
                format!("{} not found", what),
            ),
            AppError::Validation(reason) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "validation_failed",
                reason.clone(),
            ),
            AppError::CapabilityGenerationFailed => {
                tracing::error!("share token generation exhausted its retry budget");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "capability_generation_failed",
                    "internal server error".to_string(),
                )
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
