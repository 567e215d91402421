use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::form::FieldErrors;
use crate::prediction::session::GENERIC_FAILURE;
use crate::prediction::PredictionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    #[error("Prediction error: {0}")]
    Prediction(#[from] PredictionError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, fields) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                "Some fields need attention".to_string(),
                Some(errors),
            ),
            AppError::Prediction(e) => {
                tracing::error!("Prediction error: {e}");
                let status = match e {
                    PredictionError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, "PREDICTION_FAILED", GENERIC_FAILURE.to_string(), None)
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(fields) = fields {
            error["fields"] = json!(fields);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
