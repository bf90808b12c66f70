//! `{error: string}` responses.

use crate::FraudError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error payload for `/predict`. Status is 200 unless strict status codes are enabled.
#[derive(Debug)]
pub struct PredictError {
    status: StatusCode,
    message: String,
}

impl PredictError {
    pub fn from_fraud(err: &FraudError, strict: bool) -> Self {
        let status = match err {
            FraudError::ArtifactUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            FraudError::MalformedInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::with_status(status, err.to_string(), strict)
    }

    pub fn unavailable(reason: &str, strict: bool) -> Self {
        Self::with_status(StatusCode::SERVICE_UNAVAILABLE, reason.to_string(), strict)
    }

    fn with_status(status: StatusCode, message: String, strict: bool) -> Self {
        Self {
            status: if strict { status } else { StatusCode::OK },
            message,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
