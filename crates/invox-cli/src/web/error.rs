//! HTTP error mapping for the web UI.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use invox_core::{ExtractionError, InvoxError, OcrError};

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    PayloadTooLarge(String),
    NoText(String),
    EngineUnavailable(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NoText(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(m)
            | ApiError::NotFound(m)
            | ApiError::PayloadTooLarge(m)
            | ApiError::NoText(m)
            | ApiError::EngineUnavailable(m)
            | ApiError::Internal(m) => m,
        }
    }
}

impl From<InvoxError> for ApiError {
    fn from(err: InvoxError) -> Self {
        let message = err.to_string();
        match err {
            InvoxError::UnsupportedFormat(_) | InvoxError::Image(_) => {
                ApiError::BadRequest(message)
            }
            InvoxError::Ocr(OcrError::InvalidImage(_)) => ApiError::BadRequest(message),
            InvoxError::Ocr(OcrError::EngineUnavailable { .. }) => {
                ApiError::EngineUnavailable(message)
            }
            InvoxError::Extraction(ExtractionError::NoText) => ApiError::NoText(
                "No text detected. Try a clearer image with better lighting.".to_string(),
            ),
            _ => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
