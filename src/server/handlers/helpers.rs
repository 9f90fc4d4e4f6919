//! Error responses shared by the handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use tracing::{debug, warn};

use crate::extraction::ExtractError;
use crate::pdf::PdfError;

/// An error rendered as `{"error": "..."}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        let status = match &err {
            ExtractError::Pdf(PdfError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ExtractError::Pdf(PdfError::NotPdf(_)) => StatusCode::BAD_REQUEST,
            ExtractError::Pdf(_) | ExtractError::EmptyDocument => StatusCode::UNPROCESSABLE_ENTITY,
            ExtractError::NoProvidersConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ExtractError::AllProvidersFailed { .. } => StatusCode::BAD_GATEWAY,
        };
        if err.is_input_error() {
            debug!("Rejected upload: {}", err);
        } else {
            warn!("Extraction failed: {}", err);
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
