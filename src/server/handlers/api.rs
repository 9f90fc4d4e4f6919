//! Service status endpoint.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use super::super::AppState;
use crate::extraction::ProviderStatus;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" when at least one provider can be called, else "degraded".
    pub status: &'static str,
    pub version: &'static str,
    pub providers: Vec<ProviderStatus>,
    #[serde(rename = "maxUploadBytes")]
    pub max_upload_bytes: usize,
}

/// Health check with provider availability.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.extractor.has_providers() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        providers: state.extractor.providers_status().to_vec(),
        max_upload_bytes: state.config.max_upload_bytes,
    })
}
