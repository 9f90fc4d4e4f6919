//! Report export endpoint.

use axum::{
    body::Body,
    extract::Query,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;

use super::helpers::ApiError;
use crate::export::{self, ExportFormat};
use crate::extraction::CanonicalReport;

/// Query params for export.
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Export format (json, csv)
    #[serde(default)]
    pub format: ExportFormat,
}

/// Render a previously returned report for download.
pub async fn export_report(
    Query(params): Query<ExportQuery>,
    Json(report): Json<CanonicalReport>,
) -> Result<Response, ApiError> {
    let rendered = export::render(&report, params.format).map_err(|e| ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: e.to_string(),
    })?;

    let stem = report
        .metadata
        .file_name
        .trim_end_matches(".pdf")
        .replace(|c: char| !c.is_ascii_alphanumeric() && c != '-' && c != '_', "_");
    let stem = if stem.is_empty() { "report".to_string() } else { stem };
    let disposition = format!(
        "attachment; filename=\"{}-extraction.{}\"",
        stem,
        params.format.as_str()
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, params.format.content_type())
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from(rendered))
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        })
}
