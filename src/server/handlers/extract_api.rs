//! PDF upload and extraction endpoint.

use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use tracing::{debug, info};

use super::super::AppState;
use super::helpers::ApiError;
use crate::extraction::ExtractionOptions;
use crate::llm::ProviderKind;

/// Fields collected from the multipart form.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    provider: Option<String>,
    allow_fallback: Option<String>,
    temperature: Option<String>,
    max_tokens: Option<String>,
}

/// Extract a report from an uploaded PDF.
///
/// Form fields: `file` (required), `provider`, `allowFallback`,
/// `temperature`, `maxTokens`. Missing options use the server defaults.
pub async fn extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_form(multipart).await?;
    let options = build_options(&form, state.config.default_options())?;

    let (file_name, bytes) = form
        .file
        .ok_or_else(|| ApiError::bad_request("Missing 'file' field"))?;

    info!("Extraction request: {} ({} bytes)", file_name, bytes.len());
    let report = state.extractor.extract_pdf(bytes, &file_name, &options).await?;

    Ok(Json(report))
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or("upload.pdf")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
                form.file = Some((file_name, bytes.to_vec()));
            }
            "provider" | "allowFallback" | "temperature" | "maxTokens" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid '{}' field: {}", name, e)))?;
                let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                match name.as_str() {
                    "provider" => form.provider = value,
                    "allowFallback" => form.allow_fallback = value,
                    "temperature" => form.temperature = value,
                    _ => form.max_tokens = value,
                }
            }
            other => debug!("Ignoring unknown form field '{}'", other),
        }
    }

    Ok(form)
}

fn build_options(form: &UploadForm, defaults: ExtractionOptions) -> Result<ExtractionOptions, ApiError> {
    let mut options = defaults;

    if let Some(provider) = &form.provider {
        let kind = ProviderKind::from_str(provider)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown provider '{}'", provider)))?;
        options.preferred_provider = Some(kind);
    }
    if let Some(value) = &form.allow_fallback {
        options.allow_fallback = match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => return Err(ApiError::bad_request(format!("Invalid allowFallback '{}'", value))),
        };
    }
    if let Some(value) = &form.temperature {
        options.temperature = value
            .parse::<f32>()
            .ok()
            .filter(|t| (0.0..=2.0).contains(t))
            .ok_or_else(|| ApiError::bad_request(format!("Invalid temperature '{}'", value)))?;
    }
    if let Some(value) = &form.max_tokens {
        options.max_tokens = value
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid maxTokens '{}'", value)))?;
    }

    Ok(options)
}
