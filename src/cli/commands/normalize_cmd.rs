//! Normalize command: show the text a provider would see.

use std::path::Path;

use console::style;

use watershed_extract::config::ExtractorConfig;
use watershed_extract::normalize::normalize;
use watershed_extract::pdf;

/// Print the cleaned, page-marked text of a PDF.
pub async fn cmd_normalize(config: &ExtractorConfig, file: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file).await?;
    pdf::validate_upload(&bytes, config.max_upload_bytes)?;

    let text = pdf::extract_pdf_text_async(bytes).await?;
    let normalized = normalize(&text.full_text, text.page_count)?;

    eprintln!(
        "{} {} pages, {} chars raw, {} chars normalized",
        style("→").cyan(),
        normalized.page_count(),
        text.full_text.len(),
        normalized.combined_text.len()
    );
    println!("{}", normalized.combined_text);

    Ok(())
}
