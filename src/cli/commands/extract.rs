//! Extract command.

use std::path::Path;

use console::style;

use watershed_extract::config::ExtractorConfig;
use watershed_extract::export::{self, ExportFormat};
use watershed_extract::extraction::{ExtractionOptions, Extractor};

/// Extract a report from a PDF and print or save it.
pub async fn cmd_extract(
    config: &ExtractorConfig,
    file: &Path,
    options: ExtractionOptions,
    format: ExportFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let extractor = Extractor::from_config(config);
    if !extractor.has_providers() {
        eprintln!("{} No LLM provider configured", style("✗").red());
        for status in extractor.providers_status() {
            eprintln!("  {} {}", style("→").dim(), status.hint);
        }
        anyhow::bail!("no providers configured");
    }

    let bytes = tokio::fs::read(file).await?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document.pdf".to_string());

    eprintln!(
        "{} Extracting {} ({} bytes)",
        style("→").cyan(),
        style(&file_name).bold(),
        bytes.len()
    );

    let report = extractor.extract_pdf(bytes, &file_name, &options).await?;

    eprintln!(
        "  {} {} goals, {} BMPs, {} activities via {} in {:.1}s",
        style("✓").green(),
        report.summary.total_goals,
        report.summary.total_bmps,
        report.implementation.len(),
        report.metadata.processing_method,
        report.summary.processing_time_ms as f64 / 1000.0
    );

    let rendered = export::render(&report, format)?;
    match output {
        Some(path) => {
            tokio::fs::write(path, rendered).await?;
            eprintln!(
                "  {} Wrote {} to {}",
                style("✓").green(),
                format.as_str(),
                path.display()
            );
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
