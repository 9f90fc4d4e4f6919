//! Providers command.

use console::style;

use watershed_extract::config::ExtractorConfig;
use watershed_extract::extraction::Extractor;

/// Show which providers are configured and in what order they are tried.
pub async fn cmd_providers(config: &ExtractorConfig) -> anyhow::Result<()> {
    let extractor = Extractor::from_config(config);

    println!("\n{}", style("LLM Providers").bold());
    println!("{}", "-".repeat(40));

    for status in extractor.providers_status() {
        let marker = if status.configured {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!(
            "  {} {:<10} {}",
            marker,
            status.provider.display_name(),
            style(&status.model).dim()
        );
        if !status.configured {
            println!("      {}", status.hint);
        }
    }

    let plan = extractor.plan(&config.default_options());
    if plan.is_empty() {
        println!("\n{} No provider configured", style("!").yellow());
    } else {
        let order: Vec<&str> = plan.iter().map(|p| p.kind().as_str()).collect();
        println!("\nDefault order: {}", order.join(" → "));
    }

    Ok(())
}
