//! Serve command.

use console::style;

use watershed_extract::config::ExtractorConfig;
use watershed_extract::llm::ProviderKind;

/// Start the HTTP API server.
pub async fn cmd_serve(config: ExtractorConfig, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    let configured: Vec<&str> = ProviderKind::ALL
        .iter()
        .filter(|kind| config.provider(**kind).is_configured())
        .map(|kind| kind.as_str())
        .collect();
    if configured.is_empty() {
        println!(
            "{} No LLM provider configured; /api/extract will return 503",
            style("!").yellow()
        );
    } else {
        println!(
            "  {} Providers: {}",
            style("✓").green(),
            configured.join(", ")
        );
    }

    println!(
        "{} Starting wsx server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    watershed_extract::server::serve(config, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Host and port: "0.0.0.0:8080"
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3030
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    if bind.is_empty() {
        anyhow::bail!("empty bind address");
    }
    Ok((bind.to_string(), 3030))
}
