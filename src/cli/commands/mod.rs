//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod extract;
mod normalize_cmd;
mod providers;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use watershed_extract::config::ExtractorConfig;
use watershed_extract::export::ExportFormat;
use watershed_extract::llm::ProviderKind;

/// Provider choice on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderArg {
    /// OpenAI (JSON mode)
    Openai,
    /// Anthropic
    Anthropic,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Openai => ProviderKind::OpenAi,
            ProviderArg::Anthropic => ProviderKind::Anthropic,
        }
    }
}

/// Output format for extracted reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FormatArg {
    #[default]
    Json,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

#[derive(Parser)]
#[command(name = "wsx")]
#[command(about = "Extract structured data from watershed management plan PDFs")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to ./wsx.toml when present)
    #[arg(short, long, global = true, env = "WSX_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract goals, BMPs, and activities from a plan PDF
    Extract {
        /// PDF file to process
        file: PathBuf,
        /// Provider to try first
        #[arg(short, long, value_enum)]
        provider: Option<ProviderArg>,
        /// Do not fall back to other providers on failure
        #[arg(long)]
        no_fallback: bool,
        /// Generation temperature
        #[arg(long)]
        temperature: Option<f32>,
        /// Requested output tokens (capped per provider)
        #[arg(long)]
        max_tokens: Option<u32>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: FormatArg,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the cleaned, page-marked text that would be sent to a provider
    Normalize {
        /// PDF file to process
        file: PathBuf,
    },

    /// Show provider configuration and availability
    Providers,

    /// Start the HTTP API server
    Serve {
        /// Address to bind to (port, host:port, or host)
        #[arg(short, long, default_value = "127.0.0.1:3030")]
        bind: String,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ExtractorConfig::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Extract {
            file,
            provider,
            no_fallback,
            temperature,
            max_tokens,
            format,
            output,
        } => {
            let mut options = config.default_options();
            if let Some(p) = provider {
                options.preferred_provider = Some(p.into());
            }
            if no_fallback {
                options.allow_fallback = false;
            }
            if let Some(t) = temperature {
                options.temperature = t;
            }
            if let Some(n) = max_tokens {
                options.max_tokens = n;
            }
            extract::cmd_extract(&config, &file, options, format.into(), output.as_deref()).await
        }
        Commands::Normalize { file } => normalize_cmd::cmd_normalize(&config, &file).await,
        Commands::Providers => providers::cmd_providers(&config).await,
        Commands::Serve { bind } => serve::cmd_serve(config, &bind).await,
    }
}
