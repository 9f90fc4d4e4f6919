//! Process configuration for watershed-extract.
//!
//! Built once at startup from defaults, an optional TOML file, and
//! environment overrides, then shared read-only with every request.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extraction::ExtractionOptions;
use crate::llm::ProviderKind;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "wsx.toml";

/// Name prefer searches for in the user's config directories.
const CONFIG_NAME: &str = "wsx";

/// Default maximum upload size (100 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Connection settings for one remote provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; the provider is only used when this is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model identifier sent with each request.
    #[serde(default)]
    pub model: String,
    /// Base URL of the API (no trailing path).
    #[serde(default)]
    pub endpoint: String,
}

impl ProviderConfig {
    fn openai_default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o".to_string(),
            endpoint: "https://api.openai.com".to_string(),
        }
    }

    fn anthropic_default() -> Self {
        Self {
            api_key: None,
            model: "claude-3-5-sonnet-20241022".to_string(),
            endpoint: "https://api.anthropic.com".to_string(),
        }
    }

    /// Fill blank fields from another section (used after parsing a partial file).
    fn or_defaults(mut self, defaults: Self) -> Self {
        if self.model.trim().is_empty() {
            self.model = defaults.model;
        }
        if self.endpoint.trim().is_empty() {
            self.endpoint = defaults.endpoint;
        }
        self
    }

    /// Whether credentials are present.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Default per-request extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionDefaults {
    /// Provider tried first when both are configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_provider: Option<ProviderKind>,
    /// Generation temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Requested output tokens (each provider caps this at its own ceiling).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Whether a failed provider falls back to the next one.
    #[serde(default = "default_allow_fallback")]
    pub allow_fallback: bool,
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    8000
}

fn default_allow_fallback() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_openai() -> ProviderConfig {
    ProviderConfig::openai_default()
}

fn default_anthropic() -> ProviderConfig {
    ProviderConfig::anthropic_default()
}

impl Default for ExtractionDefaults {
    fn default() -> Self {
        Self {
            preferred_provider: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            allow_fallback: default_allow_fallback(),
        }
    }
}

/// Complete process configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Provider A (JSON mode).
    #[serde(default = "default_openai")]
    pub openai: ProviderConfig,
    /// Provider B (free-form).
    #[serde(default = "default_anthropic")]
    pub anthropic: ProviderConfig,
    /// Defaults for per-request options.
    #[serde(default)]
    pub extraction: ExtractionDefaults,
    /// HTTP timeout for a single provider call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum accepted PDF size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            openai: default_openai(),
            anthropic: default_anthropic(),
            extraction: ExtractionDefaults::default(),
            request_timeout_secs: default_request_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ExtractorConfig {
    /// Load configuration: defaults, then the TOML file, then env overrides.
    ///
    /// With no explicit path, `wsx.toml` in the working directory is used
    /// if it exists, otherwise prefer discovers one in the standard
    /// config locations.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::discover().await {
                Some(found) => Self::from_file(&found)?,
                None => Self::default(),
            },
        };
        Ok(base.with_env_overrides())
    }

    /// Find a config file without an explicit path.
    async fn discover() -> Option<PathBuf> {
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Some(local.to_path_buf());
        }

        let found = prefer::load(CONFIG_NAME).await.ok()?;
        let path = found.source_path()?.to_path_buf();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            tracing::warn!(
                "Ignoring config file {} (only TOML is supported)",
                path.display()
            );
            return None;
        }
        Some(path)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            openai: parsed.openai.or_defaults(ProviderConfig::openai_default()),
            anthropic: parsed
                .anthropic
                .or_defaults(ProviderConfig::anthropic_default()),
            ..parsed
        })
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_ENDPOINT`
    /// - `ANTHROPIC_API_KEY`, `ANTHROPIC_MODEL`, `ANTHROPIC_ENDPOINT`
    /// - `WSX_PREFERRED_PROVIDER`: "openai" or "anthropic"
    /// - `WSX_TEMPERATURE`, `WSX_MAX_TOKENS`, `WSX_ALLOW_FALLBACK`
    /// - `WSX_REQUEST_TIMEOUT_SECS`, `WSX_MAX_UPLOAD_BYTES`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("OPENAI_API_KEY") {
            self.openai.api_key = Some(val);
        }
        if let Some(val) = lookup("OPENAI_MODEL") {
            self.openai.model = val;
        }
        if let Some(val) = lookup("OPENAI_ENDPOINT") {
            self.openai.endpoint = val;
        }
        if let Some(val) = lookup("ANTHROPIC_API_KEY") {
            self.anthropic.api_key = Some(val);
        }
        if let Some(val) = lookup("ANTHROPIC_MODEL") {
            self.anthropic.model = val;
        }
        if let Some(val) = lookup("ANTHROPIC_ENDPOINT") {
            self.anthropic.endpoint = val;
        }

        if let Some(val) = lookup("WSX_PREFERRED_PROVIDER") {
            if let Some(kind) = ProviderKind::from_str(&val) {
                self.extraction.preferred_provider = Some(kind);
            }
        }
        if let Some(val) = lookup("WSX_TEMPERATURE") {
            if let Ok(t) = val.parse() {
                self.extraction.temperature = t;
            }
        }
        if let Some(val) = lookup("WSX_MAX_TOKENS") {
            if let Ok(n) = val.parse() {
                self.extraction.max_tokens = n;
            }
        }
        if let Some(val) = lookup("WSX_ALLOW_FALLBACK") {
            self.extraction.allow_fallback = val.eq_ignore_ascii_case("true") || val == "1";
        }
        if let Some(val) = lookup("WSX_REQUEST_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.request_timeout_secs = n;
            }
        }
        if let Some(val) = lookup("WSX_MAX_UPLOAD_BYTES") {
            if let Ok(n) = val.parse() {
                self.max_upload_bytes = n;
            }
        }
        self
    }

    /// Configuration section for a provider.
    pub fn provider(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
        }
    }

    /// Provider call timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Per-request options derived from the configured defaults.
    pub fn default_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            preferred_provider: self.extraction.preferred_provider,
            temperature: self.extraction.temperature,
            max_tokens: self.extraction.max_tokens,
            allow_fallback: self.extraction.allow_fallback,
        }
    }

    /// Explain what a provider needs to become usable.
    pub fn availability_hint(&self, kind: ProviderKind) -> String {
        let section = self.provider(kind);
        if section.is_configured() {
            return format!("{} is available (model: {})", kind.display_name(), section.model);
        }
        match kind {
            ProviderKind::OpenAi => {
                "OPENAI_API_KEY not set. Get an API key from https://platform.openai.com/".to_string()
            }
            ProviderKind::Anthropic => {
                "ANTHROPIC_API_KEY not set. Get an API key from https://console.anthropic.com/"
                    .to_string()
            }
        }
    }
}
