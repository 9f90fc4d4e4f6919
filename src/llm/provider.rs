//! Provider abstraction shared by the remote text-generation backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Maximum characters of a raw error body carried into an error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Errors from a single provider invocation.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Known provider kinds, in canonical planning order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions with JSON mode.
    OpenAi,
    /// Anthropic messages API (no native JSON mode).
    Anthropic,
}

impl ProviderKind {
    /// All provider kinds in canonical order.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Anthropic];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Some(ProviderKind::OpenAi),
            "anthropic" | "claude" => Some(ProviderKind::Anthropic),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-request generation settings passed to a provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A remote backend that turns an extraction prompt into parsed JSON.
///
/// Implementations do not retry; fallback across providers is the
/// orchestrator's job.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Which provider this is.
    fn kind(&self) -> ProviderKind;

    /// Model identifier used for requests.
    fn model(&self) -> &str;

    /// Send the prompt and return the model output parsed as JSON.
    async fn invoke(&self, prompt: &str, options: GenerationOptions)
        -> Result<Value, ProviderError>;
}

/// Pull a human-readable message out of a backend error body.
///
/// Backends nest their messages differently (`{"error": {"message": ..}}`,
/// `{"error": ".."}`, `{"message": ..}`); anything else falls back to the
/// raw body, bounded in length.
pub fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let nested = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str);
        let flat = value.get("error").and_then(Value::as_str);
        let top = value.get("message").and_then(Value::as_str);

        if let Some(msg) = nested.or(flat).or(top) {
            return msg.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
