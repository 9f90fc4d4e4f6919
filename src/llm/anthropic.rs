//! Anthropic messages provider.
//!
//! There is no JSON mode here: the first `{...}` region is pulled out of
//! the free-form reply and parsed. Anything that does not parse is a hard
//! failure so the orchestrator can move on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::json_repair::find_json_object;
use super::provider::{
    extract_error_message, GenerationOptions, LlmProvider, ProviderError, ProviderKind,
};
use crate::config::ProviderConfig;

/// Output token ceiling for this provider.
pub const MAX_OUTPUT_TOKENS: u32 = 3000;

const API_VERSION: &str = "2023-06-01";

/// Anthropic provider (no native JSON mode).
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

impl AnthropicProvider {
    /// Create a provider from its configuration section.
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::NotConfigured("ANTHROPIC_API_KEY not set".to_string())
            })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn call_messages(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, ProviderError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: options.max_tokens.min(MAX_OUTPUT_TOKENS),
            temperature: options.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/v1/messages", self.endpoint);
        debug!("Anthropic: POST {} (model {})", url, self.model);

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Parse(e.to_string()))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(ProviderError::Parse("Response contained no text content".to_string()));
        }
        Ok(text)
    }
}

/// Pull the JSON object out of a free-form reply. No repair is attempted.
pub fn parse_free_form_output(text: &str) -> Result<Value, ProviderError> {
    let region = find_json_object(text)
        .ok_or_else(|| ProviderError::Parse("No JSON object found in response".to_string()))?;

    serde_json::from_str(region)
        .map_err(|e| ProviderError::Parse(format!("Invalid JSON in response: {}", e)))
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, prompt: &str, options: GenerationOptions) -> Result<Value, ProviderError> {
        let text = self.call_messages(prompt, options).await?;
        parse_free_form_output(&text)
    }
}
