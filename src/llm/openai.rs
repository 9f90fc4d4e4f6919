//! OpenAI chat-completions provider.
//!
//! Requests JSON mode so the response body is already a JSON object.
//! Truncated or malformed output is repaired when possible; if repair
//! fails the provider returns an empty report skeleton instead of an
//! error, so this path never triggers fallback on bad output.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::json_repair::{empty_skeleton, repair_json};
use super::provider::{
    extract_error_message, GenerationOptions, LlmProvider, ProviderError, ProviderKind,
};
use crate::config::ProviderConfig;

/// Output token ceiling for this provider.
pub const MAX_OUTPUT_TOKENS: u32 = 8000;

/// System instruction fixing the assistant's role and output contract.
pub const SYSTEM_PROMPT: &str = "You are an expert watershed planning analyst. You extract structured data from watershed management plans. Always respond with a single complete, syntactically valid JSON object that matches the requested schema. Never include commentary, markdown fences, or trailing text.";

/// OpenAI provider (JSON-mode capable).
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider from its configuration section.
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("OPENAI_API_KEY not set".to_string()))?;

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

    async fn call_chat(&self, prompt: &str, options: GenerationOptions) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens.min(MAX_OUTPUT_TOKENS),
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let url = format!("{}/v1/chat/completions", self.endpoint);
        debug!("OpenAI: POST {} (model {})", url, self.model);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
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

        let chat: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Parse(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Parse("Response contained no message content".to_string()))
    }
}

/// Parse JSON-mode output, repairing or falling back to an empty skeleton.
pub fn parse_json_output(raw: &str) -> Value {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return value;
    }

    warn!("OpenAI returned malformed JSON ({} chars), attempting repair", raw.len());
    match serde_json::from_str::<Value>(&repair_json(raw)) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                "OpenAI output could not be repaired ({}), returning empty skeleton",
                e
            );
            empty_skeleton()
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, prompt: &str, options: GenerationOptions) -> Result<Value, ProviderError> {
        let content = self.call_chat(prompt, options).await?;
        Ok(parse_json_output(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_output() {
        let value = parse_json_output(r#"{"goals": [{"id": "g1"}], "bmps": []}"#);
        assert_eq!(value["goals"][0]["id"], "g1");
    }

    #[test]
    fn test_parse_truncated_output_is_repaired() {
        let value = parse_json_output(r#"{"goals": [{"id":"g1"}]"#);
        assert_eq!(value, json!({"goals": [{"id": "g1"}]}));
    }

    #[test]
    fn test_parse_garbage_yields_skeleton() {
        let value = parse_json_output("I'm sorry, I cannot help with that.");
        assert_eq!(value, empty_skeleton());
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = ProviderConfig {
            api_key: Some("  ".to_string()),
            model: "gpt-4o".to_string(),
            endpoint: "https://api.openai.com".to_string(),
        };
        let result = OpenAiProvider::new(&config, Duration::from_secs(5));
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "gpt-4o",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.1,
            max_tokens: 8000,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["max_tokens"], 8000);
    }
}
