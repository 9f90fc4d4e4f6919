//! LLM provider gateway for structured plan extraction.
//!
//! Two remote backends sit behind the [`LlmProvider`] trait:
//! OpenAI (JSON mode, self-repairing) and Anthropic (free-form, strict).

mod anthropic;
mod json_repair;
mod openai;
mod prompts;
mod provider;

pub use anthropic::AnthropicProvider;
pub use json_repair::{empty_skeleton, find_json_object, repair_json};
pub use openai::OpenAiProvider;
pub use prompts::{build_extraction_prompt, MAX_DOCUMENT_CHARS, MISSING_TEXT, TRUNCATION_MARKER};
pub use provider::{
    extract_error_message, GenerationOptions, LlmProvider, ProviderError, ProviderKind,
};
