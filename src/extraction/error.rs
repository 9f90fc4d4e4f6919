//! Extraction error types.

use serde::Serialize;
use thiserror::Error;

use crate::pdf::PdfError;

/// One failed provider attempt, kept for the exhaustion message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderAttemptError {
    pub provider: String,
    pub message: String,
}

impl std::fmt::Display for ProviderAttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.provider, self.message)
    }
}

/// Errors surfaced to callers of the extractor.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No text could be extracted from the document")]
    EmptyDocument,

    #[error("No LLM providers configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY")]
    NoProvidersConfigured,

    #[error("All providers failed: {}", join_attempts(.attempts))]
    AllProvidersFailed { attempts: Vec<ProviderAttemptError> },

    #[error(transparent)]
    Pdf(#[from] PdfError),
}

impl ExtractError {
    /// Whether the caller supplied bad input (as opposed to a service failure).
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyDocument | Self::Pdf(_))
    }
}

fn join_attempts(attempts: &[ProviderAttemptError]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_distinguished() {
        assert!(ExtractError::EmptyDocument.is_input_error());
        assert!(ExtractError::Pdf(PdfError::Encrypted).is_input_error());
        assert!(!ExtractError::NoProvidersConfigured.is_input_error());
        assert!(!ExtractError::AllProvidersFailed { attempts: vec![] }.is_input_error());
    }

    #[test]
    fn test_exhaustion_message_lists_every_attempt() {
        let err = ExtractError::AllProvidersFailed {
            attempts: vec![
                ProviderAttemptError {
                    provider: "openai".to_string(),
                    message: "API error (HTTP 429): quota exceeded".to_string(),
                },
                ProviderAttemptError {
                    provider: "anthropic".to_string(),
                    message: "Connection error: timed out".to_string(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "All providers failed: openai: API error (HTTP 429): quota exceeded; anthropic: Connection error: timed out"
        );
    }
}
