//! Extraction orchestrator.
//!
//! Plans the provider order for a request, tries each provider in turn
//! until one returns usable JSON, and finalizes that response into a
//! [`CanonicalReport`].

mod error;
mod finalize;
mod report;

pub use error::{ExtractError, ProviderAttemptError};
pub use finalize::{completion_rate, finalize, generate_id, ACCURACY_ESTIMATE};
pub use report::{
    ActivityStatus, AreaType, Bmp, CanonicalReport, Coordinates, GeographicArea, Goal,
    GoalStatus, ImplementationActivity, Metadata, MonitoringMetric, OutreachActivity, Priority,
    Summary,
};

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ExtractorConfig, DEFAULT_MAX_UPLOAD_BYTES};
use crate::llm::{
    build_extraction_prompt, AnthropicProvider, GenerationOptions, LlmProvider, OpenAiProvider,
    ProviderKind,
};
use crate::normalize::{normalize, NormalizedText};
use crate::pdf;

/// Caller-supplied settings for one extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionOptions {
    /// Provider tried first; defaults to OpenAI.
    pub preferred_provider: Option<ProviderKind>,
    pub temperature: f32,
    /// Requested output budget; each provider caps it at its own ceiling.
    pub max_tokens: u32,
    /// Try the remaining providers when the preferred one fails.
    pub allow_fallback: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            preferred_provider: None,
            temperature: 0.1,
            max_tokens: 8000,
            allow_fallback: true,
        }
    }
}

impl ExtractionOptions {
    fn generation(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Configuration state of one provider kind.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub provider: ProviderKind,
    pub configured: bool,
    pub model: String,
    pub hint: String,
}

/// Runs extractions against the configured providers.
///
/// Holds no per-request state; one instance is shared across requests.
pub struct Extractor {
    /// Usable providers in canonical order.
    providers: Vec<Arc<dyn LlmProvider>>,
    status: Vec<ProviderStatus>,
    max_upload_bytes: usize,
}

impl Extractor {
    /// Build every provider that has credentials.
    pub fn from_config(config: &ExtractorConfig) -> Self {
        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();
        let mut status = Vec::new();

        for kind in ProviderKind::ALL {
            let section = config.provider(kind);
            let mut entry = ProviderStatus {
                provider: kind,
                configured: false,
                model: section.model.clone(),
                hint: config.availability_hint(kind),
            };

            if section.is_configured() {
                let built: Result<Arc<dyn LlmProvider>, _> = match kind {
                    ProviderKind::OpenAi => OpenAiProvider::new(section, config.request_timeout())
                        .map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
                    ProviderKind::Anthropic => {
                        AnthropicProvider::new(section, config.request_timeout())
                            .map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
                    }
                };
                match built {
                    Ok(provider) => {
                        debug!("Extractor: added {} ({})", kind, section.model);
                        entry.configured = true;
                        providers.push(provider);
                    }
                    Err(e) => {
                        warn!("Extractor: {} unavailable: {}", kind, e);
                        entry.hint = e.to_string();
                    }
                }
            } else {
                debug!("Extractor: {} not configured", kind);
            }
            status.push(entry);
        }

        info!("Extractor initialized with {} providers", providers.len());

        Self {
            providers,
            status,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Use the given providers as-is (first entry is the canonical first choice).
    pub fn with_providers(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        let status = providers
            .iter()
            .map(|p| ProviderStatus {
                provider: p.kind(),
                configured: true,
                model: p.model().to_string(),
                hint: format!("{} is available (model: {})", p.kind().display_name(), p.model()),
            })
            .collect();

        Self {
            providers,
            status,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Override the upload size limit used by [`Extractor::extract_pdf`].
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Configuration state of every known provider.
    pub fn providers_status(&self) -> &[ProviderStatus] {
        &self.status
    }

    /// Whether any provider can be called.
    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Order in which providers will be tried for these options.
    ///
    /// A lone provider is always the sole entry. Otherwise the preferred
    /// provider (OpenAI when unset) comes first, followed by the rest in
    /// canonical order unless fallback is disabled.
    pub fn plan(&self, options: &ExtractionOptions) -> Vec<Arc<dyn LlmProvider>> {
        if self.providers.len() <= 1 {
            return self.providers.clone();
        }

        let preferred = options.preferred_provider.unwrap_or(ProviderKind::OpenAi);
        let (mut first, rest): (Vec<_>, Vec<_>) = self
            .providers
            .iter()
            .cloned()
            .partition(|p| p.kind() == preferred);

        if first.is_empty() {
            debug!("Preferred provider {} not configured, using canonical order", preferred);
        }
        first.extend(rest);

        if !options.allow_fallback {
            first.truncate(1);
        }
        first
    }

    /// Run the provider chain over normalized text.
    pub async fn extract(
        &self,
        text: &NormalizedText,
        file_name: &str,
        file_size: u64,
        options: &ExtractionOptions,
    ) -> Result<CanonicalReport, ExtractError> {
        self.run(text, file_name, file_size, options, Instant::now())
            .await
    }

    /// Normalize raw text and extract from it.
    ///
    /// Whitespace-only text fails with [`ExtractError::EmptyDocument`]
    /// before any prompt is built.
    pub async fn extract_text(
        &self,
        raw_text: &str,
        page_count: usize,
        file_name: &str,
        file_size: u64,
        options: &ExtractionOptions,
    ) -> Result<CanonicalReport, ExtractError> {
        let started = Instant::now();
        let text = normalize(raw_text, page_count)?;
        self.run(&text, file_name, file_size, options, started).await
    }

    /// Validate a PDF upload, pull its text, and extract from it.
    pub async fn extract_pdf(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        options: &ExtractionOptions,
    ) -> Result<CanonicalReport, ExtractError> {
        let started = Instant::now();
        pdf::validate_upload(&bytes, self.max_upload_bytes)?;

        let file_size = bytes.len() as u64;
        let pdf_text = pdf::extract_pdf_text_async(bytes).await?;
        info!(
            "Extracted {} chars from {} ({} pages)",
            pdf_text.full_text.len(),
            file_name,
            pdf_text.page_count
        );

        let text = normalize(&pdf_text.full_text, pdf_text.page_count)?;
        self.run(&text, file_name, file_size, options, started).await
    }

    async fn run(
        &self,
        text: &NormalizedText,
        file_name: &str,
        file_size: u64,
        options: &ExtractionOptions,
        started: Instant,
    ) -> Result<CanonicalReport, ExtractError> {
        let plan = self.plan(options);
        if plan.is_empty() {
            return Err(ExtractError::NoProvidersConfigured);
        }

        let prompt = build_extraction_prompt(&text.combined_text, Some(&text.page_texts));
        let generation = options.generation();
        let mut attempts = Vec::new();

        for provider in &plan {
            info!(
                "Extracting {} with {} ({})",
                file_name,
                provider.kind(),
                provider.model()
            );

            match provider.invoke(&prompt, generation).await {
                Ok(raw) => {
                    let metadata = Metadata {
                        file_name: file_name.to_string(),
                        file_size,
                        extracted_at: Utc::now(),
                        processing_method: format!(
                            "{} ({})",
                            provider.kind().display_name(),
                            provider.model()
                        ),
                    };
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    return Ok(finalize(&raw, metadata, elapsed_ms));
                }
                Err(e) => {
                    warn!("Provider {} failed: {}", provider.kind(), e);
                    attempts.push(ProviderAttemptError {
                        provider: provider.kind().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Err(ExtractError::AllProvidersFailed { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProviderError;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Fixed {
        kind: ProviderKind,
        response: Option<Value>,
    }

    #[async_trait]
    impl LlmProvider for Fixed {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn model(&self) -> &str {
            "fixed-model"
        }

        async fn invoke(&self, _prompt: &str, _options: GenerationOptions) -> Result<Value, ProviderError> {
            self.response
                .clone()
                .ok_or_else(|| ProviderError::Connection("refused".to_string()))
        }
    }

    fn provider(kind: ProviderKind, response: Option<Value>) -> Arc<dyn LlmProvider> {
        Arc::new(Fixed { kind, response })
    }

    fn kinds(plan: &[Arc<dyn LlmProvider>]) -> Vec<ProviderKind> {
        plan.iter().map(|p| p.kind()).collect()
    }

    fn both() -> Extractor {
        Extractor::with_providers(vec![
            provider(ProviderKind::OpenAi, None),
            provider(ProviderKind::Anthropic, Some(json!({}))),
        ])
    }

    #[test]
    fn test_plan_defaults_to_openai_first() {
        let plan = both().plan(&ExtractionOptions::default());
        assert_eq!(kinds(&plan), vec![ProviderKind::OpenAi, ProviderKind::Anthropic]);
    }

    #[test]
    fn test_plan_respects_preference() {
        let options = ExtractionOptions {
            preferred_provider: Some(ProviderKind::Anthropic),
            ..Default::default()
        };
        let plan = both().plan(&options);
        assert_eq!(kinds(&plan), vec![ProviderKind::Anthropic, ProviderKind::OpenAi]);
    }

    #[test]
    fn test_plan_without_fallback() {
        let options = ExtractionOptions {
            allow_fallback: false,
            ..Default::default()
        };
        assert_eq!(kinds(&both().plan(&options)), vec![ProviderKind::OpenAi]);
    }

    #[test]
    fn test_plan_single_provider_ignores_preference() {
        let extractor = Extractor::with_providers(vec![provider(ProviderKind::Anthropic, None)]);
        let options = ExtractionOptions {
            preferred_provider: Some(ProviderKind::OpenAi),
            allow_fallback: false,
            ..Default::default()
        };
        assert_eq!(kinds(&extractor.plan(&options)), vec![ProviderKind::Anthropic]);
    }

    #[test]
    fn test_from_config_without_keys() {
        let extractor = Extractor::from_config(&ExtractorConfig::default());
        assert!(!extractor.has_providers());
        assert_eq!(extractor.providers_status().len(), 2);
        assert!(extractor.providers_status().iter().all(|s| !s.configured));
    }

    #[tokio::test]
    async fn test_no_providers() {
        let extractor = Extractor::with_providers(vec![]);
        let result = extractor
            .extract_text("Goal: restore wetlands.", 1, "plan.pdf", 10, &ExtractionOptions::default())
            .await;
        assert!(matches!(result, Err(ExtractError::NoProvidersConfigured)));
    }

    #[tokio::test]
    async fn test_fallback_records_attempts() {
        let extractor = Extractor::with_providers(vec![
            provider(ProviderKind::OpenAi, None),
            provider(ProviderKind::Anthropic, None),
        ]);
        let err = extractor
            .extract_text("Goal: restore wetlands.", 1, "plan.pdf", 10, &ExtractionOptions::default())
            .await
            .unwrap_err();

        match err {
            ExtractError::AllProvidersFailed { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].provider, "openai");
                assert_eq!(attempts[1].provider, "anthropic");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
