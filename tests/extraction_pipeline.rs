//! Extraction Pipeline Tests
//!
//! Drives the extractor through its public API with in-process providers:
//! fallback ordering, exhaustion errors, empty-document rejection, and
//! report finalization.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use watershed_extract::extraction::{ExtractError, ExtractionOptions, Extractor, GoalStatus};
use watershed_extract::llm::{GenerationOptions, LlmProvider, ProviderError, ProviderKind};
use watershed_extract::normalize::normalize;

const PLAN_TEXT: &str = "Upper Basin Watershed Plan\n\nGoal 1: Reduce phosphorus loading by 40% by 2030.\n\nGoal 2: Restore 200 acres of riparian wet-\nland.";

/// Provider that records calls and returns a fixed outcome.
struct StubProvider {
    kind: ProviderKind,
    model: &'static str,
    outcome: Result<Value, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubProvider {
    fn ok(kind: ProviderKind, response: Value) -> Arc<Self> {
        Arc::new(Self {
            kind,
            model: "stub-model",
            outcome: Ok(response),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(kind: ProviderKind, message: &str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            model: "stub-model",
            outcome: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        self.model
    }

    async fn invoke(&self, prompt: &str, _options: GenerationOptions) -> Result<Value, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.outcome.clone().map_err(|message| ProviderError::Api {
            status: 500,
            message,
        })
    }
}

fn extractor(providers: &[Arc<StubProvider>]) -> Extractor {
    Extractor::with_providers(
        providers
            .iter()
            .map(|p| p.clone() as Arc<dyn LlmProvider>)
            .collect(),
    )
}

#[tokio::test]
async fn test_fallback_uses_second_provider() {
    let first = StubProvider::failing(ProviderKind::OpenAi, "quota exceeded");
    let second = StubProvider::ok(
        ProviderKind::Anthropic,
        json!({"goals": [{"id": "goal-phosphorus", "title": "Reduce phosphorus", "description": "40% by 2030", "status": "planned", "priority": "high"}]}),
    );
    let extractor = extractor(&[first.clone(), second.clone()]);

    let report = extractor
        .extract_text(PLAN_TEXT, 1, "plan.pdf", 4096, &ExtractionOptions::default())
        .await
        .unwrap();

    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
    assert_eq!(report.goals.len(), 1);
    assert_eq!(report.goals[0].id, "goal-phosphorus");
    assert_eq!(report.metadata.processing_method, "Anthropic (stub-model)");
    assert_eq!(report.metadata.file_name, "plan.pdf");
    assert_eq!(report.metadata.file_size, 4096);
}

#[tokio::test]
async fn test_first_success_short_circuits() {
    let first = StubProvider::ok(ProviderKind::OpenAi, json!({}));
    let second = StubProvider::ok(ProviderKind::Anthropic, json!({}));
    let extractor = extractor(&[first.clone(), second.clone()]);

    let report = extractor
        .extract_text(PLAN_TEXT, 1, "plan.pdf", 1, &ExtractionOptions::default())
        .await
        .unwrap();

    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 0);
    assert!(report.metadata.processing_method.starts_with("OpenAI"));
}

#[tokio::test]
async fn test_no_fallback_reports_only_first_provider() {
    let first = StubProvider::failing(ProviderKind::OpenAi, "invalid api key");
    let second = StubProvider::ok(ProviderKind::Anthropic, json!({}));
    let extractor = extractor(&[first.clone(), second.clone()]);
    let options = ExtractionOptions {
        allow_fallback: false,
        ..Default::default()
    };

    let err = extractor
        .extract_text(PLAN_TEXT, 1, "plan.pdf", 1, &options)
        .await
        .unwrap_err();

    assert_eq!(second.calls(), 0);
    match &err {
        ExtractError::AllProvidersFailed { attempts } => {
            assert_eq!(attempts.len(), 1);
            assert_eq!(attempts[0].provider, "openai");
            assert!(attempts[0].message.contains("invalid api key"));
        }
        other => panic!("unexpected error: {}", other),
    }
    let message = err.to_string();
    assert!(message.contains("openai"));
    assert!(!message.contains("anthropic"));
}

#[tokio::test]
async fn test_preferred_provider_goes_first() {
    let openai = StubProvider::ok(ProviderKind::OpenAi, json!({}));
    let anthropic = StubProvider::ok(ProviderKind::Anthropic, json!({}));
    let extractor = extractor(&[openai.clone(), anthropic.clone()]);
    let options = ExtractionOptions {
        preferred_provider: Some(ProviderKind::Anthropic),
        ..Default::default()
    };

    extractor
        .extract_text(PLAN_TEXT, 1, "plan.pdf", 1, &options)
        .await
        .unwrap();

    assert_eq!(anthropic.calls(), 1);
    assert_eq!(openai.calls(), 0);
}

#[tokio::test]
async fn test_exhaustion_lists_all_failures() {
    let first = StubProvider::failing(ProviderKind::OpenAi, "rate limited");
    let second = StubProvider::failing(ProviderKind::Anthropic, "overloaded");
    let extractor = extractor(&[first, second]);

    let err = extractor
        .extract_text(PLAN_TEXT, 1, "plan.pdf", 1, &ExtractionOptions::default())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "All providers failed: openai: API error (HTTP 500): rate limited; anthropic: API error (HTTP 500): overloaded"
    );
}

#[tokio::test]
async fn test_empty_document_never_reaches_providers() {
    let provider = StubProvider::ok(ProviderKind::OpenAi, json!({}));
    let extractor = extractor(&[provider.clone()]);

    let err = extractor
        .extract_text(" \n\t \r\n\u{000C} ", 3, "blank.pdf", 10, &ExtractionOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::EmptyDocument));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_prompt_carries_page_markers_and_cleaned_text() {
    let provider = StubProvider::ok(ProviderKind::OpenAi, json!({}));
    let extractor = extractor(&[provider.clone()]);

    extractor
        .extract_text(PLAN_TEXT, 2, "plan.pdf", 1, &ExtractionOptions::default())
        .await
        .unwrap();

    let prompts = provider.prompts.lock().unwrap();
    let prompt = &prompts[0];
    assert!(prompt.contains("2 pages were processed individually"));
    assert!(prompt.contains("=== PAGE 1 ==="));
    assert!(prompt.contains("=== PAGE 2 ==="));
    assert!(prompt.contains("wetland"));
}

#[tokio::test]
async fn test_id_backfill_and_completion_rate() {
    let provider = StubProvider::ok(
        ProviderKind::OpenAi,
        json!({
            "goals": [
                {"title": "Reduce phosphorus", "description": "40% by 2030", "status": "completed", "priority": "high"},
                {"id": "g2", "title": "Restore wetlands", "description": "200 acres", "status": "planned", "priority": "medium"},
                {"id": "g3", "title": "Stabilize banks", "description": "5 miles", "status": "in-progress", "priority": "low"},
                {"id": "g4", "title": "Educate landowners", "description": "10 workshops", "status": "planned", "priority": "low"}
            ],
            "bmps": [{"name": "Cover crops"}]
        }),
    );
    let extractor = extractor(&[provider]);

    let report = extractor
        .extract_text(PLAN_TEXT, 1, "plan.pdf", 1, &ExtractionOptions::default())
        .await
        .unwrap();

    let backfilled = &report.goals[0];
    assert!(!backfilled.id.is_empty());
    assert_eq!(backfilled.title, "Reduce phosphorus");
    assert_eq!(backfilled.description, "40% by 2030");
    assert_eq!(backfilled.status, GoalStatus::Completed);
    assert!(!report.bmps[0].id.is_empty());

    let ids = report.all_ids();
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());

    assert_eq!(report.summary.total_goals, 4);
    assert_eq!(report.summary.total_bmps, 1);
    assert_eq!(report.summary.completion_rate, 25.0);
    assert_eq!(report.summary.accuracy_estimate, 85.0);
}

#[tokio::test]
async fn test_extract_with_pre_normalized_text() {
    let provider = StubProvider::ok(ProviderKind::OpenAi, json!({"outreach": [{"name": "Field days"}]}));
    let extractor = extractor(&[provider]);
    let text = normalize(PLAN_TEXT, 1).unwrap();

    let report = extractor
        .extract(&text, "plan.pdf", 99, &ExtractionOptions::default())
        .await
        .unwrap();

    assert_eq!(report.outreach.len(), 1);
    assert_eq!(report.outreach[0].target_audience, "Not specified");
}

#[test]
fn test_hyphenated_compounds_are_repaired() {
    let text = normalize("Protect the water-\nshed and reduce non-\npoint pollution.", 1).unwrap();
    assert!(text.combined_text.contains("watershed"));
    assert!(text.combined_text.contains("nonpoint"));
}

#[test]
fn test_page_count_preserved() {
    let raw = "abcdefghij".repeat(12);
    let text = normalize(&raw, 4).unwrap();
    assert_eq!(text.page_count(), 4);
    assert!(text.page_texts.iter().all(|p| !p.is_empty()));
    assert_eq!(text.page_texts.concat(), raw);
}
