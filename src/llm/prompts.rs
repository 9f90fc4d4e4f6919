//! Extraction prompt construction.
//!
//! The prompt is a pure function of its inputs: no timestamps, no random
//! ids, so identical documents always produce byte-identical prompts.

/// Maximum characters of document text embedded in the prompt.
pub const MAX_DOCUMENT_CHARS: usize = 16_000;

/// Marker appended when the document text was cut.
pub const TRUNCATION_MARKER: &str = "...[truncated]";

/// Placeholder the model must use for missing required text fields.
pub const MISSING_TEXT: &str = "Not specified";

const SCHEMA_SECTION: &str = r#"Extract the following six categories and return them as a single JSON object with exactly these keys:

{
  "goals": [
    { "id": string, "title": string, "description": string, "targetDate": string | null,
      "status": "planned" | "in-progress" | "completed", "priority": "low" | "medium" | "high" }
  ],
  "bmps": [
    { "id": string, "name": string, "description": string, "category": string,
      "implementationCost": number | null, "maintenanceCost": number | null,
      "effectiveness": number (0-100) | null, "applicableAreas": string[] }
  ],
  "implementation": [
    { "id": string, "name": string, "description": string, "startDate": string | null,
      "endDate": string | null, "budget": number | null, "responsible": string,
      "status": "planned" | "ongoing" | "completed", "relatedGoals": string[], "relatedBMPs": string[] }
  ],
  "monitoring": [
    { "id": string, "name": string, "description": string, "unit": string,
      "targetValue": number | null, "currentValue": number | null, "frequency": string,
      "methodology": string, "responsibleParty": string }
  ],
  "outreach": [
    { "id": string, "name": string, "description": string, "targetAudience": string,
      "method": string, "timeline": string, "expectedOutcome": string, "budget": number | null }
  ],
  "geographicAreas": [
    { "id": string, "name": string, "type": "watershed" | "county" | "region" | "state",
      "area": number | null, "coordinates": { "lat": number, "lng": number } | null,
      "characteristics": string[] }
  ]
}"#;

/// Build the extraction prompt for a normalized document.
///
/// `page_texts` is present when the document went through per-page
/// normalization; it adds a banner describing that preprocessing.
pub fn build_extraction_prompt(combined_text: &str, page_texts: Option<&[String]>) -> String {
    let mut prompt = String::with_capacity(combined_text.len().min(MAX_DOCUMENT_CHARS) + 4096);

    if let Some(pages) = page_texts.filter(|p| !p.is_empty()) {
        prompt.push_str(&processing_banner(pages.len()));
        prompt.push_str("\n\n");
    }

    prompt.push_str(
        "You are analyzing a watershed management plan. Identify every goal, best management practice (BMP), implementation activity, monitoring metric, outreach activity, and geographic area described in the document.\n\n",
    );
    prompt.push_str(SCHEMA_SECTION);
    prompt.push_str("\n\n");
    prompt.push_str(&rules_section());
    prompt.push_str("\n\nDOCUMENT TEXT:\n");
    prompt.push_str(&truncate_document(combined_text));
    prompt.push_str("\n\nRespond with ONLY the JSON object.");
    prompt
}

fn processing_banner(page_count: usize) -> String {
    format!(
        "PROCESSING ENHANCEMENTS:\n\
         - {} pages were processed individually\n\
         - Each page begins with a location marker of the form \"=== PAGE <n> ===\"; use it to tie findings to their location\n\
         - Line breaks are preserved and hyphenated word breaks have been fixed\n\
         - Repeated headers and footers have been stripped",
        page_count
    )
}

fn rules_section() -> String {
    format!(
        "EXTRACTION RULES:\n\
         1. Be comprehensive. Do not return empty arrays when the document describes items of that category; scan every page.\n\
         2. Generate human-readable, descriptive ids (for example \"goal-reduce-phosphorus\" or \"bmp-riparian-buffers\").\n\
         3. When a required text field is not stated in the document, use the literal string \"{}\".\n\
         4. When a numeric field is not stated, use null. Never invent numbers.\n\
         5. Use only the enumerated values listed in the schema for status, priority, and type fields.\n\
         6. Cross-link records by id where the document makes the relationship evident (relatedGoals, relatedBMPs).\n\
         7. Dates should be ISO-8601 (YYYY or YYYY-MM-DD) when they can be determined, otherwise null.",
        MISSING_TEXT
    )
}

/// Cut the document to the prompt budget on a character boundary.
fn truncate_document(text: &str) -> String {
    match text.char_indices().nth(MAX_DOCUMENT_CHARS) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}\n{}", &text[..cut], TRUNCATION_MARKER),
    }
}
