//! Recovery helpers for model output that is not clean JSON.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};

static JSON_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Close unbalanced braces and brackets left by a truncated response.
///
/// Counts opening and closing characters across the raw text and appends
/// the missing `]` first, then the missing `}`. String contents are not
/// inspected, so a brace inside a quoted value skews the count.
pub fn repair_json(raw: &str) -> String {
    let mut open_braces = 0usize;
    let mut close_braces = 0usize;
    let mut open_brackets = 0usize;
    let mut close_brackets = 0usize;

    for c in raw.chars() {
        match c {
            '{' => open_braces += 1,
            '}' => close_braces += 1,
            '[' => open_brackets += 1,
            ']' => close_brackets += 1,
            _ => {}
        }
    }

    let missing_brackets = open_brackets.saturating_sub(close_brackets);
    let missing_braces = open_braces.saturating_sub(close_braces);

    let mut repaired = String::with_capacity(raw.len() + missing_brackets + missing_braces);
    repaired.push_str(raw.trim_end());
    repaired.extend(std::iter::repeat(']').take(missing_brackets));
    repaired.extend(std::iter::repeat('}').take(missing_braces));
    repaired
}

/// Find the first `{ ... }` region in free-form text.
///
/// Greedy: runs from the first `{` to the last `}`.
pub fn find_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.find(text).map(|m| m.as_str())
}

/// A well-formed report body with every category empty.
pub fn empty_skeleton() -> Value {
    json!({
        "goals": [],
        "bmps": [],
        "implementation": [],
        "monitoring": [],
        "outreach": [],
        "geographicAreas": []
    })
}
