//! Text cleanup and page synthesis for extracted PDF text.
//!
//! PDF text arrives as one blob with layout noise: ragged whitespace,
//! words hyphenated across lines, running headers and page numbers.
//! This module cleans it, cuts it back into the declared number of pages
//! using paragraph breaks near evenly spaced offsets, and prefixes each
//! page with a `=== PAGE <n> ===` marker.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::extraction::ExtractError;

/// Maximum consecutive newlines kept in cleaned text.
const MAX_NEWLINES: usize = 3;

/// Lines at each end of a page eligible for header/footer stripping.
const EDGE_LINES: usize = 3;

/// Boundary search window as a fraction (1/N) of the target page length.
const BOUNDARY_WINDOW_DIVISOR: usize = 5;

static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}\u{2000}-\u{200A}\u{202F}\u{3000}]+").unwrap());

static SPACE_AROUND_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" *\n *").unwrap());

static HYPHEN_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w)-\n(\w)").unwrap());

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\n{{{},}}", MAX_NEWLINES + 1)).unwrap());

/// Compound terms common in watershed plans that PDF layout splits across lines.
static COMPOUND_BREAKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        ("water", "shed"),
        ("non", "point"),
        ("storm", "water"),
        ("ground", "water"),
        ("head", "water"),
        ("stream", "bank"),
        ("wet", "land"),
        ("flood", "plain"),
        ("sub", "watershed"),
    ]
    .iter()
    .map(|(head, tail)| Regex::new(&format!(r"(?i)\b({})\n({})", head, tail)).unwrap())
    .collect()
});

static PAGE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(page\s+)?\d{1,4}(\s+of\s+\d{1,4})?$|^[-\u{2013}\u{2014}]\s*\d{1,4}\s*[-\u{2013}\u{2014}]$")
        .unwrap()
});

static STATUS_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(draft|final)$").unwrap());

static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(chapter|section)\s+(\d+(\.\d+)*|[ivxlc]+)$").unwrap()
});

/// Cleaned document text split into pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    /// All pages, each prefixed with its location marker, joined by blank lines.
    pub combined_text: String,
    /// Per-page text without markers. Length equals the declared page count.
    pub page_texts: Vec<String>,
}

impl NormalizedText {
    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.page_texts.len()
    }
}

/// Location marker placed before each page.
pub fn page_marker(page_number: usize) -> String {
    format!("=== PAGE {} ===", page_number)
}

/// Clean raw text and split it into `page_count` marked pages.
///
/// Fails with [`ExtractError::EmptyDocument`] when nothing but whitespace
/// survives cleaning.
pub fn normalize(raw: &str, page_count: usize) -> Result<NormalizedText, ExtractError> {
    let cleaned = clean_text(raw);
    if cleaned.trim().is_empty() {
        return Err(ExtractError::EmptyDocument);
    }

    let page_texts: Vec<String> = split_pages(&cleaned, page_count)
        .iter()
        .map(|segment| strip_headers_footers(segment))
        .collect();

    let combined_text = page_texts
        .iter()
        .enumerate()
        .map(|(i, page)| format!("{}\n{}", page_marker(i + 1), page))
        .collect::<Vec<_>>()
        .join("\n\n");

    debug!(
        "Normalized {} chars into {} pages ({} chars combined)",
        raw.len(),
        page_texts.len(),
        combined_text.len()
    );

    Ok(NormalizedText {
        combined_text,
        page_texts,
    })
}

/// Clean layout noise from extracted text.
pub fn clean_text(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n").replace('\u{000C}', "\n");
    let text = HORIZONTAL_WS.replace_all(&text, " ");
    let text = SPACE_AROUND_NEWLINE.replace_all(&text, "\n");
    let text = HYPHEN_BREAK.replace_all(&text, "${1}${2}");

    let mut text = text.into_owned();
    for re in COMPOUND_BREAKS.iter() {
        text = re.replace_all(&text, "${1}${2}").into_owned();
    }

    EXCESS_NEWLINES
        .replace_all(&text, "\n".repeat(MAX_NEWLINES).as_str())
        .trim()
        .to_string()
}

/// Split cleaned text into exactly `page_count` segments.
///
/// Each boundary starts at an even share of the text and moves to the
/// nearest paragraph break, else the nearest line break, within a window
/// around it. The last segment takes whatever remains.
pub fn split_pages(text: &str, page_count: usize) -> Vec<String> {
    if page_count <= 1 {
        return vec![text.to_string()];
    }

    let target = text.len() / page_count;
    let window = target / BOUNDARY_WINDOW_DIVISOR;

    let mut pages = Vec::with_capacity(page_count);
    let mut start = 0;
    for i in 1..page_count {
        let estimate = floor_char_boundary(text, (i * target).max(start));
        let boundary = find_boundary(text, estimate, window, start);
        pages.push(text[start..boundary].to_string());
        start = boundary;
    }
    pages.push(text[start..].to_string());
    pages
}

/// Pick a page boundary near `estimate`, never before `floor`.
fn find_boundary(text: &str, estimate: usize, window: usize, floor: usize) -> usize {
    if window == 0 {
        return estimate;
    }

    let lo = floor_char_boundary(text, estimate.saturating_sub(window).max(floor));
    let hi = floor_char_boundary(text, (estimate + window).min(text.len()));
    if lo >= hi {
        return estimate;
    }
    let region = &text[lo..hi];

    nearest_break(region, "\n\n", lo, estimate)
        .or_else(|| nearest_break(region, "\n", lo, estimate))
        .unwrap_or(estimate)
}

/// Offset just past the occurrence of `pattern` closest to `estimate`.
fn nearest_break(region: &str, pattern: &str, offset: usize, estimate: usize) -> Option<usize> {
    region
        .match_indices(pattern)
        .map(|(idx, m)| offset + idx + m.len())
        .min_by_key(|pos| pos.abs_diff(estimate))
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Drop header/footer lines from the first and last few lines of a page.
pub fn strip_headers_footers(segment: &str) -> String {
    let lines: Vec<&str> = segment.trim().lines().collect();
    let n = lines.len();

    lines
        .iter()
        .enumerate()
        .filter(|(i, line)| {
            let near_edge = *i < EDGE_LINES || *i + EDGE_LINES >= n;
            !(near_edge && is_header_footer(line))
        })
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn is_header_footer(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty()
        && (PAGE_NUMBER.is_match(line)
            || STATUS_MARKER.is_match(line)
            || SECTION_HEADER.is_match(line))
}
