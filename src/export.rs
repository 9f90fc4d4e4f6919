//! Report renderings for download.

use std::fmt::Write;

use serde::Deserialize;

use crate::extraction::CanonicalReport;

/// Separator for list-valued fields inside a CSV cell.
const LIST_SEPARATOR: &str = "; ";

/// Export format options.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }
}

/// Render in the given format.
pub fn render(report: &CanonicalReport, format: ExportFormat) -> Result<String, serde_json::Error> {
    match format {
        ExportFormat::Json => to_json(report),
        ExportFormat::Csv => Ok(to_csv(report)),
    }
}

/// Pretty-printed JSON passthrough.
pub fn to_json(report: &CanonicalReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Flattened CSV: a summary block, then one titled section per category.
pub fn to_csv(report: &CanonicalReport) -> String {
    let mut out = String::new();
    let s = &report.summary;
    let m = &report.metadata;

    section(&mut out, "Summary", &["field", "value"], [
        vec!["fileName".to_string(), m.file_name.clone()],
        vec!["fileSize".to_string(), m.file_size.to_string()],
        vec!["extractedAt".to_string(), m.extracted_at.to_rfc3339()],
        vec!["processingMethod".to_string(), m.processing_method.clone()],
        vec!["totalGoals".to_string(), s.total_goals.to_string()],
        vec!["totalBMPs".to_string(), s.total_bmps.to_string()],
        vec!["completionRate".to_string(), s.completion_rate.to_string()],
        vec!["accuracyEstimate".to_string(), s.accuracy_estimate.to_string()],
        vec!["processingTimeMs".to_string(), s.processing_time_ms.to_string()],
    ]);

    section(
        &mut out,
        "Goals",
        &["id", "title", "description", "targetDate", "status", "priority"],
        report.goals.iter().map(|g| {
            vec![
                g.id.clone(),
                g.title.clone(),
                g.description.clone(),
                opt_text(&g.target_date),
                g.status.as_str().to_string(),
                g.priority.as_str().to_string(),
            ]
        }),
    );

    section(
        &mut out,
        "BMPs",
        &[
            "id",
            "name",
            "description",
            "category",
            "implementationCost",
            "maintenanceCost",
            "effectiveness",
            "applicableAreas",
        ],
        report.bmps.iter().map(|b| {
            vec![
                b.id.clone(),
                b.name.clone(),
                b.description.clone(),
                b.category.clone(),
                opt_number(b.implementation_cost),
                opt_number(b.maintenance_cost),
                opt_number(b.effectiveness),
                b.applicable_areas.join(LIST_SEPARATOR),
            ]
        }),
    );

    section(
        &mut out,
        "Implementation",
        &[
            "id",
            "name",
            "description",
            "startDate",
            "endDate",
            "budget",
            "responsible",
            "status",
            "relatedGoals",
            "relatedBMPs",
        ],
        report.implementation.iter().map(|a| {
            vec![
                a.id.clone(),
                a.name.clone(),
                a.description.clone(),
                opt_text(&a.start_date),
                opt_text(&a.end_date),
                opt_number(a.budget),
                a.responsible.clone(),
                a.status.as_str().to_string(),
                a.related_goals.join(LIST_SEPARATOR),
                a.related_bmps.join(LIST_SEPARATOR),
            ]
        }),
    );

    section(
        &mut out,
        "Monitoring",
        &[
            "id",
            "name",
            "description",
            "unit",
            "targetValue",
            "currentValue",
            "frequency",
            "methodology",
            "responsibleParty",
        ],
        report.monitoring.iter().map(|r| {
            vec![
                r.id.clone(),
                r.name.clone(),
                r.description.clone(),
                r.unit.clone(),
                opt_number(r.target_value),
                opt_number(r.current_value),
                r.frequency.clone(),
                r.methodology.clone(),
                r.responsible_party.clone(),
            ]
        }),
    );

    section(
        &mut out,
        "Outreach",
        &[
            "id",
            "name",
            "description",
            "targetAudience",
            "method",
            "timeline",
            "expectedOutcome",
            "budget",
        ],
        report.outreach.iter().map(|o| {
            vec![
                o.id.clone(),
                o.name.clone(),
                o.description.clone(),
                o.target_audience.clone(),
                o.method.clone(),
                o.timeline.clone(),
                o.expected_outcome.clone(),
                opt_number(o.budget),
            ]
        }),
    );

    section(
        &mut out,
        "Geographic Areas",
        &["id", "name", "type", "area", "lat", "lng", "characteristics"],
        report.geographic_areas.iter().map(|a| {
            vec![
                a.id.clone(),
                a.name.clone(),
                a.area_type.as_str().to_string(),
                opt_number(a.area),
                opt_number(a.coordinates.map(|c| c.lat)),
                opt_number(a.coordinates.map(|c| c.lng)),
                a.characteristics.join(LIST_SEPARATOR),
            ]
        }),
    );

    out
}

fn section<I>(out: &mut String, title: &str, header: &[&str], rows: I)
where
    I: IntoIterator<Item = Vec<String>>,
{
    if !out.is_empty() {
        out.push('\n');
    }
    writeln!(out, "{}", escape_csv(title)).ok();
    writeln!(out, "{}", header.join(",")).ok();
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_csv(c)).collect();
        writeln!(out, "{}", cells.join(",")).ok();
    }
}

fn opt_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_number(value: Option<f64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
