//! Turn raw provider JSON into a [`CanonicalReport`].
//!
//! Provider output is untyped and only loosely follows the schema. Every
//! record is validated field by field here; nothing past this point sees
//! raw JSON.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use super::report::{
    ActivityStatus, AreaType, Bmp, CanonicalReport, Coordinates, GeographicArea, Goal,
    GoalStatus, ImplementationActivity, Metadata, MonitoringMetric, OutreachActivity, Priority,
    Summary,
};
use crate::llm::MISSING_TEXT;

/// Placeholder accuracy reported with every extraction.
pub const ACCURACY_ESTIMATE: f64 = 85.0;

/// Build the report from a provider response.
pub fn finalize(raw: &Value, metadata: Metadata, processing_time_ms: u64) -> CanonicalReport {
    let root = match raw.as_object() {
        Some(obj) => obj.clone(),
        None => {
            warn!("Provider response is not a JSON object, treating every category as empty");
            Map::new()
        }
    };

    let mut ids = IdAllocator::default();

    let goals: Vec<Goal> = records(&root, "goals")
        .map(|r| Goal {
            id: ids.assign(r.id(), "goal"),
            title: r.text("title"),
            description: r.text("description"),
            target_date: r.opt_text("targetDate"),
            status: r.label("status", GoalStatus::from_str),
            priority: r.label("priority", Priority::from_str),
        })
        .collect();

    let bmps: Vec<Bmp> = records(&root, "bmps")
        .map(|r| Bmp {
            id: ids.assign(r.id(), "bmp"),
            name: r.text("name"),
            description: r.text("description"),
            category: r.text("category"),
            implementation_cost: r.number("implementationCost"),
            maintenance_cost: r.number("maintenanceCost"),
            effectiveness: r.number("effectiveness").map(|e| e.clamp(0.0, 100.0)),
            applicable_areas: r.list("applicableAreas"),
        })
        .collect();

    let implementation: Vec<ImplementationActivity> = records(&root, "implementation")
        .map(|r| ImplementationActivity {
            id: ids.assign(r.id(), "impl"),
            name: r.text("name"),
            description: r.text("description"),
            start_date: r.opt_text("startDate"),
            end_date: r.opt_text("endDate"),
            budget: r.number("budget"),
            responsible: r.text("responsible"),
            status: r.label("status", ActivityStatus::from_str),
            related_goals: r.list("relatedGoals"),
            related_bmps: r.list("relatedBMPs"),
        })
        .collect();

    let monitoring: Vec<MonitoringMetric> = records(&root, "monitoring")
        .map(|r| MonitoringMetric {
            id: ids.assign(r.id(), "metric"),
            name: r.text("name"),
            description: r.text("description"),
            unit: r.text("unit"),
            target_value: r.number("targetValue"),
            current_value: r.number("currentValue"),
            frequency: r.text("frequency"),
            methodology: r.text("methodology"),
            responsible_party: r.text("responsibleParty"),
        })
        .collect();

    let outreach: Vec<OutreachActivity> = records(&root, "outreach")
        .map(|r| OutreachActivity {
            id: ids.assign(r.id(), "outreach"),
            name: r.text("name"),
            description: r.text("description"),
            target_audience: r.text("targetAudience"),
            method: r.text("method"),
            timeline: r.text("timeline"),
            expected_outcome: r.text("expectedOutcome"),
            budget: r.number("budget"),
        })
        .collect();

    let geographic_areas: Vec<GeographicArea> = records(&root, "geographicAreas")
        .map(|r| GeographicArea {
            id: ids.assign(r.id(), "area"),
            name: r.text("name"),
            area_type: r.label("type", AreaType::from_str),
            area: r.number("area"),
            coordinates: r.coordinates("coordinates"),
            characteristics: r.list("characteristics"),
        })
        .collect();

    let summary = Summary {
        total_goals: goals.len(),
        total_bmps: bmps.len(),
        completion_rate: completion_rate(&goals),
        accuracy_estimate: ACCURACY_ESTIMATE,
        processing_time_ms,
    };

    debug!(
        "Finalized report: {} goals, {} BMPs, {} activities, {} metrics, {} outreach, {} areas",
        goals.len(),
        bmps.len(),
        implementation.len(),
        monitoring.len(),
        outreach.len(),
        geographic_areas.len()
    );

    CanonicalReport {
        summary,
        goals,
        bmps,
        implementation,
        monitoring,
        outreach,
        geographic_areas,
        metadata,
    }
}

/// Percentage of goals marked completed, rounded to two decimals.
pub fn completion_rate(goals: &[Goal]) -> f64 {
    if goals.is_empty() {
        return 0.0;
    }
    let completed = goals
        .iter()
        .filter(|g| g.status == GoalStatus::Completed)
        .count();
    let rate = 100.0 * completed as f64 / goals.len() as f64;
    (rate * 100.0).round() / 100.0
}

/// Object records of one category. Missing keys and non-arrays yield nothing.
fn records<'a>(root: &'a Map<String, Value>, key: &'a str) -> impl Iterator<Item = Record<'a>> {
    let items: &[Value] = match root.get(key) {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!("Category '{}' is not an array ({}), ignoring it", key, type_name(other));
            &[]
        }
    };

    items.iter().enumerate().filter_map(move |(i, item)| match item.as_object() {
        Some(fields) => Some(Record { fields }),
        None => {
            warn!("Dropping {}[{}]: expected an object, got {}", key, i, type_name(item));
            None
        }
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Lenient field access over one raw record.
struct Record<'a> {
    fields: &'a Map<String, Value>,
}

impl Record<'_> {
    fn id(&self) -> Option<String> {
        self.opt_text("id")
    }

    /// Required text; missing or blank becomes the placeholder.
    fn text(&self, key: &str) -> String {
        self.opt_text(key)
            .unwrap_or_else(|| MISSING_TEXT.to_string())
    }

    fn opt_text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => (!s.trim().is_empty()).then(|| s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Numbers, or strings that read as numbers once currency and
    /// percent decoration is removed.
    fn number(&self, key: &str) -> Option<f64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let cleaned: String = s
                    .trim()
                    .chars()
                    .filter(|c| !matches!(c, '$' | ',' | '%' | ' '))
                    .collect();
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        }
    }

    fn list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Enumerated value; unknown or missing labels take the type's default.
    fn label<T: Default>(&self, key: &str, parse: fn(&str) -> Option<T>) -> T {
        match self.fields.get(key).and_then(Value::as_str) {
            Some(s) => parse(s).unwrap_or_else(|| {
                debug!("Unknown {} value '{}', using default", key, s);
                T::default()
            }),
            None => T::default(),
        }
    }

    fn coordinates(&self, key: &str) -> Option<Coordinates> {
        let obj = self.fields.get(key)?.as_object()?;
        let inner = Record { fields: obj };
        Some(Coordinates {
            lat: inner.number("lat")?,
            lng: inner.number("lng").or_else(|| inner.number("lon"))?,
        })
    }
}

/// Hands out report-wide unique ids, keeping the provider's where possible.
#[derive(Default)]
struct IdAllocator {
    seen: HashSet<String>,
}

impl IdAllocator {
    fn assign(&mut self, proposed: Option<String>, prefix: &str) -> String {
        if let Some(id) = proposed {
            if self.seen.insert(id.clone()) {
                return id;
            }
            debug!("Duplicate id '{}', generating a replacement", id);
        }

        loop {
            let id = generate_id(prefix);
            if self.seen.insert(id.clone()) {
                return id;
            }
        }
    }
}

/// Generate an id like `goal-1a2b3c4d`.
pub fn generate_id(prefix: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &uuid[..8])
}
