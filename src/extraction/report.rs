//! Canonical report types.
//!
//! Field names serialize in camelCase to match the JSON object providers
//! are asked to produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Goal status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match normalize_label(s).as_str() {
            "planned" | "not-started" | "proposed" => Some(Self::Planned),
            "in-progress" | "ongoing" | "active" | "underway" => Some(Self::InProgress),
            "completed" | "complete" | "done" | "achieved" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Goal priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match normalize_label(s).as_str() {
            "low" => Some(Self::Low),
            "medium" | "moderate" => Some(Self::Medium),
            "high" | "critical" => Some(Self::High),
            _ => None,
        }
    }
}

/// Implementation activity status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    #[default]
    Planned,
    Ongoing,
    Completed,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match normalize_label(s).as_str() {
            "planned" | "not-started" | "proposed" => Some(Self::Planned),
            "ongoing" | "in-progress" | "active" | "underway" => Some(Self::Ongoing),
            "completed" | "complete" | "done" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Kind of geographic area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaType {
    #[default]
    Watershed,
    County,
    Region,
    State,
}

impl AreaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Watershed => "watershed",
            Self::County => "county",
            Self::Region => "region",
            Self::State => "state",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match normalize_label(s).as_str() {
            "watershed" | "subwatershed" | "sub-watershed" | "basin" => Some(Self::Watershed),
            "county" => Some(Self::County),
            "region" => Some(Self::Region),
            "state" => Some(Self::State),
            _ => None,
        }
    }
}

/// Lowercase, trim, and unify separators so "In Progress" matches "in-progress".
fn normalize_label(s: &str) -> String {
    s.trim().to_lowercase().replace(['_', ' '], "-")
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub target_date: Option<String>,
    pub status: GoalStatus,
    pub priority: Priority,
}

/// Best management practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bmp {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub implementation_cost: Option<f64>,
    pub maintenance_cost: Option<f64>,
    /// Percent, 0-100.
    pub effectiveness: Option<f64>,
    pub applicable_areas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationActivity {
    pub id: String,
    pub name: String,
    pub description: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub responsible: String,
    pub status: ActivityStatus,
    pub related_goals: Vec<String>,
    #[serde(rename = "relatedBMPs")]
    pub related_bmps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringMetric {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unit: String,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub frequency: String,
    pub methodology: String,
    pub responsible_party: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutreachActivity {
    pub id: String,
    pub name: String,
    pub description: String,
    pub target_audience: String,
    pub method: String,
    pub timeline: String,
    pub expected_outcome: String,
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicArea {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub area_type: AreaType,
    /// Area in the document's units (usually square miles or acres).
    pub area: Option<f64>,
    pub coordinates: Option<Coordinates>,
    pub characteristics: Vec<String>,
}

/// Derived counts and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_goals: usize,
    #[serde(rename = "totalBMPs")]
    pub total_bmps: usize,
    /// Percentage of goals with status `completed`, 0-100.
    pub completion_rate: f64,
    /// Fixed placeholder; extraction accuracy is not measured.
    pub accuracy_estimate: f64,
    pub processing_time_ms: u64,
}

/// Where the report came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub file_name: String,
    pub file_size: u64,
    pub extracted_at: DateTime<Utc>,
    /// Provider display name and model, e.g. "OpenAI (gpt-4o)".
    pub processing_method: String,
}

/// The structured result of one extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalReport {
    pub summary: Summary,
    pub goals: Vec<Goal>,
    pub bmps: Vec<Bmp>,
    pub implementation: Vec<ImplementationActivity>,
    pub monitoring: Vec<MonitoringMetric>,
    pub outreach: Vec<OutreachActivity>,
    pub geographic_areas: Vec<GeographicArea>,
    pub metadata: Metadata,
}

impl CanonicalReport {
    /// Every record id in the report, in category order.
    pub fn all_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        ids.extend(self.goals.iter().map(|r| r.id.as_str()));
        ids.extend(self.bmps.iter().map(|r| r.id.as_str()));
        ids.extend(self.implementation.iter().map(|r| r.id.as_str()));
        ids.extend(self.monitoring.iter().map(|r| r.id.as_str()));
        ids.extend(self.outreach.iter().map(|r| r.id.as_str()));
        ids.extend(self.geographic_areas.iter().map(|r| r.id.as_str()));
        ids
    }
}
