//! Core data types
//!
//! Log records read from the caregiver log streams, and the report types the
//! analytics engine derives from them.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record timestamp. Log producers keep their own UTC offset, so the engine
/// never assumes UTC for calendar dates.
pub type Timestamp = DateTime<FixedOffset>;

// ============================================================================
// Log Records
// ============================================================================

/// Meal category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MealType {
    PreMeal,
    PostMeal,
    Snack,
}

/// A logged meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealRecord {
    pub id: i64,
    pub child_id: String,
    pub meal_type: MealType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(alias = "created_at")]
    pub timestamp: Timestamp,
}

/// A sleep session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepRecord {
    pub id: i64,
    pub child_id: String,
    pub start_time: Timestamp,
    /// `None` while the session is still ongoing
    #[serde(default)]
    pub end_time: Option<Timestamp>,
    /// Caregiver rating, 1-5
    #[serde(default)]
    pub quality_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SleepRecord {
    /// Session duration in minutes, if the session has ended
    pub fn duration_minutes(&self) -> Option<f64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds() as f64 / 60_000.0)
    }
}

/// Behavior types counted as dysregulation by the regulation battery
pub const NEGATIVE_BEHAVIOR_TYPES: [&str; 3] = ["meltdown", "tantrum", "aggression"];

/// A behavior incident, optionally carrying structured ABC analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorIncident {
    pub id: i64,
    pub child_id: String,
    /// Free-form label (meltdown, positive, anxiety, ...)
    pub behavior_type: String,
    /// Mood, 1-5
    #[serde(default)]
    pub mood_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(alias = "created_at")]
    pub timestamp: Timestamp,
    /// Raw analysis data as produced by the classifier. Kept loosely typed so a
    /// malformed record never fails deserialization of the whole stream.
    #[serde(default, alias = "analysis_data", skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Value>,
}

impl BehaviorIncident {
    /// Parsed analysis, if present and shaped like an object
    pub fn analysis(&self) -> Option<BehaviorAnalysis> {
        self.analysis
            .as_ref()
            .and_then(|value| BehaviorAnalysis::from_value(self.id, value))
    }

    /// Whether the behavior type is one of meltdown, tantrum or aggression
    pub fn is_negative(&self) -> bool {
        let behavior_type = self.behavior_type.to_lowercase();
        NEGATIVE_BEHAVIOR_TYPES.contains(&behavior_type.as_str())
    }

    /// Whether the behavior type is exactly "meltdown" (ignoring case)
    pub fn is_meltdown(&self) -> bool {
        self.behavior_type.eq_ignore_ascii_case("meltdown")
    }
}

/// Outcome of a request the child made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Granted,
    Denied,
    Delayed,
    Unresolved,
}

impl RequestStatus {
    /// Parse a status label, ignoring case
    pub fn parse(label: &str) -> Option<Self> {
        match label.to_uppercase().as_str() {
            "GRANTED" => Some(RequestStatus::Granted),
            "DENIED" => Some(RequestStatus::Denied),
            "DELAYED" => Some(RequestStatus::Delayed),
            "UNRESOLVED" => Some(RequestStatus::Unresolved),
            _ => None,
        }
    }

    /// Whether the request is still waiting on the caregiver
    pub fn is_open(&self) -> bool {
        !matches!(self, RequestStatus::Granted)
    }
}

/// Structured antecedent/behavior/consequence data attached to an incident.
///
/// Each field is read on its own: a field with an unexpected shape reads as
/// `None` and only drops out of the tallies that use it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorAnalysis {
    pub antecedent: Option<String>,
    pub behavior: Option<String>,
    pub consequence: Option<String>,
    pub intervention: Option<String>,
    pub request_object: Option<String>,
    pub request_status: Option<RequestStatus>,
    pub food_seeking: Option<bool>,
}

impl BehaviorAnalysis {
    /// Read analysis fields from raw JSON. Returns `None` when the value is not an object.
    pub fn from_value(incident_id: i64, value: &Value) -> Option<Self> {
        let Some(obj) = value.as_object() else {
            log::warn!("incident {incident_id}: analysis is not an object, ignoring");
            return None;
        };

        let text = |key: &str| -> Option<String> {
            match obj.get(key) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => {
                    log::warn!("incident {incident_id}: analysis.{key} is not a string ({other}), skipping");
                    None
                }
            }
        };

        let request_status = text("request_status").and_then(|label| {
            let parsed = RequestStatus::parse(&label);
            if parsed.is_none() && !label.is_empty() {
                log::warn!("incident {incident_id}: unknown request_status {label:?}, skipping");
            }
            parsed
        });

        Some(Self {
            antecedent: text("antecedent"),
            behavior: text("behavior"),
            consequence: text("consequence"),
            intervention: text("intervention"),
            request_object: text("request_object"),
            request_status,
            food_seeking: obj.get("food_seeking").and_then(Value::as_bool),
        })
    }
}

/// A hydration entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrationRecord {
    pub id: i64,
    pub child_id: String,
    pub fluid_type: String,
    pub amount_ml: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(alias = "created_at")]
    pub timestamp: Timestamp,
}

/// A generic activity entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: i64,
    pub child_id: String,
    pub activity_type: String,
    /// Free-form details, e.g. `{"duration_minutes": 30}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(alias = "created_at")]
    pub timestamp: Timestamp,
}

// ============================================================================
// Report Types
// ============================================================================

/// Qualitative reading of the regulation battery level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatteryStatus {
    High,
    Moderate,
    Low,
    Critical,
}

impl BatteryStatus {
    /// Map a clamped level to its status band
    pub fn from_level(level: i32) -> Self {
        if level > 80 {
            BatteryStatus::High
        } else if level > 50 {
            BatteryStatus::Moderate
        } else if level > 20 {
            BatteryStatus::Low
        } else {
            BatteryStatus::Critical
        }
    }
}

/// Heuristic 0-100 wellness score over the last 24 hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationBattery {
    pub level: i32,
    pub status: BatteryStatus,
    /// Factors that charged the battery
    pub inputs: Vec<String>,
    /// Factors that drained it
    pub drains: Vec<String>,
    pub recommendation: String,
}

/// Urgency of an open loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
}

/// An unresolved caregiver request still inside its urgency window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenLoop {
    /// Source incident id
    pub id: i64,
    pub request_object: String,
    pub status: RequestStatus,
    pub timestamp: Timestamp,
    pub time_elapsed_minutes: i64,
    pub risk_level: RiskLevel,
}

/// One ranked ABC bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbcStat {
    pub label: String,
    pub count: u32,
    /// Share of all incidents in the window, one decimal
    pub percentage: f64,
}

/// Antecedent and intervention frequencies over the week
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbcAnalysis {
    pub top_triggers: Vec<AbcStat>,
    pub effective_interventions: Vec<AbcStat>,
    pub total_incidents: u32,
}

/// Kind of derived finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Correlation,
    Pattern,
    Alert,
}

/// Confidence attached to an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// A derived finding surfaced to caregivers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub confidence: Confidence,
    #[serde(default)]
    pub actionable_tip: Option<String>,
}

/// Weekly analytics report for one child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummaryReport {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_meals: u32,
    pub total_sleep_hours: f64,
    pub avg_sleep_quality: f64,
    pub total_incidents: u32,
    pub total_hydration_ml: u64,
    pub total_activities: u32,
    pub regulation_battery: RegulationBattery,
    pub open_loops: Vec<OpenLoop>,
    pub abc_analysis: AbcAnalysis,
    pub insights: Vec<Insight>,
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

/// A pattern-based alert for caregivers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAlert {
    pub child_id: String,
    pub alert_type: String,
    pub severity: AlertSeverity,
    pub title: String,
    pub description: String,
    /// Numbers the alert was derived from
    pub pattern_data: Value,
}

// ============================================================================
// Payload Types
// ============================================================================

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Encoded weekly summary, as handed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryPayload {
    pub schema_version: String,
    pub producer: SummaryProducer,
    pub child_id: String,
    pub computed_at_utc: String,
    pub summary: WeeklySummaryReport,
}
