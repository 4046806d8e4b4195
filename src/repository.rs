//! Log repository access
//!
//! The engine only reads the five caregiver log streams. [`LogRepository`] is
//! the seam to whatever store holds them; [`InMemoryRepository`] serves a JSON
//! [`LogDataset`] and backs the CLI, the FFI surface and tests.

use crate::error::AnalyticsError;
use crate::types::{
    ActivityRecord, BehaviorIncident, HydrationRecord, MealRecord, SleepRecord,
};
use crate::window::TimeWindow;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Read access to the caregiver log streams.
///
/// Every call is scoped to one child and one half-open window. Implementations
/// return records in their natural retrieval order and surface store failures
/// as [`AnalyticsError::Repository`]; the engine does not retry.
pub trait LogRepository {
    /// Meals whose timestamp falls in `window`
    fn list_meals(&self, child_id: &str, window: &TimeWindow)
        -> Result<Vec<MealRecord>, AnalyticsError>;

    /// Sleep sessions whose start time falls in `window`
    fn list_sleep_sessions(
        &self,
        child_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<SleepRecord>, AnalyticsError>;

    /// Behavior incidents whose timestamp falls in `window`
    fn list_behavior_incidents(
        &self,
        child_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<BehaviorIncident>, AnalyticsError>;

    /// Hydration entries whose timestamp falls in `window`
    fn list_hydration_entries(
        &self,
        child_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<HydrationRecord>, AnalyticsError>;

    /// Activities whose timestamp falls in `window`
    fn list_activities(
        &self,
        child_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<ActivityRecord>, AnalyticsError>;
}

/// All five log streams, as exported from the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogDataset {
    pub meals: Vec<MealRecord>,
    pub sleep_sessions: Vec<SleepRecord>,
    pub behavior_incidents: Vec<BehaviorIncident>,
    pub hydration_entries: Vec<HydrationRecord>,
    pub activities: Vec<ActivityRecord>,
}

impl LogDataset {
    /// Parse a dataset document
    pub fn from_json(json: &str) -> Result<Self, AnalyticsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the dataset
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Total number of records across all streams
    pub fn record_count(&self) -> usize {
        self.meals.len()
            + self.sleep_sessions.len()
            + self.behavior_incidents.len()
            + self.hydration_entries.len()
            + self.activities.len()
    }

    /// Check records for values the engine will ignore or clamp.
    ///
    /// None of these stop a summary from being built; they explain why a
    /// record did not contribute to it.
    pub fn validate(&self) -> Vec<ValidationResult> {
        let mut results = Vec::new();

        for (index, sleep) in self.sleep_sessions.iter().enumerate() {
            let mut push = |issue| {
                results.push(ValidationResult {
                    stream: "sleep_sessions",
                    index,
                    record_id: sleep.id,
                    issue,
                })
            };
            if let Some(end) = sleep.end_time {
                if end < sleep.start_time {
                    push(RecordIssue::EndBeforeStart);
                }
            }
            if let Some(rating) = sleep.quality_rating {
                if !(1..=5).contains(&rating) {
                    push(RecordIssue::RatingOutOfRange {
                        field: "quality_rating",
                        value: rating,
                    });
                }
            }
        }

        for (index, incident) in self.behavior_incidents.iter().enumerate() {
            let mut push = |issue| {
                results.push(ValidationResult {
                    stream: "behavior_incidents",
                    index,
                    record_id: incident.id,
                    issue,
                })
            };
            if let Some(rating) = incident.mood_rating {
                if !(1..=5).contains(&rating) {
                    push(RecordIssue::RatingOutOfRange {
                        field: "mood_rating",
                        value: rating,
                    });
                }
            }
            if let Some(analysis) = &incident.analysis {
                for issue in analysis_issues(analysis) {
                    push(issue);
                }
            }
        }

        results
    }
}

/// String-valued analysis fields
const ANALYSIS_TEXT_FIELDS: [&str; 6] = [
    "antecedent",
    "behavior",
    "consequence",
    "intervention",
    "request_object",
    "request_status",
];

fn analysis_issues(analysis: &Value) -> Vec<RecordIssue> {
    let Some(obj) = analysis.as_object() else {
        return vec![RecordIssue::AnalysisNotObject];
    };

    let mut issues = Vec::new();
    for field in ANALYSIS_TEXT_FIELDS {
        match obj.get(field) {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(_) => issues.push(RecordIssue::MalformedAnalysisField(field)),
        }
    }
    if let Some(Value::String(status)) = obj.get("request_status") {
        if !status.is_empty() && crate::types::RequestStatus::parse(status).is_none() {
            issues.push(RecordIssue::UnknownRequestStatus(status.clone()));
        }
    }
    if let Some(value) = obj.get("food_seeking") {
        if !value.is_boolean() && !value.is_null() {
            issues.push(RecordIssue::MalformedAnalysisField("food_seeking"));
        }
    }
    issues
}

/// Problems found in a single record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordIssue {
    #[error("{field} must be within 1-5, got {value}")]
    RatingOutOfRange { field: &'static str, value: u8 },

    #[error("end_time is before start_time")]
    EndBeforeStart,

    #[error("analysis is not an object")]
    AnalysisNotObject,

    #[error("analysis.{0} has an unexpected type")]
    MalformedAnalysisField(&'static str),

    #[error("unknown request_status: {0}")]
    UnknownRequestStatus(String),
}

/// Result of record validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub stream: &'static str,
    pub index: usize,
    pub record_id: i64,
    pub issue: RecordIssue,
}

/// Repository over an in-memory dataset
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    dataset: LogDataset,
}

impl InMemoryRepository {
    pub fn new(dataset: LogDataset) -> Self {
        Self { dataset }
    }

    /// Build a repository from a dataset document
    pub fn from_json(json: &str) -> Result<Self, AnalyticsError> {
        Ok(Self::new(LogDataset::from_json(json)?))
    }

    pub fn dataset(&self) -> &LogDataset {
        &self.dataset
    }
}

impl LogRepository for InMemoryRepository {
    fn list_meals(
        &self,
        child_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<MealRecord>, AnalyticsError> {
        Ok(self
            .dataset
            .meals
            .iter()
            .filter(|m| m.child_id == child_id && window.contains(&m.timestamp))
            .cloned()
            .collect())
    }

    fn list_sleep_sessions(
        &self,
        child_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<SleepRecord>, AnalyticsError> {
        Ok(self
            .dataset
            .sleep_sessions
            .iter()
            .filter(|s| s.child_id == child_id && window.contains(&s.start_time))
            .cloned()
            .collect())
    }

    fn list_behavior_incidents(
        &self,
        child_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<BehaviorIncident>, AnalyticsError> {
        Ok(self
            .dataset
            .behavior_incidents
            .iter()
            .filter(|b| b.child_id == child_id && window.contains(&b.timestamp))
            .cloned()
            .collect())
    }

    fn list_hydration_entries(
        &self,
        child_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<HydrationRecord>, AnalyticsError> {
        Ok(self
            .dataset
            .hydration_entries
            .iter()
            .filter(|h| h.child_id == child_id && window.contains(&h.timestamp))
            .cloned()
            .collect())
    }

    fn list_activities(
        &self,
        child_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<ActivityRecord>, AnalyticsError> {
        Ok(self
            .dataset
            .activities
            .iter()
            .filter(|a| a.child_id == child_id && window.contains(&a.timestamp))
            .cloned()
            .collect())
    }
}
