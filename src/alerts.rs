//! Pattern alerts
//!
//! Simple threshold checks over the summary window that produce caregiver
//! alerts, independent of the weekly report.

use crate::config::{DEFAULT_MEAL_ALERT_THRESHOLD, DEFAULT_SUMMARY_WINDOW_DAYS};
use crate::types::{AlertSeverity, MealRecord, PatternAlert};
use crate::window::round_tenth;
use serde_json::json;

/// Analyzer for logging-frequency patterns
#[derive(Debug, Clone, Copy)]
pub struct PatternAlertAnalyzer {
    meal_threshold: u32,
    days_analyzed: i64,
}

impl Default for PatternAlertAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_MEAL_ALERT_THRESHOLD, DEFAULT_SUMMARY_WINDOW_DAYS)
    }
}

impl PatternAlertAnalyzer {
    pub fn new(meal_threshold: u32, days_analyzed: i64) -> Self {
        Self {
            meal_threshold,
            days_analyzed,
        }
    }

    /// Check meals logged over `days_analyzed` days
    pub fn analyze(&self, child_id: &str, meals: &[MealRecord]) -> Vec<PatternAlert> {
        let mut alerts = Vec::new();

        let meal_count = meals.len() as u32;
        if meal_count < self.meal_threshold {
            let average_per_day = round_tenth(meal_count as f64 / self.days_analyzed as f64);
            alerts.push(PatternAlert {
                child_id: child_id.to_string(),
                alert_type: "pattern_detected".to_string(),
                severity: AlertSeverity::Medium,
                title: "Low Meal Logging Frequency".to_string(),
                description: format!(
                    "Only {meal_count} meals logged in the past {} days. Consider logging meals more consistently.",
                    self.days_analyzed
                ),
                pattern_data: json!({
                    "meal_count": meal_count,
                    "days_analyzed": self.days_analyzed,
                    "average_per_day": average_per_day,
                }),
            });
        }

        alerts
    }
}
