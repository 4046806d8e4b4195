//! Engine configuration
//!
//! Window lengths and thresholds used by the analytics components. Every field
//! has a default, so a partial JSON document overrides only what it names.

use crate::error::AnalyticsError;
use serde::{Deserialize, Serialize};

/// Default weekly summary window in days
pub const DEFAULT_SUMMARY_WINDOW_DAYS: i64 = 7;

/// Default regulation battery window in hours
pub const DEFAULT_REGULATION_WINDOW_HOURS: i64 = 24;

/// Longest accepted summary window in days
pub const MAX_SUMMARY_WINDOW_DAYS: i64 = 366;

/// Default regulation battery starting level
pub const DEFAULT_BASELINE_LEVEL: i32 = 70;

/// Open loops older than this are no longer shown (4 hours)
pub const DEFAULT_OPEN_LOOP_HORIZON_MINUTES: f64 = 240.0;

/// Open loops younger than this are high risk
pub const DEFAULT_HIGH_RISK_MINUTES: f64 = 60.0;

/// Default number of ranked ABC buckets
pub const DEFAULT_ABC_TOP_N: usize = 5;

/// Nights shorter than this (7 hours) count as bad sleep for insights
pub const DEFAULT_BAD_SLEEP_MINUTES: f64 = 420.0;

/// Fewer meals than this in the summary window raise an alert (2 per day)
pub const DEFAULT_MEAL_ALERT_THRESHOLD: u32 = 14;

/// Analytics engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub summary_window_days: i64,
    pub regulation_window_hours: i64,
    pub baseline_level: i32,
    pub open_loop_horizon_minutes: f64,
    pub high_risk_minutes: f64,
    pub abc_top_n: usize,
    pub bad_sleep_minutes: f64,
    pub meal_alert_threshold: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            summary_window_days: DEFAULT_SUMMARY_WINDOW_DAYS,
            regulation_window_hours: DEFAULT_REGULATION_WINDOW_HOURS,
            baseline_level: DEFAULT_BASELINE_LEVEL,
            open_loop_horizon_minutes: DEFAULT_OPEN_LOOP_HORIZON_MINUTES,
            high_risk_minutes: DEFAULT_HIGH_RISK_MINUTES,
            abc_top_n: DEFAULT_ABC_TOP_N,
            bad_sleep_minutes: DEFAULT_BAD_SLEEP_MINUTES,
            meal_alert_threshold: DEFAULT_MEAL_ALERT_THRESHOLD,
        }
    }
}

impl AnalyticsConfig {
    /// Check that windows are positive and the regulation window fits inside
    /// the summary window it is derived from.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if !(1..=MAX_SUMMARY_WINDOW_DAYS).contains(&self.summary_window_days) {
            return Err(AnalyticsError::ConfigError(format!(
                "summary_window_days must be within 1-{MAX_SUMMARY_WINDOW_DAYS}, got {}",
                self.summary_window_days
            )));
        }
        if self.regulation_window_hours <= 0 {
            return Err(AnalyticsError::ConfigError(format!(
                "regulation_window_hours must be positive, got {}",
                self.regulation_window_hours
            )));
        }
        let summary_hours = self.summary_window_days.checked_mul(24).unwrap_or(i64::MAX);
        if self.regulation_window_hours > summary_hours {
            return Err(AnalyticsError::ConfigError(format!(
                "regulation window ({}h) exceeds summary window ({}d)",
                self.regulation_window_hours, self.summary_window_days
            )));
        }
        if !(0..=100).contains(&self.baseline_level) {
            return Err(AnalyticsError::ConfigError(format!(
                "baseline_level must be within 0-100, got {}",
                self.baseline_level
            )));
        }
        if self.high_risk_minutes > self.open_loop_horizon_minutes {
            return Err(AnalyticsError::ConfigError(
                "high_risk_minutes must not exceed open_loop_horizon_minutes".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, AnalyticsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
