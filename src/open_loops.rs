//! Open-loop detection
//!
//! An open loop is a request the child made that was denied, delayed or left
//! unresolved, and is still recent enough to need attention.

use crate::config::{DEFAULT_HIGH_RISK_MINUTES, DEFAULT_OPEN_LOOP_HORIZON_MINUTES};
use crate::types::{BehaviorIncident, OpenLoop, RiskLevel, Timestamp};
use chrono::{DateTime, Utc};

/// Label used when the analysis does not name what was requested
const UNKNOWN_REQUEST: &str = "Unknown request";

/// Detector for unresolved requests
#[derive(Debug, Clone, Copy)]
pub struct OpenLoopDetector {
    horizon_minutes: f64,
    high_risk_minutes: f64,
}

impl Default for OpenLoopDetector {
    fn default() -> Self {
        Self::new(DEFAULT_OPEN_LOOP_HORIZON_MINUTES, DEFAULT_HIGH_RISK_MINUTES)
    }
}

impl OpenLoopDetector {
    pub fn new(horizon_minutes: f64, high_risk_minutes: f64) -> Self {
        Self {
            horizon_minutes,
            high_risk_minutes,
        }
    }

    /// Return open loops in the order the incidents were given
    pub fn detect(&self, behaviors: &[BehaviorIncident], now: DateTime<Utc>) -> Vec<OpenLoop> {
        behaviors
            .iter()
            .filter_map(|b| {
                let analysis = b.analysis()?;
                let status = analysis.request_status.filter(|s| s.is_open())?;

                let elapsed = naive_elapsed_minutes(now, &b.timestamp);
                if elapsed >= self.horizon_minutes {
                    return None;
                }

                let risk_level = if elapsed < self.high_risk_minutes {
                    RiskLevel::High
                } else {
                    RiskLevel::Medium
                };

                Some(OpenLoop {
                    id: b.id,
                    request_object: analysis
                        .request_object
                        .unwrap_or_else(|| UNKNOWN_REQUEST.to_string()),
                    status,
                    timestamp: b.timestamp,
                    time_elapsed_minutes: elapsed.trunc() as i64,
                    risk_level,
                })
            })
            .collect()
    }
}

/// Minutes between `now` and `at`, comparing wall-clock readings.
///
/// The offset of `at` is discarded and its local time is subtracted from UTC
/// `now`. Incidents logged with a non-UTC offset therefore read as older
/// (negative offsets) or younger (positive offsets) than they are.
pub fn naive_elapsed_minutes(now: DateTime<Utc>, at: &Timestamp) -> f64 {
    (now.naive_utc() - at.naive_local()).num_milliseconds() as f64 / 60_000.0
}
