//! Regulation battery scoring
//!
//! An additive model over the last 24 hours: start from a baseline level,
//! adjust for the latest completed sleep, meal regularity and dysregulated
//! behavior, then clamp to 0-100.

use crate::config::DEFAULT_BASELINE_LEVEL;
use crate::types::{
    BatteryStatus, BehaviorIncident, MealRecord, RegulationBattery, SleepRecord,
};

/// Sleep longer than this (8 hours) charges the battery
const GOOD_SLEEP_MINUTES: f64 = 480.0;

/// Sleep shorter than this (6 hours) drains it
const POOR_SLEEP_MINUTES: f64 = 360.0;

const SLEEP_ADJUSTMENT: i32 = 20;
const MEAL_ADJUSTMENT: i32 = 10;
const MELTDOWN_COST: i32 = 15;

/// Levels below this get the rest recommendation
const REST_RECOMMENDATION_BELOW: i32 = 50;

const REST_RECOMMENDATION: &str = "Encourage rest and low-demand activities.";
const ACTIVE_RECOMMENDATION: &str = "Great time for learning or outings.";

/// Scorer for the regulation battery
#[derive(Debug, Clone, Copy)]
pub struct RegulationScorer {
    baseline_level: i32,
}

impl Default for RegulationScorer {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_LEVEL)
    }
}

impl RegulationScorer {
    pub fn new(baseline_level: i32) -> Self {
        Self { baseline_level }
    }

    /// Score records that already belong to the regulation window
    pub fn score(
        &self,
        sleeps: &[SleepRecord],
        meals: &[MealRecord],
        behaviors: &[BehaviorIncident],
    ) -> RegulationBattery {
        let mut level = self.baseline_level;
        let mut inputs = Vec::new();
        let mut drains = Vec::new();

        // Sleep impact
        let sleep_minutes = latest_completed_sleep(sleeps).and_then(SleepRecord::duration_minutes);
        if let Some(duration) = sleep_minutes {
            if duration > GOOD_SLEEP_MINUTES {
                level += SLEEP_ADJUSTMENT;
                inputs.push("Good sleep (>8h)".to_string());
            } else if duration < POOR_SLEEP_MINUTES {
                level -= SLEEP_ADJUSTMENT;
                drains.push("Poor sleep (<6h)".to_string());
            }
        }

        // Meal impact; an empty window means nothing was logged, not that meals were skipped
        let meal_count = meals.len();
        if meal_count >= 3 {
            level += MEAL_ADJUSTMENT;
            inputs.push("Regular meals".to_string());
        } else if meal_count == 1 {
            level -= MEAL_ADJUSTMENT;
            drains.push("Missed meals".to_string());
        }

        // Behavior impact
        let meltdowns = behaviors.iter().filter(|b| b.is_negative()).count() as i32;
        if meltdowns > 0 {
            level -= MELTDOWN_COST * meltdowns;
            drains.push(format!("{meltdowns} Meltdowns"));
        }

        let level = level.clamp(0, 100);
        let recommendation = if level < REST_RECOMMENDATION_BELOW {
            REST_RECOMMENDATION
        } else {
            ACTIVE_RECOMMENDATION
        };

        log::debug!(
            "regulation battery: level={level} sleeps={} meals={meal_count} meltdowns={meltdowns}",
            sleeps.len()
        );

        RegulationBattery {
            level,
            status: BatteryStatus::from_level(level),
            inputs,
            drains,
            recommendation: recommendation.to_string(),
        }
    }
}

/// Most recently started session that has an end time
fn latest_completed_sleep(sleeps: &[SleepRecord]) -> Option<&SleepRecord> {
    sleeps
        .iter()
        .filter(|s| s.end_time.is_some())
        .max_by_key(|s| s.start_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use crate::types::{MealType, Timestamp};

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn sleep(start: &str, end: Option<&str>) -> SleepRecord {
        SleepRecord {
            id: 1,
            child_id: "child-1".to_string(),
            start_time: ts(start),
            end_time: end.map(ts),
            quality_rating: None,
            notes: None,
        }
    }

    fn meals(count: usize) -> Vec<MealRecord> {
        (0..count)
            .map(|i| MealRecord {
                id: i as i64,
                child_id: "child-1".to_string(),
                meal_type: MealType::PreMeal,
                notes: None,
                timestamp: ts("2024-01-15T08:00:00Z") + Duration::hours(i as i64),
            })
            .collect()
    }

    fn incident(behavior_type: &str) -> BehaviorIncident {
        BehaviorIncident {
            id: 1,
            child_id: "child-1".to_string(),
            behavior_type: behavior_type.to_string(),
            mood_rating: None,
            incident_description: None,
            notes: None,
            timestamp: ts("2024-01-15T10:00:00Z"),
            analysis: None,
        }
    }

    #[test]
    fn test_no_data_keeps_baseline() {
        let battery = RegulationScorer::default().score(&[], &[], &[]);

        assert_eq!(battery.level, 70);
        assert_eq!(battery.status, BatteryStatus::Moderate);
        assert!(battery.inputs.is_empty());
        assert!(battery.drains.is_empty());
        assert_eq!(battery.recommendation, ACTIVE_RECOMMENDATION);
    }

    #[test]
    fn test_sleep_boundary_is_exclusive() {
        let scorer = RegulationScorer::default();

        // Exactly 480 minutes: no bonus
        let exact = scorer.score(
            &[sleep("2024-01-14T21:00:00Z", Some("2024-01-15T05:00:00Z"))],
            &[],
            &[],
        );
        assert_eq!(exact.level, 70);
        assert!(exact.inputs.is_empty());

        // 481 minutes: bonus
        let over = scorer.score(
            &[sleep("2024-01-14T21:00:00Z", Some("2024-01-15T05:01:00Z"))],
            &[],
            &[],
        );
        assert_eq!(over.level, 90);
        assert_eq!(over.inputs, vec!["Good sleep (>8h)".to_string()]);
        assert_eq!(over.status, BatteryStatus::High);
    }

    #[test]
    fn test_poor_sleep_boundary() {
        let scorer = RegulationScorer::default();

        let exact = scorer.score(
            &[sleep("2024-01-14T23:00:00Z", Some("2024-01-15T05:00:00Z"))],
            &[],
            &[],
        );
        assert_eq!(exact.level, 70);

        let under = scorer.score(
            &[sleep("2024-01-14T23:00:00Z", Some("2024-01-15T04:59:00Z"))],
            &[],
            &[],
        );
        assert_eq!(under.level, 50);
        assert_eq!(under.drains, vec!["Poor sleep (<6h)".to_string()]);
    }

    #[test]
    fn test_uses_latest_completed_session() {
        let scorer = RegulationScorer::default();
        let sleeps = vec![
            // Earlier, long
            sleep("2024-01-14T13:00:00Z", Some("2024-01-14T22:00:00Z")),
            // Latest started but still ongoing
            sleep("2024-01-15T13:00:00Z", None),
            // Latest completed, short
            sleep("2024-01-14T23:00:00Z", Some("2024-01-15T03:00:00Z")),
        ];

        let battery = scorer.score(&sleeps, &[], &[]);
        assert_eq!(battery.level, 50);
        assert_eq!(battery.drains, vec!["Poor sleep (<6h)".to_string()]);
    }

    #[test]
    fn test_only_ongoing_sleep_is_skipped() {
        let battery =
            RegulationScorer::default().score(&[sleep("2024-01-15T01:00:00Z", None)], &[], &[]);
        assert_eq!(battery.level, 70);
        assert!(battery.drains.is_empty());
    }

    #[test]
    fn test_meal_bands() {
        let scorer = RegulationScorer::default();

        let one = scorer.score(&[], &meals(1), &[]);
        assert_eq!(one.level, 60);
        assert_eq!(one.drains, vec!["Missed meals".to_string()]);

        let two = scorer.score(&[], &meals(2), &[]);
        assert_eq!(two.level, 70);
        assert!(two.inputs.is_empty() && two.drains.is_empty());

        let three = scorer.score(&[], &meals(3), &[]);
        assert_eq!(three.level, 80);
        assert_eq!(three.inputs, vec!["Regular meals".to_string()]);
    }

    #[test]
    fn test_case_insensitive_meltdowns() {
        let behaviors = vec![
            incident("Meltdown"),
            incident("TANTRUM"),
            incident("aggression"),
            incident("positive"),
        ];

        let battery = RegulationScorer::default().score(&[], &[], &behaviors);
        assert_eq!(battery.level, 25);
        assert_eq!(battery.status, BatteryStatus::Low);
        assert_eq!(battery.drains, vec!["3 Meltdowns".to_string()]);
        assert_eq!(battery.recommendation, REST_RECOMMENDATION);
    }

    #[test]
    fn test_level_is_clamped() {
        let behaviors: Vec<BehaviorIncident> = (0..10).map(|_| incident("meltdown")).collect();
        let low = RegulationScorer::default().score(&[], &[], &behaviors);
        assert_eq!(low.level, 0);
        assert_eq!(low.status, BatteryStatus::Critical);

        let high = RegulationScorer::new(95).score(
            &[sleep("2024-01-14T20:00:00Z", Some("2024-01-15T07:00:00Z"))],
            &meals(4),
            &[],
        );
        assert_eq!(high.level, 100);
    }

    #[test]
    fn test_recommendation_threshold() {
        // 70 - 20 (poor sleep) = 50 sits on the active side
        let battery = RegulationScorer::default().score(
            &[sleep("2024-01-15T00:00:00Z", Some("2024-01-15T04:00:00Z"))],
            &[],
            &[],
        );
        assert_eq!(battery.level, 50);
        assert_eq!(battery.status, BatteryStatus::Low);
        assert_eq!(battery.recommendation, ACTIVE_RECOMMENDATION);
    }
}
