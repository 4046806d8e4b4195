//! Weekly summary composition
//!
//! This module provides the public API of the engine. It pulls one summary
//! window of every log stream from the repository, derives the regulation
//! sub-window from it in memory, and runs each component over its slice.
//!
//! Components work on records already in memory and cannot fail; a section
//! with nothing to report comes back empty or zero. Only repository errors
//! abort a request.

use crate::abc::AbcAggregator;
use crate::alerts::PatternAlertAnalyzer;
use crate::config::AnalyticsConfig;
use crate::encoder::SummaryEncoder;
use crate::error::AnalyticsError;
use crate::insights::{InsightGenerator, InsightRule, InsightWindow};
use crate::open_loops::OpenLoopDetector;
use crate::regulation::RegulationScorer;
use crate::repository::{InMemoryRepository, LogRepository};
use crate::types::{
    BehaviorIncident, MealRecord, PatternAlert, RegulationBattery, SleepRecord,
    WeeklySummaryReport,
};
use crate::window::{round_tenth, TimeWindow};
use chrono::{DateTime, Utc};

/// Build a weekly summary from dataset JSON and encode it (stateless, one-shot).
///
/// # Arguments
/// * `dataset_json` - Log dataset document (see [`crate::repository::LogDataset`])
/// * `child_id` - Child to summarise
/// * `now` - End of the summary window
///
/// # Returns
/// Encoded summary payload JSON
///
/// # Example
/// ```ignore
/// let json = weekly_summary_json(&dataset, "child-1", Utc::now())?;
/// ```
pub fn weekly_summary_json(
    dataset_json: &str,
    child_id: &str,
    now: DateTime<Utc>,
) -> Result<String, AnalyticsError> {
    let repo = InMemoryRepository::from_json(dataset_json)?;
    let report = AnalyticsEngine::new().weekly_summary(&repo, child_id, now)?;
    SummaryEncoder::new().encode_to_json(child_id, now, &report)
}

/// Stateless analytics engine.
///
/// Holds configuration and the component set only; the repository is passed
/// per call, so one engine can serve concurrent requests.
#[derive(Debug)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
    regulation: RegulationScorer,
    open_loops: OpenLoopDetector,
    abc: AbcAggregator,
    insights: InsightGenerator,
    alerts: PatternAlertAnalyzer,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsEngine {
    /// Engine with default windows and thresholds
    pub fn new() -> Self {
        Self::build(AnalyticsConfig::default())
    }

    /// Engine with a custom configuration
    pub fn with_config(config: AnalyticsConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: AnalyticsConfig) -> Self {
        Self {
            regulation: RegulationScorer::new(config.baseline_level),
            open_loops: OpenLoopDetector::new(
                config.open_loop_horizon_minutes,
                config.high_risk_minutes,
            ),
            abc: AbcAggregator::new(config.abc_top_n),
            insights: InsightGenerator::new(config.bad_sleep_minutes),
            alerts: PatternAlertAnalyzer::new(
                config.meal_alert_threshold,
                config.summary_window_days,
            ),
            config,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Register an additional insight rule
    pub fn add_insight_rule(&mut self, rule: Box<dyn InsightRule>) {
        self.insights.push_rule(rule);
    }

    /// Summary window ending at `now`
    pub fn summary_window(&self, now: DateTime<Utc>) -> Result<TimeWindow, AnalyticsError> {
        TimeWindow::last_days(now, self.config.summary_window_days)
    }

    /// Regulation window ending at `now`
    pub fn regulation_window(&self, now: DateTime<Utc>) -> Result<TimeWindow, AnalyticsError> {
        TimeWindow::last_hours(now, self.config.regulation_window_hours)
    }

    /// Compose the weekly report for one child
    pub fn weekly_summary(
        &self,
        repo: &dyn LogRepository,
        child_id: &str,
        now: DateTime<Utc>,
    ) -> Result<WeeklySummaryReport, AnalyticsError> {
        let week = self.summary_window(now)?;
        let day = self.regulation_window(now)?;
        debug_assert!(week.covers(&day));

        let meals = repo.list_meals(child_id, &week)?;
        let sleeps = repo.list_sleep_sessions(child_id, &week)?;
        let behaviors = repo.list_behavior_incidents(child_id, &week)?;
        let hydration = repo.list_hydration_entries(child_id, &week)?;
        let activities = repo.list_activities(child_id, &week)?;

        log::debug!(
            "weekly summary for {child_id}: {} meals, {} sleeps, {} incidents, {} hydration, {} activities",
            meals.len(),
            sleeps.len(),
            behaviors.len(),
            hydration.len(),
            activities.len()
        );

        let regulation_battery = self.score_regulation(&day, &sleeps, &meals, &behaviors);
        let open_loops = self.open_loops.detect(&behaviors, now);
        let abc_analysis = self.abc.aggregate(&behaviors);
        let insights = self.insights.generate(&InsightWindow {
            sleeps: &sleeps,
            behaviors: &behaviors,
            meals: &meals,
        });

        Ok(WeeklySummaryReport {
            week_start: week.start_date(),
            week_end: week.end_date(),
            total_meals: meals.len() as u32,
            total_sleep_hours: total_sleep_hours(&sleeps),
            avg_sleep_quality: average_sleep_quality(&sleeps),
            total_incidents: behaviors.len() as u32,
            total_hydration_ml: hydration.iter().map(|h| u64::from(h.amount_ml)).sum(),
            total_activities: activities.len() as u32,
            regulation_battery,
            open_loops,
            abc_analysis,
            insights,
        })
    }

    /// Regulation battery on its own, queried over the regulation window only
    pub fn regulation_battery(
        &self,
        repo: &dyn LogRepository,
        child_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RegulationBattery, AnalyticsError> {
        let window = self.regulation_window(now)?;
        let sleeps = repo.list_sleep_sessions(child_id, &window)?;
        let meals = repo.list_meals(child_id, &window)?;
        let behaviors = repo.list_behavior_incidents(child_id, &window)?;
        Ok(self.regulation.score(&sleeps, &meals, &behaviors))
    }

    /// Pattern alerts over the summary window
    pub fn pattern_alerts(
        &self,
        repo: &dyn LogRepository,
        child_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<PatternAlert>, AnalyticsError> {
        let meals = repo.list_meals(child_id, &self.summary_window(now)?)?;
        Ok(self.alerts.analyze(child_id, &meals))
    }

    /// Score the records of the summary window that fall in `window`
    fn score_regulation(
        &self,
        window: &TimeWindow,
        sleeps: &[SleepRecord],
        meals: &[MealRecord],
        behaviors: &[BehaviorIncident],
    ) -> RegulationBattery {
        let sleeps: Vec<SleepRecord> = sleeps
            .iter()
            .filter(|s| window.contains(&s.start_time))
            .cloned()
            .collect();
        let meals: Vec<MealRecord> = meals
            .iter()
            .filter(|m| window.contains(&m.timestamp))
            .cloned()
            .collect();
        let behaviors: Vec<BehaviorIncident> = behaviors
            .iter()
            .filter(|b| window.contains(&b.timestamp))
            .cloned()
            .collect();
        self.regulation.score(&sleeps, &meals, &behaviors)
    }
}

/// Sum of completed session durations, in hours, one decimal
fn total_sleep_hours(sleeps: &[SleepRecord]) -> f64 {
    let minutes: f64 = sleeps.iter().filter_map(SleepRecord::duration_minutes).sum();
    round_tenth(minutes / 60.0)
}

/// Mean of the sessions that carry a rating, one decimal; 0 when none do
fn average_sleep_quality(sleeps: &[SleepRecord]) -> f64 {
    let ratings: Vec<f64> = sleeps
        .iter()
        .filter_map(|s| s.quality_rating)
        .map(f64::from)
        .collect();
    if ratings.is_empty() {
        return 0.0;
    }
    round_tenth(ratings.iter().sum::<f64>() / ratings.len() as f64)
}
