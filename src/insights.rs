//! Insight generation
//!
//! Insights are produced by independent rules evaluated over the same record
//! window. Each rule decides on its own whether it has anything to report.

use crate::config::DEFAULT_BAD_SLEEP_MINUTES;
use crate::types::{
    BehaviorIncident, Confidence, Insight, InsightType, MealRecord, SleepRecord,
};
use chrono::NaiveDate;
use std::collections::HashSet;

/// Records an insight rule can look at
#[derive(Debug, Clone, Copy)]
pub struct InsightWindow<'a> {
    pub sleeps: &'a [SleepRecord],
    pub behaviors: &'a [BehaviorIncident],
    pub meals: &'a [MealRecord],
}

/// A single insight check
pub trait InsightRule: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Evaluate the rule; an empty result means nothing worth surfacing
    fn evaluate(&self, window: &InsightWindow<'_>) -> Vec<Insight>;
}

/// Meltdowns on days that started with a short night
#[derive(Debug, Clone, Copy)]
pub struct SleepImpactRule {
    bad_sleep_minutes: f64,
}

impl Default for SleepImpactRule {
    fn default() -> Self {
        Self::new(DEFAULT_BAD_SLEEP_MINUTES)
    }
}

impl SleepImpactRule {
    pub fn new(bad_sleep_minutes: f64) -> Self {
        Self { bad_sleep_minutes }
    }

    /// Start dates of completed sessions shorter than the threshold
    fn bad_sleep_days(&self, sleeps: &[SleepRecord]) -> HashSet<NaiveDate> {
        sleeps
            .iter()
            .filter(|s| {
                s.duration_minutes()
                    .is_some_and(|minutes| minutes < self.bad_sleep_minutes)
            })
            .map(|s| s.start_time.date_naive())
            .collect()
    }
}

impl InsightRule for SleepImpactRule {
    fn name(&self) -> &'static str {
        "sleep_impact"
    }

    fn evaluate(&self, window: &InsightWindow<'_>) -> Vec<Insight> {
        let bad_days = self.bad_sleep_days(window.sleeps);
        if bad_days.is_empty() {
            return Vec::new();
        }

        let meltdowns = window
            .behaviors
            .iter()
            .filter(|b| b.is_meltdown() && bad_days.contains(&b.timestamp.date_naive()))
            .count();

        if meltdowns == 0 {
            return Vec::new();
        }

        vec![Insight {
            insight_type: InsightType::Correlation,
            title: "Sleep Impact".to_string(),
            description: format!(
                "Detected {meltdowns} meltdowns following nights with poor sleep."
            ),
            confidence: Confidence::High,
            actionable_tip: Some("Prioritize earlier bedtime tonight.".to_string()),
        }]
    }
}

/// Runs a set of insight rules in order
pub struct InsightGenerator {
    rules: Vec<Box<dyn InsightRule>>,
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_BAD_SLEEP_MINUTES)
    }
}

impl InsightGenerator {
    /// Generator with the built-in rules
    pub fn new(bad_sleep_minutes: f64) -> Self {
        Self::with_rules(vec![Box::new(SleepImpactRule::new(bad_sleep_minutes))])
    }

    /// Generator with an explicit rule set
    pub fn with_rules(rules: Vec<Box<dyn InsightRule>>) -> Self {
        Self { rules }
    }

    /// Append a rule; it runs after the existing ones
    pub fn push_rule(&mut self, rule: Box<dyn InsightRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluate every rule and concatenate their findings
    pub fn generate(&self, window: &InsightWindow<'_>) -> Vec<Insight> {
        self.rules
            .iter()
            .flat_map(|rule| {
                let found = rule.evaluate(window);
                log::debug!("insight rule {}: {} finding(s)", rule.name(), found.len());
                found
            })
            .collect()
    }
}

impl std::fmt::Debug for InsightGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightGenerator")
            .field("rules", &self.rule_names())
            .finish()
    }
}
