//! ABC (antecedent/behavior/consequence) aggregation
//!
//! Tallies antecedents ("triggers") and interventions over a window of
//! incidents. Buckets are keyed by the exact label text: "Transition" and
//! "transition" are separate triggers.

use crate::config::DEFAULT_ABC_TOP_N;
use crate::types::{AbcAnalysis, AbcStat, BehaviorIncident};
use crate::window::round_tenth;
use std::collections::HashMap;

/// Aggregator for ABC frequencies
#[derive(Debug, Clone, Copy)]
pub struct AbcAggregator {
    top_n: usize,
}

impl Default for AbcAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_ABC_TOP_N)
    }
}

impl AbcAggregator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Rank triggers and interventions across `behaviors`.
    ///
    /// Percentages are relative to all incidents, including those without
    /// analysis, so they can sum to less than 100.
    pub fn aggregate(&self, behaviors: &[BehaviorIncident]) -> AbcAnalysis {
        let total = behaviors.len() as u32;
        if total == 0 {
            return AbcAnalysis::default();
        }

        let mut triggers = FrequencyTally::default();
        let mut interventions = FrequencyTally::default();

        for analysis in behaviors.iter().filter_map(BehaviorIncident::analysis) {
            if let Some(antecedent) = analysis.antecedent.filter(|s| !s.is_empty()) {
                triggers.add(antecedent);
            }
            if let Some(intervention) = analysis.intervention.filter(|s| !s.is_empty()) {
                interventions.add(intervention);
            }
        }

        log::debug!(
            "abc: {total} incidents, {} trigger buckets, {} intervention buckets",
            triggers.len(),
            interventions.len()
        );

        AbcAnalysis {
            top_triggers: triggers.ranked(self.top_n, total),
            effective_interventions: interventions.ranked(self.top_n, total),
            total_incidents: total,
        }
    }
}

/// Label counts that remember first-seen order, so equal counts rank stably
#[derive(Debug, Default)]
struct FrequencyTally {
    counts: Vec<(String, u32)>,
    index: HashMap<String, usize>,
}

impl FrequencyTally {
    fn add(&mut self, label: String) {
        match self.index.get(&label) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(label.clone(), self.counts.len());
                self.counts.push((label, 1));
            }
        }
    }

    fn len(&self) -> usize {
        self.counts.len()
    }

    fn ranked(mut self, top_n: usize, total: u32) -> Vec<AbcStat> {
        // sort_by is stable: ties keep first-seen order
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts
            .into_iter()
            .take(top_n)
            .map(|(label, count)| AbcStat {
                label,
                count,
                percentage: round_tenth(count as f64 / total as f64 * 100.0),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::{json, Value};

    fn incident(analysis: Option<Value>) -> BehaviorIncident {
        BehaviorIncident {
            id: 1,
            child_id: "child-1".to_string(),
            behavior_type: "meltdown".to_string(),
            mood_rating: None,
            incident_description: None,
            notes: None,
            timestamp: DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z").unwrap(),
            analysis,
        }
    }

    fn abc(antecedent: &str, intervention: &str) -> BehaviorIncident {
        incident(Some(json!({"antecedent": antecedent, "intervention": intervention})))
    }

    #[test]
    fn test_empty_week() {
        let analysis = AbcAggregator::default().aggregate(&[]);
        assert!(analysis.top_triggers.is_empty());
        assert!(analysis.effective_interventions.is_empty());
        assert_eq!(analysis.total_incidents, 0);
    }

    #[test]
    fn test_ranks_by_count() {
        let behaviors = vec![
            abc("Transition", "Visual schedule"),
            abc("Noise", "Headphones"),
            abc("Transition", "Visual schedule"),
            abc("Transition", "Deep pressure"),
        ];

        let analysis = AbcAggregator::default().aggregate(&behaviors);
        assert_eq!(analysis.total_incidents, 4);

        let triggers: Vec<(&str, u32, f64)> = analysis
            .top_triggers
            .iter()
            .map(|s| (s.label.as_str(), s.count, s.percentage))
            .collect();
        assert_eq!(triggers, vec![("Transition", 3, 75.0), ("Noise", 1, 25.0)]);

        assert_eq!(analysis.effective_interventions[0].label, "Visual schedule");
        assert_eq!(analysis.effective_interventions[0].count, 2);
    }

    #[test]
    fn test_percentage_uses_all_incidents() {
        let behaviors = vec![
            abc("Transition", "Hug"),
            incident(None),
            incident(Some(json!({"consequence": "Removed"}))),
        ];

        let analysis = AbcAggregator::default().aggregate(&behaviors);
        assert_eq!(analysis.total_incidents, 3);
        assert_eq!(analysis.top_triggers[0].percentage, 33.3);
        assert_eq!(analysis.effective_interventions[0].percentage, 33.3);
    }

    #[test]
    fn test_percentage_rounds_half_to_even() {
        let mut behaviors = vec![abc("Noise", "Headphones")];
        behaviors.extend((0..15).map(|_| incident(None)));

        let analysis = AbcAggregator::default().aggregate(&behaviors);
        assert_eq!(analysis.total_incidents, 16);
        // 1 / 16 = 6.25%
        assert_eq!(analysis.top_triggers[0].percentage, 6.2);
        assert_eq!(analysis.effective_interventions[0].percentage, 6.2);
    }

    #[test]
    fn test_exact_label_buckets() {
        let behaviors = vec![
            abc("Transition", "Hug"),
            abc("transition", "Hug"),
            abc("Transition ", "Hug"),
        ];

        let analysis = AbcAggregator::default().aggregate(&behaviors);
        assert_eq!(analysis.top_triggers.len(), 3);
        assert!(analysis.top_triggers.iter().all(|s| s.count == 1));
    }

    #[test]
    fn test_top_n_and_stable_ties() {
        let labels = ["A", "B", "C", "D", "E", "F", "G"];
        let mut behaviors: Vec<BehaviorIncident> =
            labels.iter().map(|l| abc(l, "Hug")).collect();
        behaviors.push(abc("G", "Hug"));

        let analysis = AbcAggregator::default().aggregate(&behaviors);
        let ranked: Vec<&str> = analysis.top_triggers.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(ranked, vec!["G", "A", "B", "C", "D"]);

        let narrow = AbcAggregator::new(2).aggregate(&behaviors);
        assert_eq!(narrow.top_triggers.len(), 2);
    }

    #[test]
    fn test_skips_malformed_and_empty_labels() {
        let behaviors = vec![
            incident(Some(json!({"antecedent": {"text": "Noise"}, "intervention": "Hug"}))),
            incident(Some(json!({"antecedent": "", "intervention": null}))),
            incident(Some(json!("Noise"))),
        ];

        let analysis = AbcAggregator::default().aggregate(&behaviors);
        assert!(analysis.top_triggers.is_empty());
        assert_eq!(analysis.effective_interventions.len(), 1);
        assert_eq!(analysis.effective_interventions[0].percentage, 33.3);
    }
}
