use std::collections::BTreeMap;

use crate::models::{IncidentRecord, ReportSummary, TargetBehavior};

use super::config::AggregationConfig;

/// Everything a report preview derives from its incident set.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentAggregate {
    pub summary: ReportSummary,
    pub behavior_frequency: BTreeMap<TargetBehavior, usize>,
    pub recent_logs: Vec<IncidentRecord>,
}

/// Neumaier-compensated running sum.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    pub fn add(&mut self, value: f64) {
        let total = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - total) + value;
        } else {
            self.compensation += (value - total) + self.sum;
        }
        self.sum = total;
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Sums in ascending order so the result is bit-identical for any permutation
/// of `values`.
pub fn order_independent_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.into_iter().collect();
    values.sort_by(f64::total_cmp);

    let mut sum = CompensatedSum::default();
    for value in values {
        sum.add(value);
    }
    sum.value()
}

pub fn summarize(records: &[IncidentRecord]) -> ReportSummary {
    let total_incidents = records.len();
    if total_incidents == 0 {
        return ReportSummary::default();
    }

    let total_duration = order_independent_sum(records.iter().map(|r| r.duration_secs()));
    let intensity_total: u64 = records.iter().map(|r| u64::from(r.intensity())).sum();
    let count = total_incidents as f64;

    ReportSummary {
        total_incidents,
        total_duration,
        average_duration: total_duration / count,
        average_intensity: intensity_total as f64 / count,
    }
}

/// Number of records containing each target behavior. A record counts at most
/// once per tag.
pub fn behavior_frequency(records: &[IncidentRecord]) -> BTreeMap<TargetBehavior, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        for behavior in &record.target_behaviors {
            *counts.entry(*behavior).or_insert(0) += 1;
        }
    }
    counts
}

/// Newest first by `observed_at`; equal timestamps keep their input order.
pub fn recent_logs(records: &[IncidentRecord], limit: usize) -> Vec<IncidentRecord> {
    let mut ordered: Vec<&IncidentRecord> = records.iter().collect();
    ordered.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));
    ordered.into_iter().take(limit).cloned().collect()
}

pub fn aggregate(records: &[IncidentRecord], config: &AggregationConfig) -> IncidentAggregate {
    IncidentAggregate {
        summary: summarize(records),
        behavior_frequency: behavior_frequency(records),
        recent_logs: recent_logs(records, config.recent_logs_limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::incident;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_input_is_all_zero() {
        let aggregate = aggregate(&[], &AggregationConfig::default());
        assert_eq!(aggregate.summary, ReportSummary::default());
        assert_eq!(aggregate.summary.total_incidents, 0);
        assert_eq!(aggregate.summary.average_duration, 0.0);
        assert_eq!(aggregate.summary.average_intensity, 0.0);
        assert!(aggregate.behavior_frequency.is_empty());
        assert!(aggregate.recent_logs.is_empty());
    }

    #[test]
    fn test_three_incident_summary() {
        let base = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let records = vec![
            incident("a", base, 10.0, 2, &[TargetBehavior::Aggression]),
            incident("b", base + Duration::hours(1), 20.0, 4, &[TargetBehavior::Aggression]),
            incident("c", base + Duration::hours(2), 30.0, 3, &[TargetBehavior::Disruption]),
        ];

        let summary = summarize(&records);
        assert_eq!(
            summary,
            ReportSummary {
                total_incidents: 3,
                total_duration: 60.0,
                average_duration: 20.0,
                average_intensity: 3.0,
            }
        );
    }

    #[test]
    fn test_behavior_frequency_counts_records_not_tags() {
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let records = vec![
            incident("a", at, 5.0, 1, &[TargetBehavior::Aggression]),
            incident(
                "b",
                at,
                5.0,
                1,
                &[
                    TargetBehavior::Aggression,
                    TargetBehavior::Elopement,
                    TargetBehavior::Aggression,
                ],
            ),
        ];

        let expected: BTreeMap<TargetBehavior, usize> =
            [(TargetBehavior::Aggression, 2), (TargetBehavior::Elopement, 1)].into();
        assert_eq!(behavior_frequency(&records), expected);
    }

    #[test]
    fn test_summary_is_permutation_invariant() {
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let durations = [0.1, 1e9, 0.2, 3.3, 1e-7, 17.25, 0.3];
        let records: Vec<_> = durations
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let tags: &[TargetBehavior] = if i % 2 == 0 {
                    &[TargetBehavior::Aggression]
                } else {
                    &[TargetBehavior::Elopement, TargetBehavior::Tantrum]
                };
                incident(&i.to_string(), at, *d, (i % 5 + 1) as u8, tags)
            })
            .collect();

        let reference = aggregate(&records, &AggregationConfig::default());
        let mut reversed = records.clone();
        reversed.reverse();
        let mut rotated = records.clone();
        rotated.rotate_left(3);

        for permuted in [reversed, rotated] {
            let other = aggregate(&permuted, &AggregationConfig::default());
            assert_eq!(other.summary, reference.summary);
            assert_eq!(other.behavior_frequency, reference.behavior_frequency);
        }
    }

    #[test]
    fn test_compensated_sum_keeps_small_terms() {
        let values = [1e16, 1.0, -1e16, 1.0];
        assert_eq!(order_independent_sum(values), 2.0);
    }

    #[test]
    fn test_recent_logs_newest_first_with_stable_ties() {
        let base = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();
        let later = base + Duration::minutes(30);
        let records = vec![
            incident("old", base, 1.0, 1, &[TargetBehavior::Other]),
            incident("tie-1", later, 1.0, 1, &[TargetBehavior::Other]),
            incident("tie-2", later, 1.0, 1, &[TargetBehavior::Other]),
            incident("newest", later + Duration::seconds(1), 1.0, 1, &[TargetBehavior::Other]),
        ];

        let ids: Vec<_> = recent_logs(&records, 20).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["newest", "tie-1", "tie-2", "old"]);

        let bounded: Vec<_> = recent_logs(&records, 2).into_iter().map(|r| r.id).collect();
        assert_eq!(bounded, vec!["newest", "tie-1"]);
    }
}
