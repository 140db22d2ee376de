use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{DashboardSnapshot, DateRange, IncidentRecord, SettingEvent};

use super::summary::behavior_frequency;

/// Per-day incident weight, keyed by the UTC calendar day of `observed_at`.
/// A record with a recorded frequency contributes that count; otherwise 1.
pub fn daily_frequency(records: &[IncidentRecord]) -> BTreeMap<NaiveDate, u64> {
    let mut days = BTreeMap::new();
    for record in records {
        let weight = match record.metrics.frequency {
            0 => 1,
            n => u64::from(n),
        };
        *days.entry(record.observed_at.date_naive()).or_insert(0) += weight;
    }
    days
}

pub fn setting_event_frequency(records: &[IncidentRecord]) -> BTreeMap<SettingEvent, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        for event in &record.setting_events {
            *counts.entry(*event).or_insert(0) += 1;
        }
    }
    counts
}

pub fn intensity_distribution(records: &[IncidentRecord]) -> BTreeMap<u8, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.metrics.intensity).or_insert(0) += 1;
    }
    counts
}

pub fn dashboard(student_id: &str, range: DateRange, records: &[IncidentRecord]) -> DashboardSnapshot {
    DashboardSnapshot {
        student_id: student_id.to_string(),
        date_range: range,
        total_incidents: records.len(),
        daily_frequency: daily_frequency(records),
        setting_event_frequency: setting_event_frequency(records),
        behavior_frequency: behavior_frequency(records),
        intensity_distribution: intensity_distribution(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetBehavior;
    use crate::test_support::incident;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_daily_frequency_weights_by_recorded_frequency() {
        let morning = Utc.with_ymd_and_hms(2024, 3, 11, 8, 0, 0).unwrap();
        let mut burst = incident("a", morning, 5.0, 2, &[TargetBehavior::Disruption]);
        burst.metrics.frequency = 4;
        let mut unset = incident("b", morning + Duration::hours(3), 5.0, 2, &[TargetBehavior::Disruption]);
        unset.metrics.frequency = 0;
        let next_day = incident("c", morning + Duration::days(1), 5.0, 5, &[TargetBehavior::Other]);

        let days = daily_frequency(&[burst, unset, next_day]);
        assert_eq!(days.get(&NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()), Some(&5));
        assert_eq!(days.get(&NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()), Some(&1));
    }

    #[test]
    fn test_dashboard_distributions() {
        let at = Utc.with_ymd_and_hms(2024, 3, 11, 8, 0, 0).unwrap();
        let mut first = incident("a", at, 5.0, 2, &[TargetBehavior::Aggression]);
        first.setting_events.insert(SettingEvent::LackOfSleep);
        first.setting_events.insert(SettingEvent::PeerInteraction);
        let mut second = incident("b", at, 5.0, 2, &[TargetBehavior::Aggression]);
        second.setting_events.insert(SettingEvent::LackOfSleep);
        let third = incident("c", at, 5.0, 5, &[TargetBehavior::Elopement]);

        let range = DateRange::trailing_days(at, 30);
        let snapshot = dashboard("S1", range, &[first, second, third]);

        assert_eq!(snapshot.total_incidents, 3);
        assert_eq!(snapshot.setting_event_frequency[&SettingEvent::LackOfSleep], 2);
        assert_eq!(snapshot.setting_event_frequency[&SettingEvent::PeerInteraction], 1);
        assert_eq!(snapshot.behavior_frequency[&TargetBehavior::Aggression], 2);
        assert_eq!(snapshot.intensity_distribution[&2], 2);
        assert_eq!(snapshot.intensity_distribution[&5], 1);
        assert!(!snapshot.intensity_distribution.contains_key(&1));
    }
}
