//! Fixtures shared by unit tests.

use chrono::{DateTime, Utc};

use crate::models::{BehaviorMetrics, IncidentRecord, Student, TargetBehavior};

pub fn incident(
    id: &str,
    observed_at: DateTime<Utc>,
    duration_secs: f64,
    intensity: u8,
    behaviors: &[TargetBehavior],
) -> IncidentRecord {
    IncidentRecord {
        id: id.to_string(),
        student_id: "S1".into(),
        observer_id: "observer123".into(),
        observer_name: None,
        session_id: None,
        observed_at,
        recorded_at: observed_at,
        setting_events: Default::default(),
        antecedent: None,
        target_behaviors: behaviors.iter().copied().collect(),
        replacement_behaviors: Default::default(),
        consequences: Default::default(),
        metrics: BehaviorMetrics {
            frequency: 1,
            duration_secs,
            latency_secs: None,
            intensity,
            independent_breaks: 0,
        },
        reinforcer: None,
        hypothesis: None,
    }
}

pub fn student(id: &str) -> Student {
    Student {
        id: id.to_string(),
        first_name: "Jordan".into(),
        last_name: "Lee".into(),
        grade: Some("4".into()),
        campus_id: Some("Elementary".into()),
    }
}
