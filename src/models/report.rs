//! Report-side data models. Everything here is derived on request and never stored.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NotFoundError;

use super::{IncidentRecord, SettingEvent, Student, TargetBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Weekly,
    NineWeek,
    Semester,
}

impl ReportType {
    pub const ALL: [ReportType; 3] = [ReportType::Weekly, ReportType::NineWeek, ReportType::Semester];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Weekly => "weekly",
            ReportType::NineWeek => "nine_week",
            ReportType::Semester => "semester",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportType::Weekly => "Weekly Report",
            ReportType::NineWeek => "9-Week Report",
            ReportType::Semester => "Semester Report",
        }
    }

    /// Length of the trailing window ending at "now". A semester is taken as 18 weeks.
    pub fn lookback_days(&self) -> i64 {
        match self {
            ReportType::Weekly => 7,
            ReportType::NineWeek => 63,
            ReportType::Semester => 126,
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = NotFoundError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "weekly" => Ok(ReportType::Weekly),
            "nine_week" => Ok(ReportType::NineWeek),
            "semester" => Ok(ReportType::Semester),
            other => Err(NotFoundError::UnknownReportType(other.to_string())),
        }
    }
}

/// One entry of the report-type catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTypeOption {
    pub value: String,
    pub label: String,
}

/// Inclusive `[start, end]` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `[end - days, end]`. A window reaching past the earliest representable
    /// instant starts there instead.
    pub fn trailing_days(end: DateTime<Utc>, days: i64) -> Self {
        let start = Duration::try_days(days.max(0))
            .and_then(|span| end.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_incidents: usize,
    pub total_duration: f64,
    pub average_duration: f64,
    pub average_intensity: f64,
}

impl Default for ReportSummary {
    fn default() -> Self {
        Self {
            total_incidents: 0,
            total_duration: 0.0,
            average_duration: 0.0,
            average_intensity: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    ReviewInterventionStrategies,
    FunctionalBehaviorAssessment,
    DeescalationTechniques,
    ContinueMonitoring,
    UpdateBehaviorPlan,
}

impl Recommendation {
    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::ReviewInterventionStrategies => {
                "High intensity behaviors observed. Consider reviewing intervention strategies."
            }
            Recommendation::FunctionalBehaviorAssessment => {
                "Frequent incidents noted. Recommend functional behavior assessment."
            }
            Recommendation::DeescalationTechniques => {
                "Long duration behaviors observed. Consider de-escalation techniques."
            }
            Recommendation::ContinueMonitoring => {
                "Continue monitoring and data collection for trend analysis."
            }
            Recommendation::UpdateBehaviorPlan => {
                "Review and update behavior intervention plan as needed."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPreview {
    pub student: Student,
    pub report_type: ReportType,
    pub date_range: DateRange,
    pub summary: ReportSummary,
    pub behavior_frequency: BTreeMap<TargetBehavior, usize>,
    pub recent_logs: Vec<IncidentRecord>,
    pub recommendations: Vec<Recommendation>,
}

/// Distributions shown on the per-student dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub student_id: String,
    pub date_range: DateRange,
    pub total_incidents: usize,
    pub daily_frequency: BTreeMap<NaiveDate, u64>,
    pub setting_event_frequency: BTreeMap<SettingEvent, usize>,
    pub behavior_frequency: BTreeMap<TargetBehavior, usize>,
    pub intensity_distribution: BTreeMap<u8, usize>,
}
