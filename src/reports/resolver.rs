use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::time;

use crate::aggregation::{self, AggregationConfig};
use crate::collaborators::{IncidentStore, StudentDirectory};
use crate::error::{CollaboratorFailure, NotFoundError, ReportError};
use crate::models::{
    DashboardSnapshot, DateRange, IncidentRecord, ReportPreview, ReportType, Student,
};

use super::recommendations::recommend;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_DASHBOARD_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub aggregation: AggregationConfig,
    /// Upper bound for each persistence or metadata call.
    pub collaborator_timeout: Duration,
    pub dashboard_window_days: i64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationConfig::default(),
            collaborator_timeout: DEFAULT_COLLABORATOR_TIMEOUT,
            dashboard_window_days: DEFAULT_DASHBOARD_WINDOW_DAYS,
        }
    }
}

pub fn resolve_range(report_type: ReportType, now: DateTime<Utc>) -> DateRange {
    DateRange::trailing_days(now, report_type.lookback_days())
}

/// Builds a preview from already-fetched inputs.
///
/// Depends only on its arguments, so a previewed report and an exported one
/// built from the same snapshot show the same numbers. Records for other
/// students or outside the resolved range are ignored.
pub fn assemble_preview(
    report_type: ReportType,
    now: DateTime<Utc>,
    student: Student,
    incidents: &[IncidentRecord],
    config: &AggregationConfig,
) -> ReportPreview {
    let date_range = resolve_range(report_type, now);
    let in_range: Vec<IncidentRecord> = incidents
        .iter()
        .filter(|r| r.student_id == student.id && date_range.contains(r.observed_at))
        .cloned()
        .collect();

    let aggregate = aggregation::aggregate(&in_range, config);
    let recommendations = recommend(&aggregate.summary);

    ReportPreview {
        student,
        report_type,
        date_range,
        summary: aggregate.summary,
        behavior_frequency: aggregate.behavior_frequency,
        recent_logs: aggregate.recent_logs,
        recommendations,
    }
}

/// Resolves report requests against the persistence and student-metadata
/// collaborators.
pub struct ReportResolver<S, D> {
    incidents: S,
    students: D,
    config: ReportConfig,
}

impl<S: IncidentStore, D: StudentDirectory> ReportResolver<S, D> {
    pub fn new(incidents: S, students: D, config: ReportConfig) -> Self {
        Self {
            incidents,
            students,
            config,
        }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Report preview for `student_id` over the window `report_type` names,
    /// anchored at `now`. The report type is checked before any collaborator
    /// is called.
    pub async fn preview(
        &self,
        student_id: &str,
        report_type: &str,
        now: DateTime<Utc>,
    ) -> Result<ReportPreview, ReportError> {
        let report_type: ReportType = report_type.parse()?;
        let student = self.fetch_student(student_id).await?;
        let range = resolve_range(report_type, now);
        let incidents = self.fetch_incidents(student_id, range).await?;

        let preview = assemble_preview(
            report_type,
            now,
            student,
            &incidents,
            &self.config.aggregation,
        );
        log_info!(
            "{} preview for student {}: {} incidents",
            report_type,
            student_id,
            preview.summary.total_incidents
        );
        Ok(preview)
    }

    /// Dashboard distributions over the trailing dashboard window.
    pub async fn dashboard(
        &self,
        student_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DashboardSnapshot, ReportError> {
        let student = self.fetch_student(student_id).await?;
        let range = DateRange::trailing_days(now, self.config.dashboard_window_days);
        let incidents: Vec<IncidentRecord> = self
            .fetch_incidents(&student.id, range)
            .await?
            .into_iter()
            .filter(|r| r.student_id == student.id && range.contains(r.observed_at))
            .collect();

        Ok(aggregation::dashboard(&student.id, range, &incidents))
    }

    async fn fetch_student(&self, student_id: &str) -> Result<Student, ReportError> {
        let lookup = self.students.get_student(student_id);
        match self.bounded("student metadata", lookup).await? {
            Ok(Some(student)) => Ok(student),
            Ok(None) => Err(NotFoundError::StudentNotFound(student_id.to_string()).into()),
            Err(err) => {
                log_warn!("student lookup failed for {student_id}: {err:#}");
                Err(CollaboratorFailure::Metadata(err).into())
            }
        }
    }

    async fn fetch_incidents(
        &self,
        student_id: &str,
        range: DateRange,
    ) -> Result<Vec<IncidentRecord>, ReportError> {
        let query = self.incidents.list_incidents(student_id, range);
        match self.bounded("persistence", query).await? {
            Ok(incidents) => Ok(incidents),
            Err(err) => {
                log_warn!("incident query failed for {student_id}: {err:#}");
                Err(CollaboratorFailure::Persistence(err).into())
            }
        }
    }

    async fn bounded<T>(
        &self,
        collaborator: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<Result<T>, CollaboratorFailure> {
        let after = self.config.collaborator_timeout;
        time::timeout(after, call).await.map_err(|_| {
            log_warn!("{collaborator} call timed out after {after:?}");
            CollaboratorFailure::Timeout {
                collaborator,
                after,
            }
        })
    }
}
