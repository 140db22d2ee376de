use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::collaborators::IncidentStore;
use crate::error::{CaptureError, CollaboratorFailure, UsageError};
use crate::models::IncidentRecord;
use crate::timer::{TimerController, TimerOutput, TimerStatus};

use super::builder::{build, IncidentDraft};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// One open data-entry session for one student.
///
/// The session owns its interval timer and remembers when its last committed
/// incident stopped, which becomes the latency reference for the next one.
pub struct CaptureSession {
    id: String,
    student_id: String,
    timer: TimerController,
    previous_stop: Option<DateTime<Utc>>,
}

impl CaptureSession {
    /// `previous_stop` seeds latency for the first incident; pass `None` when
    /// no earlier stop time is known.
    pub fn open(
        student_id: impl Into<String>,
        previous_stop: Option<DateTime<Utc>>,
        sample_interval: Duration,
    ) -> Self {
        let session = Self {
            id: Uuid::new_v4().to_string(),
            student_id: student_id.into(),
            timer: TimerController::with_sample_interval(sample_interval),
            previous_stop,
        };
        log_info!(
            "capture session {} opened for student {}",
            session.id,
            session.student_id
        );
        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn previous_stop(&self) -> Option<DateTime<Utc>> {
        self.previous_stop
    }

    pub fn timer(&self) -> &TimerController {
        &self.timer
    }

    /// Starts timing a new incident. Fails while a stopped incident has not
    /// been submitted or abandoned; a second call while running is a no-op.
    pub async fn begin_incident(&mut self) -> Result<(), UsageError> {
        match self.timer.status().await {
            TimerStatus::Stopped => Err(UsageError::UncommittedIncident),
            TimerStatus::Running => Ok(()),
            TimerStatus::Idle => {
                self.timer.start().await;
                Ok(())
            }
        }
    }

    pub async fn end_incident(&mut self) -> Result<TimerOutput, UsageError> {
        self.timer.stop(self.previous_stop).await
    }

    /// Builds a record from `draft` and the stopped timer (if it was used) and
    /// hands it to `store`.
    ///
    /// On success the timer is reset and its stop time becomes the next
    /// latency reference. On any failure the timer keeps its measurement so
    /// the observer can correct the form and submit again.
    pub async fn submit<S: IncidentStore>(
        &mut self,
        draft: &IncidentDraft,
        store: &S,
    ) -> Result<IncidentRecord, CaptureError> {
        let timer_output = match self.timer.status().await {
            TimerStatus::Running => return Err(UsageError::StillRunning.into()),
            TimerStatus::Stopped => self.timer.output().await,
            TimerStatus::Idle => None,
        };

        let fields = draft
            .clone()
            .student(self.student_id.clone())
            .session(self.id.clone());
        let record = build(&fields, timer_output.as_ref())?;

        if let Err(err) = store.save_incident(&record).await {
            log_error!("failed to save incident for session {}: {err:#}", self.id);
            return Err(CollaboratorFailure::Persistence(err).into());
        }

        if let Some(output) = timer_output {
            self.previous_stop = Some(output.stopped_at);
        }
        self.timer.reset().await;

        log_info!(
            "incident {} saved for student {} (session {})",
            record.id,
            record.student_id,
            self.id
        );
        Ok(record)
    }

    /// Discards any running or stopped measurement.
    pub async fn abandon(&mut self) {
        self.timer.reset().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::models::{DateRange, TargetBehavior};
    use anyhow::{anyhow, Result};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<IncidentRecord>>,
        fail: bool,
    }

    impl IncidentStore for RecordingStore {
        async fn list_incidents(
            &self,
            student_id: &str,
            range: DateRange,
        ) -> Result<Vec<IncidentRecord>> {
            let saved = self.saved.lock().unwrap();
            Ok(saved
                .iter()
                .filter(|r| r.student_id == student_id && range.contains(r.observed_at))
                .cloned()
                .collect())
        }

        async fn save_incident(&self, record: &IncidentRecord) -> Result<()> {
            if self.fail {
                return Err(anyhow!("disk full"));
            }
            self.saved.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn session() -> CaptureSession {
        CaptureSession::open("S1", None, Duration::from_millis(100))
    }

    fn draft() -> IncidentDraft {
        IncidentDraft::new()
            .observer("observer123")
            .target_behavior(TargetBehavior::Tantrum, true)
            .intensity(2)
    }

    #[tokio::test]
    async fn test_timed_incident_is_saved_and_timer_reset() {
        let store = RecordingStore::default();
        let mut session = session();

        session.begin_incident().await.unwrap();
        let output = session.end_incident().await.unwrap();
        let record = session.submit(&draft(), &store).await.unwrap();

        assert_eq!(record.student_id, "S1");
        assert_eq!(record.session_id.as_deref(), Some(session.id()));
        assert_eq!(record.metrics.duration_secs, output.duration_secs);
        assert_eq!(record.metrics.latency_secs, None);
        assert_eq!(record.observed_at, output.started_at);
        assert_eq!(store.saved.lock().unwrap().len(), 1);
        assert_eq!(session.timer().status().await, TimerStatus::Idle);
        assert_eq!(session.previous_stop(), Some(output.stopped_at));
    }

    #[tokio::test]
    async fn test_second_incident_gets_latency_from_first_stop() {
        let store = RecordingStore::default();
        let mut session = session();

        session.begin_incident().await.unwrap();
        let first = session.end_incident().await.unwrap();
        session.submit(&draft(), &store).await.unwrap();

        session.begin_incident().await.unwrap();
        let second = session.end_incident().await.unwrap();
        let record = session.submit(&draft(), &store).await.unwrap();

        let latency = record.metrics.latency_secs.unwrap();
        assert!(latency >= 0.0);
        assert!(second.stopped_at >= first.stopped_at);
    }

    #[tokio::test]
    async fn test_begin_while_stopped_is_usage_error() {
        let mut session = session();
        session.begin_incident().await.unwrap();
        session.end_incident().await.unwrap();

        assert_eq!(
            session.begin_incident().await,
            Err(UsageError::UncommittedIncident)
        );

        session.abandon().await;
        assert!(session.begin_incident().await.is_ok());
        session.abandon().await;
    }

    #[tokio::test]
    async fn test_submit_while_running_is_usage_error() {
        let store = RecordingStore::default();
        let mut session = session();
        session.begin_incident().await.unwrap();

        let err = session.submit(&draft(), &store).await.unwrap_err();
        assert!(matches!(err, CaptureError::Usage(UsageError::StillRunning)));
        assert!(store.saved.lock().unwrap().is_empty());
        session.abandon().await;
    }

    #[tokio::test]
    async fn test_validation_failure_keeps_measurement() {
        let store = RecordingStore::default();
        let mut session = session();
        session.begin_incident().await.unwrap();
        let output = session.end_incident().await.unwrap();

        let bad = draft().target_behavior(TargetBehavior::Tantrum, false);
        let err = session.submit(&bad, &store).await.unwrap_err();
        assert!(matches!(
            err,
            CaptureError::Validation(ValidationError::MissingTargetBehavior)
        ));
        assert_eq!(session.timer().output().await, Some(output));
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_is_propagated() {
        let store = RecordingStore {
            fail: true,
            ..RecordingStore::default()
        };
        let mut session = session();
        session.begin_incident().await.unwrap();
        session.end_incident().await.unwrap();

        let err = session.submit(&draft(), &store).await.unwrap_err();
        match err {
            CaptureError::Collaborator(CollaboratorFailure::Persistence(inner)) => {
                assert_eq!(inner.to_string(), "disk full");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.timer().status().await, TimerStatus::Stopped);
        assert_eq!(session.previous_stop(), None);
    }

    #[tokio::test]
    async fn test_manual_entry_without_timer() {
        let store = RecordingStore::default();
        let mut session = session();
        let manual = draft().duration_secs(30.0).observed_at(Utc::now());

        let record = session.submit(&manual, &store).await.unwrap();
        assert_eq!(record.metrics.duration_secs, 30.0);
        assert_eq!(record.metrics.latency_secs, None);
        assert_eq!(session.previous_stop(), None);
    }
}
