//! Error taxonomy for capture and reporting.
//!
//! Every kind is recoverable and returned as a value. Infrastructure code keeps
//! using `anyhow`; its errors enter this taxonomy as `CollaboratorFailure`.

use std::time::Duration;

use thiserror::Error;

/// Malformed incident input, reported with the offending field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("at least one target behavior is required")]
    MissingTargetBehavior,

    #[error("intensity {0} is outside the 1-5 scale")]
    InvalidIntensity(i32),

    #[error("duration {0}s must be a non-negative number of seconds")]
    NegativeDuration(f64),

    #[error("student id is required")]
    MissingStudent,

    #[error("observer id is required")]
    MissingObserver,

    #[error("observation time is required")]
    MissingObservedAt,
}

/// Interval timer or capture session driven out of sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("timer is not running")]
    NotRunning,

    #[error("timer is still running; stop it before submitting")]
    StillRunning,

    #[error("a stopped incident is waiting to be submitted or reset")]
    UncommittedIncident,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("unknown report type '{0}'")]
    UnknownReportType(String),

    #[error("student '{0}' not found")]
    StudentNotFound(String),
}

/// A persistence or metadata call failed or did not answer in time.
#[derive(Debug, Error)]
pub enum CollaboratorFailure {
    #[error("persistence call failed: {0:#}")]
    Persistence(#[source] anyhow::Error),

    #[error("student metadata call failed: {0:#}")]
    Metadata(#[source] anyhow::Error),

    #[error("{collaborator} call timed out after {after:?}")]
    Timeout {
        collaborator: &'static str,
        after: Duration,
    },
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorFailure),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorFailure),
}
