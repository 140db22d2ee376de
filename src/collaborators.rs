//! Contracts for the I/O collaborators the core talks to.
//!
//! Implementations report infrastructure failures as `anyhow::Error`; the core
//! wraps them as `CollaboratorFailure` and never retries on its own.
//! [`crate::db::Database`] implements both traits on SQLite.

use std::future::Future;

use anyhow::Result;

use crate::models::{DateRange, IncidentRecord, Student};

pub trait IncidentStore: Send + Sync {
    /// Records for one student whose `observed_at` falls inside the inclusive range.
    fn list_incidents(
        &self,
        student_id: &str,
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<IncidentRecord>>> + Send;

    fn save_incident(&self, record: &IncidentRecord) -> impl Future<Output = Result<()>> + Send;
}

pub trait StudentDirectory: Send + Sync {
    /// `Ok(None)` means the lookup succeeded and the student does not exist.
    fn get_student(&self, student_id: &str) -> impl Future<Output = Result<Option<Student>>> + Send;
}
