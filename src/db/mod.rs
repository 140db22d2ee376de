mod connection;
mod helpers;
mod migrations;
mod repositories;

pub use connection::Database;

use anyhow::Result;

use crate::collaborators::{IncidentStore, StudentDirectory};
use crate::models::{DateRange, IncidentRecord, Student};

impl IncidentStore for Database {
    async fn list_incidents(
        &self,
        student_id: &str,
        range: DateRange,
    ) -> Result<Vec<IncidentRecord>> {
        self.list_incidents_in_range(student_id, range).await
    }

    async fn save_incident(&self, record: &IncidentRecord) -> Result<()> {
        self.insert_incident(record).await
    }
}

impl StudentDirectory for Database {
    async fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        Database::get_student(self, student_id).await
    }
}
