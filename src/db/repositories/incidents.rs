use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{
        format_datetime, optional_from_json, optional_to_json, parse_datetime, tags_from_json,
        tags_to_json, to_u32, to_u8,
    },
};
use crate::models::{BehaviorMetrics, DateRange, IncidentRecord};

const INCIDENT_COLUMNS: &str = "id, student_id, observer_id, observer_name, session_id,
    observed_at, recorded_at, setting_events, antecedent, target_behaviors,
    replacement_behaviors, consequences, frequency, duration_secs, latency_secs,
    intensity, independent_breaks, reinforcer, hypothesis";

fn row_to_incident(row: &Row) -> Result<IncidentRecord> {
    let observed_at: String = row.get("observed_at")?;
    let recorded_at: String = row.get("recorded_at")?;
    let setting_events: String = row.get("setting_events")?;
    let target_behaviors: String = row.get("target_behaviors")?;
    let replacement_behaviors: String = row.get("replacement_behaviors")?;
    let consequences: String = row.get("consequences")?;

    Ok(IncidentRecord {
        id: row.get("id")?,
        student_id: row.get("student_id")?,
        observer_id: row.get("observer_id")?,
        observer_name: row.get("observer_name")?,
        session_id: row.get("session_id")?,
        observed_at: parse_datetime(&observed_at, "observed_at")?,
        recorded_at: parse_datetime(&recorded_at, "recorded_at")?,
        setting_events: tags_from_json(&setting_events, "setting_events")?,
        antecedent: row.get("antecedent")?,
        target_behaviors: tags_from_json(&target_behaviors, "target_behaviors")?,
        replacement_behaviors: tags_from_json(&replacement_behaviors, "replacement_behaviors")?,
        consequences: tags_from_json(&consequences, "consequences")?,
        metrics: BehaviorMetrics {
            frequency: to_u32(row.get("frequency")?, "frequency")?,
            duration_secs: row.get("duration_secs")?,
            latency_secs: row.get("latency_secs")?,
            intensity: to_u8(row.get("intensity")?, "intensity")?,
            independent_breaks: to_u32(row.get("independent_breaks")?, "independent_breaks")?,
        },
        reinforcer: optional_from_json(row.get("reinforcer")?, "reinforcer")?,
        hypothesis: optional_from_json(row.get("hypothesis")?, "hypothesis")?,
    })
}

impl Database {
    /// Stores a new record. Records are never updated once inserted.
    pub async fn insert_incident(&self, incident: &IncidentRecord) -> Result<()> {
        let record = incident.clone();
        self.execute(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO incidents ({INCIDENT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                             ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
                ),
                params![
                    record.id,
                    record.student_id,
                    record.observer_id,
                    record.observer_name,
                    record.session_id,
                    format_datetime(&record.observed_at),
                    format_datetime(&record.recorded_at),
                    tags_to_json(&record.setting_events)?,
                    record.antecedent,
                    tags_to_json(&record.target_behaviors)?,
                    tags_to_json(&record.replacement_behaviors)?,
                    tags_to_json(&record.consequences)?,
                    record.metrics.frequency,
                    record.metrics.duration_secs,
                    record.metrics.latency_secs,
                    record.metrics.intensity,
                    record.metrics.independent_breaks,
                    optional_to_json(record.reinforcer.as_ref())?,
                    optional_to_json(record.hypothesis.as_ref())?,
                ],
            )
            .with_context(|| format!("failed to insert incident {}", record.id))?;
            Ok(())
        })
        .await
    }

    /// Incidents for one student observed inside the inclusive range, oldest
    /// first; records with the same `observed_at` keep insertion order.
    pub async fn list_incidents_in_range(
        &self,
        student_id: &str,
        range: DateRange,
    ) -> Result<Vec<IncidentRecord>> {
        let student_id = student_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {INCIDENT_COLUMNS}
                 FROM incidents
                 WHERE student_id = ?1 AND observed_at >= ?2 AND observed_at <= ?3
                 ORDER BY observed_at ASC, rowid ASC"
            ))?;

            let mut rows = stmt.query(params![
                student_id,
                format_datetime(&range.start),
                format_datetime(&range.end),
            ])?;
            let mut incidents = Vec::new();
            while let Some(row) = rows.next()? {
                incidents.push(row_to_incident(row)?);
            }

            Ok(incidents)
        })
        .await
    }

    /// Incident log for one student, newest first. Either bound may be left
    /// open; both are inclusive.
    pub async fn list_incident_logs(
        &self,
        student_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<IncidentRecord>> {
        let student_id = student_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {INCIDENT_COLUMNS}
                 FROM incidents
                 WHERE student_id = ?1
                   AND (?2 IS NULL OR observed_at >= ?2)
                   AND (?3 IS NULL OR observed_at <= ?3)
                 ORDER BY observed_at DESC, rowid DESC"
            ))?;

            let mut rows = stmt.query(params![
                student_id,
                start.as_ref().map(format_datetime),
                end.as_ref().map(format_datetime),
            ])?;
            let mut incidents = Vec::new();
            while let Some(row) = rows.next()? {
                incidents.push(row_to_incident(row)?);
            }

            Ok(incidents)
        })
        .await
    }

    pub async fn latest_incident_for_student(
        &self,
        student_id: &str,
    ) -> Result<Option<IncidentRecord>> {
        let student_id = student_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {INCIDENT_COLUMNS}
                 FROM incidents
                 WHERE student_id = ?1
                 ORDER BY observed_at DESC, rowid DESC
                 LIMIT 1"
            ))?;

            let mut rows = stmt.query(params![student_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_incident(row)?)),
                None => Ok(None),
            }
        })
        .await
    }
}
