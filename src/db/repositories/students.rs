use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{connection::Database, helpers::format_datetime};
use crate::models::Student;

fn row_to_student(row: &Row) -> Result<Student> {
    Ok(Student {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        grade: row.get("grade")?,
        campus_id: row.get("campus_id")?,
    })
}

impl Database {
    pub async fn insert_student(&self, student: &Student) -> Result<()> {
        let record = student.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO students (id, first_name, last_name, grade, campus_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.first_name,
                    record.last_name,
                    record.grade,
                    record.campus_id,
                    format_datetime(&Utc::now()),
                ],
            )
            .with_context(|| format!("failed to insert student {}", record.id))?;
            Ok(())
        })
        .await
    }

    pub async fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        let student_id = student_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, first_name, last_name, grade, campus_id
                 FROM students
                 WHERE id = ?1",
            )?;

            let mut rows = stmt.query(params![student_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_student(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Students ordered by last name, then first name. `campus_id` narrows the
    /// list to one campus.
    pub async fn list_students(&self, campus_id: Option<&str>) -> Result<Vec<Student>> {
        let campus_id = campus_id.map(str::to_string);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, first_name, last_name, grade, campus_id
                 FROM students
                 WHERE ?1 IS NULL OR campus_id = ?1
                 ORDER BY last_name ASC, first_name ASC, id ASC",
            )?;

            let mut rows = stmt.query(params![campus_id])?;
            let mut students = Vec::new();
            while let Some(row) = rows.next()? {
                students.push(row_to_student(row)?);
            }

            Ok(students)
        })
        .await
    }
}
