//! Command-line front end. Every command prints JSON on stdout; logs go to stderr.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::capture::{CaptureSession, IncidentDraft, DEFAULT_INTENSITY};
use crate::db::Database;
use crate::models::{
    catalog, BehaviorFunction, Consequence, DeliveryMethod, Hypothesis, Reinforcer,
    IncidentRecord, ReplacementBehavior, SettingEvent, Student, TargetBehavior,
};
use crate::reports::{self, list_report_types, JsonRenderer, ReportResolver};
use crate::settings::SettingsStore;

/// Momentum - ABC behavior incident capture and reporting
#[derive(Parser)]
#[command(name = "momentum")]
#[command(version)]
#[command(about = "Record ABC behavior incidents and build report previews", long_about = None)]
pub struct Cli {
    /// Directory holding the database and settings file
    #[arg(long, global = true, default_value = "./momentum-data")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the report types a preview can be built for
    ReportTypes,

    /// Print the tag catalog used by the incident form
    Catalog,

    /// Register a student
    AddStudent {
        #[arg(long)]
        id: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        grade: Option<String>,

        #[arg(long)]
        campus: Option<String>,
    },

    /// List registered students
    Students {
        /// Only students on this campus
        #[arg(long)]
        campus: Option<String>,
    },

    /// Record one incident
    Record(RecordArgs),

    /// A student's incident log, newest first
    Logs {
        #[arg(long)]
        student: String,

        /// Earliest observation time to include (RFC 3339)
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Latest observation time to include (RFC 3339)
        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },

    /// Build a report preview
    Preview {
        #[arg(long)]
        student: String,

        /// weekly, nine_week or semester
        #[arg(long)]
        report_type: String,

        /// Report anchor (RFC 3339); defaults to now
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Per-student distributions over the dashboard window
    Dashboard {
        #[arg(long)]
        student: String,

        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Render a report and write it to a file (or stdout)
    Export {
        #[arg(long)]
        student: String,

        #[arg(long)]
        report_type: String,

        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Directory to write the report into; stdout when omitted
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
pub struct RecordArgs {
    #[arg(long)]
    pub student: String,

    #[arg(long)]
    pub observer: String,

    #[arg(long)]
    pub observer_name: Option<String>,

    /// Target behavior label; repeat for several
    #[arg(long = "behavior", required = true)]
    pub behaviors: Vec<TargetBehavior>,

    #[arg(long = "setting-event")]
    pub setting_events: Vec<SettingEvent>,

    #[arg(long)]
    pub antecedent: Option<String>,

    #[arg(long = "replacement")]
    pub replacements: Vec<ReplacementBehavior>,

    #[arg(long = "consequence")]
    pub consequences: Vec<Consequence>,

    #[arg(long, default_value_t = 1)]
    pub frequency: u32,

    /// Manually entered duration in seconds
    #[arg(long, conflicts_with = "timed_secs")]
    pub duration_secs: Option<f64>,

    /// Run the interval timer live for this many seconds instead
    #[arg(long, value_parser = parse_timed_secs)]
    pub timed_secs: Option<f64>,

    #[arg(long, default_value_t = DEFAULT_INTENSITY)]
    pub intensity: i32,

    #[arg(long, default_value_t = 0)]
    pub independent_breaks: u32,

    #[arg(long)]
    pub observed_at: Option<DateTime<Utc>>,

    #[arg(long)]
    pub reinforcer: Option<String>,

    #[arg(long, default_value = "verbal")]
    pub reinforcer_method: DeliveryMethod,

    #[arg(long)]
    pub function: Option<BehaviorFunction>,

    #[arg(long, default_value = "")]
    pub hypothesis_notes: String,
}

impl RecordArgs {
    fn draft(&self) -> IncidentDraft {
        let mut draft = IncidentDraft::new()
            .student(self.student.clone())
            .observer(self.observer.clone())
            .frequency(self.frequency)
            .intensity(self.intensity)
            .independent_breaks(self.independent_breaks)
            .reinforcer(self.reinforcer.as_ref().map(|name| Reinforcer {
                name: name.clone(),
                frequency: 1,
                duration_secs: 0,
                method: self.reinforcer_method,
            }))
            .hypothesis(self.function.map(|function| Hypothesis {
                function,
                notes: self.hypothesis_notes.clone(),
            }));

        if let Some(name) = &self.observer_name {
            draft = draft.observer_name(name.clone());
        }
        if let Some(text) = &self.antecedent {
            draft = draft.antecedent(text.clone());
        }
        if let Some(at) = self.observed_at {
            draft = draft.observed_at(at);
        }
        if let Some(secs) = self.duration_secs {
            draft = draft.duration_secs(secs);
        }
        for tag in &self.behaviors {
            draft = draft.target_behavior(*tag, true);
        }
        for tag in &self.setting_events {
            draft = draft.setting_event(*tag, true);
        }
        for tag in &self.replacements {
            draft = draft.replacement_behavior(*tag, true);
        }
        for tag in &self.consequences {
            draft = draft.consequence(*tag, true);
        }
        draft
    }
}

pub async fn execute(cli: Cli) -> Result<()> {
    if let Commands::ReportTypes = cli.command {
        return print_json(&list_report_types());
    }
    if let Commands::Catalog = cli.command {
        return print_json(&catalog());
    }

    let settings = SettingsStore::new(cli.data_dir.join("settings.json"))?.settings();
    let db = Database::new(cli.data_dir.join("momentum.sqlite3"))?;
    let resolver = ReportResolver::new(db.clone(), db.clone(), settings.report_config());

    match cli.command {
        Commands::ReportTypes | Commands::Catalog => Ok(()),
        Commands::AddStudent {
            id,
            first_name,
            last_name,
            grade,
            campus,
        } => {
            let student = Student {
                id,
                first_name,
                last_name,
                grade,
                campus_id: campus,
            };
            db.insert_student(&student).await?;
            print_json(&student)
        }
        Commands::Students { campus } => {
            let students = db.list_students(campus.as_deref()).await?;
            print_json(&students)
        }
        Commands::Record(args) => {
            let record = record(&db, &args, settings.sample_interval()).await?;
            print_json(&record)
        }
        Commands::Logs {
            student,
            start,
            end,
        } => {
            let logs = db.list_incident_logs(&student, start, end).await?;
            print_json(&logs)
        }
        Commands::Preview {
            student,
            report_type,
            now,
        } => {
            let preview = resolver
                .preview(&student, &report_type, now.unwrap_or_else(Utc::now))
                .await?;
            print_json(&preview)
        }
        Commands::Dashboard { student, now } => {
            let snapshot = resolver
                .dashboard(&student, now.unwrap_or_else(Utc::now))
                .await?;
            print_json(&snapshot)
        }
        Commands::Export {
            student,
            report_type,
            now,
            out_dir,
        } => {
            let preview = resolver
                .preview(&student, &report_type, now.unwrap_or_else(Utc::now))
                .await?;
            let exported = reports::export(&JsonRenderer, &preview)?;
            match out_dir {
                Some(dir) => {
                    let path = write_export(&dir, &exported.file_name, &exported.bytes)?;
                    print_json(&serde_json::json!({
                        "fileName": exported.file_name,
                        "contentType": exported.content_type,
                        "path": path,
                    }))
                }
                None => {
                    let mut stdout = io::stdout().lock();
                    stdout.write_all(&exported.bytes)?;
                    writeln!(stdout)?;
                    Ok(())
                }
            }
        }
    }
}

async fn record(
    db: &Database,
    args: &RecordArgs,
    sample_interval: Duration,
) -> Result<IncidentRecord> {
    let previous_stop = db
        .latest_incident_for_student(&args.student)
        .await?
        .and_then(|last| stop_time(&last));

    let mut session = CaptureSession::open(args.student.clone(), previous_stop, sample_interval);
    let mut draft = args.draft();
    match args.timed_secs {
        Some(secs) => {
            let wait = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("invalid timed duration {secs}"))?;
            session.begin_incident().await?;
            tokio::time::sleep(wait).await;
            session.end_incident().await?;
        }
        None if args.observed_at.is_none() => draft = draft.observed_at(Utc::now()),
        None => {}
    }

    let record = session.submit(&draft, db).await?;
    Ok(record)
}

/// Stored records carry no stop time; a record ended `duration` after it was
/// observed. `None` when that instant is out of range.
fn stop_time(record: &IncidentRecord) -> Option<DateTime<Utc>> {
    // Float to int casts saturate, NaN becomes 0.
    let millis = (record.duration_secs() * 1000.0) as i64;
    ChronoDuration::try_milliseconds(millis)
        .and_then(|elapsed| record.observed_at.checked_add_signed(elapsed))
}

fn parse_timed_secs(value: &str) -> std::result::Result<f64, String> {
    let secs: f64 = value.parse().map_err(|err| format!("{err}"))?;
    Duration::try_from_secs_f64(secs)
        .map(|_| secs)
        .map_err(|_| format!("expected a finite, non-negative number of seconds, got {value}"))
}

fn write_export(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn record_args(extra: &[&str]) -> RecordArgs {
        let mut argv = vec![
            "momentum",
            "record",
            "--student",
            "S1",
            "--observer",
            "observer123",
            "--behavior",
            "Aggression",
        ];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Record(args) => args,
            _ => panic!("expected record command"),
        }
    }

    async fn open_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("momentum.sqlite3")).unwrap();
        db.insert_student(&Student {
            id: "S1".into(),
            first_name: "Jordan".into(),
            last_name: "Lee".into(),
            grade: None,
            campus_id: Some("North".into()),
        })
        .await
        .unwrap();
        (dir, db)
    }

    #[test]
    fn test_record_args_parse_labels() {
        let cli = Cli::try_parse_from([
            "momentum",
            "record",
            "--student",
            "S1",
            "--observer",
            "observer123",
            "--behavior",
            "aggression",
            "--behavior",
            "Tantrum/crying",
            "--duration-secs",
            "12.5",
            "--intensity",
            "4",
        ])
        .unwrap();

        let Commands::Record(args) = cli.command else {
            panic!("expected record command");
        };
        assert_eq!(cli.data_dir, PathBuf::from("./momentum-data"));
        assert_eq!(
            args.behaviors,
            vec![TargetBehavior::Aggression, TargetBehavior::Tantrum]
        );

        let draft = args.draft();
        assert_eq!(draft.student_id(), Some("S1"));
        assert_eq!(draft.target_behaviors().len(), 2);
    }

    #[test]
    fn test_record_rejects_unknown_tag() {
        let parsed = Cli::try_parse_from([
            "momentum",
            "record",
            "--student",
            "S1",
            "--observer",
            "o",
            "--behavior",
            "Sleeping",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_manual_and_timed_durations_conflict() {
        let parsed = Cli::try_parse_from([
            "momentum",
            "record",
            "--student",
            "S1",
            "--observer",
            "o",
            "--behavior",
            "Other",
            "--duration-secs",
            "3",
            "--timed-secs",
            "3",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_timed_secs_must_be_finite_and_non_negative() {
        for bad in ["inf", "NaN", "1e300", "abc"] {
            let parsed = Cli::try_parse_from([
                "momentum",
                "record",
                "--student",
                "S1",
                "--observer",
                "o",
                "--behavior",
                "Other",
                "--timed-secs",
                bad,
            ]);
            assert!(parsed.is_err(), "{bad} should be rejected");
        }
        assert_eq!(parse_timed_secs("-1").ok(), None);
        assert_eq!(parse_timed_secs("0.25"), Ok(0.25));
    }

    #[test]
    fn test_stop_time_is_none_when_out_of_range() {
        let observed_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let mut last = crate::test_support::incident("a", observed_at, 90.0, 2, &[]);
        assert_eq!(
            stop_time(&last),
            Some(observed_at + ChronoDuration::seconds(90))
        );

        last.metrics.duration_secs = 1e300;
        assert_eq!(stop_time(&last), None);

        last.metrics.duration_secs = f64::INFINITY;
        assert_eq!(stop_time(&last), None);
    }

    #[tokio::test]
    async fn test_record_after_huge_stored_duration() {
        let (_dir, db) = open_db().await;

        let huge = record(&db, &record_args(&["--duration-secs", "1e300"]), Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(huge.metrics.duration_secs, 1e300);

        let next = record(&db, &record_args(&["--duration-secs", "5"]), Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(next.metrics.duration_secs, 5.0);

        let timed = record(&db, &record_args(&["--timed-secs", "0.02"]), Duration::from_millis(10))
            .await
            .unwrap();
        assert!(timed.metrics.latency_secs.is_some_and(|latency| latency >= 0.0));
    }

    #[test]
    fn test_logs_and_students_parse() {
        let cli = Cli::try_parse_from([
            "momentum",
            "logs",
            "--student",
            "S1",
            "--start",
            "2024-03-01T00:00:00Z",
        ])
        .unwrap();
        let Commands::Logs { student, start, end } = cli.command else {
            panic!("expected logs command");
        };
        assert_eq!(student, "S1");
        assert_eq!(start, Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        assert_eq!(end, None);

        let cli = Cli::try_parse_from(["momentum", "students", "--campus", "North"]).unwrap();
        let Commands::Students { campus } = cli.command else {
            panic!("expected students command");
        };
        assert_eq!(campus.as_deref(), Some("North"));

        assert!(Cli::try_parse_from(["momentum", "logs"]).is_err());
        assert!(Cli::try_parse_from(["momentum", "logs", "--student", "S1", "--end", "soon"]).is_err());
    }

    #[tokio::test]
    async fn test_logs_and_students_commands_run() {
        let (dir, db) = open_db().await;
        record(&db, &record_args(&["--duration-secs", "5"]), Duration::from_millis(10))
            .await
            .unwrap();
        drop(db);

        let data_dir = dir.path().to_str().unwrap();
        for argv in [
            vec!["momentum", "--data-dir", data_dir, "students"],
            vec!["momentum", "--data-dir", data_dir, "students", "--campus", "South"],
            vec!["momentum", "--data-dir", data_dir, "logs", "--student", "S1"],
            vec![
                "momentum",
                "--data-dir",
                data_dir,
                "logs",
                "--student",
                "S1",
                "--end",
                "2000-01-01T00:00:00Z",
            ],
        ] {
            execute(Cli::try_parse_from(argv).unwrap()).await.unwrap();
        }
    }
}
