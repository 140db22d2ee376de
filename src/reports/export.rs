use anyhow::{Context, Result};

use crate::models::ReportPreview;

/// Turns an assembled preview into a downloadable document.
///
/// Renderers only format; they never recompute numbers, so an export always
/// matches the preview it was built from.
pub trait ExportRenderer {
    fn content_type(&self) -> &'static str;
    fn extension(&self) -> &'static str;
    fn render(&self, preview: &ReportPreview) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ExportRenderer for JsonRenderer {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, preview: &ReportPreview) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(preview).context("Failed to serialize report preview")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `{First}_{Last}_{reportType}_report_{YYYYMMDD}.{ext}`, dated by the range end.
pub fn export_file_name(preview: &ReportPreview, extension: &str) -> String {
    let sanitize = |part: &str| part.trim().replace(char::is_whitespace, "_");
    format!(
        "{}_{}_{}_report_{}.{}",
        sanitize(&preview.student.first_name),
        sanitize(&preview.student.last_name),
        preview.report_type.as_str(),
        preview.date_range.end.format("%Y%m%d"),
        extension
    )
}

pub fn export<R: ExportRenderer + ?Sized>(
    renderer: &R,
    preview: &ReportPreview,
) -> Result<ExportedReport> {
    let bytes = renderer.render(preview)?;
    Ok(ExportedReport {
        file_name: export_file_name(preview, renderer.extension()),
        content_type: renderer.content_type(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::AggregationConfig;
    use crate::models::{ReportType, TargetBehavior};
    use crate::reports::assemble_preview;
    use crate::test_support::{incident, student};
    use chrono::{Duration, TimeZone, Utc};

    fn preview() -> ReportPreview {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let records = vec![
            incident("a", now - Duration::days(1), 12.5, 4, &[TargetBehavior::Tantrum]),
            incident("b", now - Duration::days(2), 7.5, 2, &[TargetBehavior::Other]),
        ];
        assemble_preview(
            ReportType::NineWeek,
            now,
            student("S1"),
            &records,
            &AggregationConfig::default(),
        )
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            export_file_name(&preview(), "json"),
            "Jordan_Lee_nine_week_report_20240315.json"
        );
    }

    #[test]
    fn test_json_export_matches_preview() {
        let preview = preview();
        let exported = export(&JsonRenderer, &preview).unwrap();
        assert_eq!(exported.content_type, "application/json");

        let parsed: ReportPreview = serde_json::from_slice(&exported.bytes).unwrap();
        assert_eq!(parsed, preview);
        assert_eq!(parsed.summary.total_duration, 20.0);
    }
}
