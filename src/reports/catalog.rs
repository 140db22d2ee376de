use crate::models::{ReportType, ReportTypeOption};

/// Report types offered to callers for populating a choice list.
pub fn list_report_types() -> Vec<ReportTypeOption> {
    ReportType::ALL
        .iter()
        .map(|report_type| ReportTypeOption {
            value: report_type.as_str().to_string(),
            label: report_type.label().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_values_parse_back() {
        let options = list_report_types();
        let values: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["weekly", "nine_week", "semester"]);
        for option in options {
            assert!(option.value.parse::<ReportType>().is_ok());
        }
    }
}
