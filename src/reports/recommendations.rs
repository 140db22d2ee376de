use crate::models::{Recommendation, ReportSummary};

pub const HIGH_INTENSITY_THRESHOLD: f64 = 3.0;
pub const FREQUENT_INCIDENTS_THRESHOLD: usize = 10;
pub const LONG_DURATION_THRESHOLD_SECS: f64 = 60.0;

/// Follow-up suggestions for a summary. Empty when there were no incidents.
pub fn recommend(summary: &ReportSummary) -> Vec<Recommendation> {
    if summary.total_incidents == 0 {
        return Vec::new();
    }

    let mut recommendations = Vec::new();
    if summary.average_intensity > HIGH_INTENSITY_THRESHOLD {
        recommendations.push(Recommendation::ReviewInterventionStrategies);
    }
    if summary.total_incidents > FREQUENT_INCIDENTS_THRESHOLD {
        recommendations.push(Recommendation::FunctionalBehaviorAssessment);
    }
    if summary.average_duration > LONG_DURATION_THRESHOLD_SECS {
        recommendations.push(Recommendation::DeescalationTechniques);
    }
    recommendations.push(Recommendation::ContinueMonitoring);
    recommendations.push(Recommendation::UpdateBehaviorPlan);
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(total: usize, avg_duration: f64, avg_intensity: f64) -> ReportSummary {
        ReportSummary {
            total_incidents: total,
            total_duration: avg_duration * total as f64,
            average_duration: avg_duration,
            average_intensity: avg_intensity,
        }
    }

    #[test]
    fn test_no_incidents_no_recommendations() {
        assert!(recommend(&ReportSummary::default()).is_empty());
    }

    #[test]
    fn test_thresholds_are_strict() {
        assert_eq!(
            recommend(&summary(10, 60.0, 3.0)),
            vec![Recommendation::ContinueMonitoring, Recommendation::UpdateBehaviorPlan]
        );
        assert_eq!(
            recommend(&summary(11, 61.0, 3.5)),
            vec![
                Recommendation::ReviewInterventionStrategies,
                Recommendation::FunctionalBehaviorAssessment,
                Recommendation::DeescalationTechniques,
                Recommendation::ContinueMonitoring,
                Recommendation::UpdateBehaviorPlan,
            ]
        );
    }
}
