pub mod incident;
pub mod report;
pub mod student;
pub mod tags;

pub use incident::{BehaviorMetrics, Hypothesis, IncidentRecord, Reinforcer};
pub use report::{
    DashboardSnapshot, DateRange, Recommendation, ReportPreview, ReportSummary, ReportType,
    ReportTypeOption,
};
pub use student::Student;
pub use tags::{
    catalog, BehaviorFunction, Consequence, DeliveryMethod, ReplacementBehavior, SettingEvent,
    TagCatalog, TargetBehavior, UnknownTag,
};
