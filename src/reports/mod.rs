pub mod catalog;
pub mod export;
pub mod recommendations;
pub mod resolver;

pub use catalog::list_report_types;
pub use export::{export, export_file_name, ExportRenderer, ExportedReport, JsonRenderer};
pub use recommendations::recommend;
pub use resolver::{assemble_preview, resolve_range, ReportConfig, ReportResolver};
