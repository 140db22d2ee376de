//! Pure aggregation over incident snapshots.
//!
//! Nothing here performs I/O or reads the clock, so the same input always
//! yields the same output and callers may aggregate concurrently.

pub mod config;
pub mod distribution;
pub mod summary;

pub use config::{AggregationConfig, DEFAULT_RECENT_LOGS_LIMIT};
pub use distribution::dashboard;
pub use summary::{aggregate, behavior_frequency, recent_logs, summarize, IncidentAggregate};
