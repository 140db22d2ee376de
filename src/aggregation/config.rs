pub const DEFAULT_RECENT_LOGS_LIMIT: usize = 20;

/// Tunables for incident aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationConfig {
    /// Maximum number of records kept in `recent_logs`, newest first.
    pub recent_logs_limit: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            recent_logs_limit: DEFAULT_RECENT_LOGS_LIMIT,
        }
    }
}
