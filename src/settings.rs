use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::aggregation::AggregationConfig;
use crate::reports::ReportConfig;
use crate::timer::DEFAULT_SAMPLE_INTERVAL;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Longest dashboard window accepted from the settings file (about 100 years).
pub const MAX_DASHBOARD_WINDOW_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerSettings {
    pub sample_interval_ms: u64,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSettings {
    pub recent_logs_limit: usize,
    pub collaborator_timeout_ms: u64,
    pub dashboard_window_days: i64,
}

impl Default for ReportSettings {
    fn default() -> Self {
        let config = ReportConfig::default();
        Self {
            recent_logs_limit: config.aggregation.recent_logs_limit,
            collaborator_timeout_ms: config.collaborator_timeout.as_millis() as u64,
            dashboard_window_days: config.dashboard_window_days,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub timer: TimerSettings,
    pub reports: ReportSettings,
}

impl Settings {
    /// Sampling period for elapsed-time updates. Zero is not a valid tick period.
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.timer.sample_interval_ms.max(1))
    }

    pub fn report_config(&self) -> ReportConfig {
        ReportConfig {
            aggregation: AggregationConfig {
                recent_logs_limit: self.reports.recent_logs_limit,
            },
            collaborator_timeout: Duration::from_millis(self.reports.collaborator_timeout_ms),
            dashboard_window_days: self
                .reports
                .dashboard_window_days
                .clamp(1, MAX_DASHBOARD_WINDOW_DAYS),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!(
                    "Ignoring malformed settings at {}: {err}",
                    path.display()
                );
                Settings::default()
            })
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> Settings {
        self.read().clone()
    }

    pub fn update(&self, settings: Settings) -> Result<()> {
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Settings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
