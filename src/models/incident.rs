//! Incident record model.
//!
//! An `IncidentRecord` is produced once by the capture builder and never edited
//! afterwards; a correction is a new record. Reports re-derive their numbers from
//! these records, so nothing in the crate mutates one after it is built.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tags::{
    BehaviorFunction, Consequence, DeliveryMethod, ReplacementBehavior, SettingEvent,
    TargetBehavior,
};

pub const MIN_INTENSITY: u8 = 1;
pub const MAX_INTENSITY: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorMetrics {
    pub frequency: u32,
    /// Seconds, fractional precision retained from the interval timer.
    pub duration_secs: f64,
    /// Seconds since the previous incident stopped; `None` when no prior stop was known.
    pub latency_secs: Option<f64>,
    pub intensity: u8,
    pub independent_breaks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reinforcer {
    pub name: String,
    pub frequency: u32,
    pub duration_secs: u32,
    pub method: DeliveryMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hypothesis {
    pub function: BehaviorFunction,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    pub id: String,
    pub student_id: String,
    pub observer_id: String,
    pub observer_name: Option<String>,
    pub session_id: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub setting_events: BTreeSet<SettingEvent>,
    pub antecedent: Option<String>,
    pub target_behaviors: BTreeSet<TargetBehavior>,
    pub replacement_behaviors: BTreeSet<ReplacementBehavior>,
    pub consequences: BTreeSet<Consequence>,
    pub metrics: BehaviorMetrics,
    pub reinforcer: Option<Reinforcer>,
    pub hypothesis: Option<Hypothesis>,
}

impl IncidentRecord {
    pub fn duration_secs(&self) -> f64 {
        self.metrics.duration_secs
    }

    pub fn intensity(&self) -> u8 {
        self.metrics.intensity
    }
}
