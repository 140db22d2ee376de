//! Incident draft and validation.
//!
//! Form edits produce new `IncidentDraft` values; nothing is committed until
//! [`build`] turns a draft plus the finalized timer output into a record.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::incident::{MAX_INTENSITY, MIN_INTENSITY};
use crate::models::{
    BehaviorMetrics, Consequence, Hypothesis, IncidentRecord, Reinforcer, ReplacementBehavior,
    SettingEvent, TargetBehavior,
};
use crate::timer::TimerOutput;

/// Intensity preselected on a fresh capture form.
pub const DEFAULT_INTENSITY: i32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct IncidentDraft {
    student_id: Option<String>,
    observer_id: Option<String>,
    observer_name: Option<String>,
    session_id: Option<String>,
    observed_at: Option<DateTime<Utc>>,
    setting_events: BTreeSet<SettingEvent>,
    antecedent: Option<String>,
    target_behaviors: BTreeSet<TargetBehavior>,
    replacement_behaviors: BTreeSet<ReplacementBehavior>,
    consequences: BTreeSet<Consequence>,
    frequency: u32,
    duration_secs: f64,
    intensity: i32,
    independent_breaks: u32,
    reinforcer: Option<Reinforcer>,
    hypothesis: Option<Hypothesis>,
}

impl Default for IncidentDraft {
    fn default() -> Self {
        Self {
            student_id: None,
            observer_id: None,
            observer_name: None,
            session_id: None,
            observed_at: None,
            setting_events: BTreeSet::new(),
            antecedent: None,
            target_behaviors: BTreeSet::new(),
            replacement_behaviors: BTreeSet::new(),
            consequences: BTreeSet::new(),
            frequency: 0,
            duration_secs: 0.0,
            intensity: DEFAULT_INTENSITY,
            independent_breaks: 0,
            reinforcer: None,
            hypothesis: None,
        }
    }
}

fn non_blank(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, tag: T, selected: bool) {
    if selected {
        set.insert(tag);
    } else {
        set.remove(&tag);
    }
}

impl IncidentDraft {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn student(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = non_blank(student_id);
        self
    }

    #[must_use]
    pub fn observer(mut self, observer_id: impl Into<String>) -> Self {
        self.observer_id = non_blank(observer_id);
        self
    }

    #[must_use]
    pub fn observer_name(mut self, name: impl Into<String>) -> Self {
        self.observer_name = non_blank(name);
        self
    }

    #[must_use]
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = non_blank(session_id);
        self
    }

    #[must_use]
    pub fn observed_at(mut self, observed_at: DateTime<Utc>) -> Self {
        self.observed_at = Some(observed_at);
        self
    }

    #[must_use]
    pub fn setting_event(mut self, tag: SettingEvent, selected: bool) -> Self {
        toggle(&mut self.setting_events, tag, selected);
        self
    }

    #[must_use]
    pub fn antecedent(mut self, text: impl Into<String>) -> Self {
        self.antecedent = non_blank(text);
        self
    }

    #[must_use]
    pub fn target_behavior(mut self, tag: TargetBehavior, selected: bool) -> Self {
        toggle(&mut self.target_behaviors, tag, selected);
        self
    }

    #[must_use]
    pub fn replacement_behavior(mut self, tag: ReplacementBehavior, selected: bool) -> Self {
        toggle(&mut self.replacement_behaviors, tag, selected);
        self
    }

    #[must_use]
    pub fn consequence(mut self, tag: Consequence, selected: bool) -> Self {
        toggle(&mut self.consequences, tag, selected);
        self
    }

    #[must_use]
    pub fn frequency(mut self, frequency: u32) -> Self {
        self.frequency = frequency;
        self
    }

    /// Manually entered duration, used only when no timer measurement is supplied.
    #[must_use]
    pub fn duration_secs(mut self, duration_secs: f64) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    #[must_use]
    pub fn intensity(mut self, intensity: i32) -> Self {
        self.intensity = intensity;
        self
    }

    #[must_use]
    pub fn independent_breaks(mut self, breaks: u32) -> Self {
        self.independent_breaks = breaks;
        self
    }

    #[must_use]
    pub fn reinforcer(mut self, reinforcer: Option<Reinforcer>) -> Self {
        self.reinforcer = reinforcer;
        self
    }

    #[must_use]
    pub fn hypothesis(mut self, hypothesis: Option<Hypothesis>) -> Self {
        self.hypothesis = hypothesis;
        self
    }

    pub fn student_id(&self) -> Option<&str> {
        self.student_id.as_deref()
    }

    pub fn target_behaviors(&self) -> &BTreeSet<TargetBehavior> {
        &self.target_behaviors
    }
}

/// Validates `fields` and assembles an immutable record.
///
/// With a timer measurement, duration, latency and (when the draft has none)
/// the observation time come from the timer; otherwise the draft's manual
/// duration is used and latency is `None`.
pub fn build(
    fields: &IncidentDraft,
    timer: Option<&TimerOutput>,
) -> Result<IncidentRecord, ValidationError> {
    let student_id = fields
        .student_id
        .clone()
        .ok_or(ValidationError::MissingStudent)?;
    let observer_id = fields
        .observer_id
        .clone()
        .ok_or(ValidationError::MissingObserver)?;

    if fields.target_behaviors.is_empty() {
        return Err(ValidationError::MissingTargetBehavior);
    }

    if fields.intensity < i32::from(MIN_INTENSITY) || fields.intensity > i32::from(MAX_INTENSITY) {
        return Err(ValidationError::InvalidIntensity(fields.intensity));
    }

    let (duration_secs, latency_secs) = match timer {
        Some(output) => (output.duration_secs, output.latency_secs),
        None => (fields.duration_secs, None),
    };
    // Also rejects NaN.
    if !(duration_secs >= 0.0) || !duration_secs.is_finite() {
        return Err(ValidationError::NegativeDuration(duration_secs));
    }
    let latency_secs = latency_secs.map(|latency| latency.max(0.0));

    let observed_at = fields
        .observed_at
        .or_else(|| timer.map(|output| output.started_at))
        .ok_or(ValidationError::MissingObservedAt)?;

    Ok(IncidentRecord {
        id: Uuid::new_v4().to_string(),
        student_id,
        observer_id,
        observer_name: fields.observer_name.clone(),
        session_id: fields.session_id.clone(),
        observed_at,
        recorded_at: Utc::now(),
        setting_events: fields.setting_events.clone(),
        antecedent: fields.antecedent.clone(),
        target_behaviors: fields.target_behaviors.clone(),
        replacement_behaviors: fields.replacement_behaviors.clone(),
        consequences: fields.consequences.clone(),
        metrics: BehaviorMetrics {
            frequency: fields.frequency,
            duration_secs,
            latency_secs,
            intensity: fields.intensity as u8,
            independent_breaks: fields.independent_breaks,
        },
        reinforcer: fields.reinforcer.clone(),
        hypothesis: fields.hypothesis.clone(),
    })
}
