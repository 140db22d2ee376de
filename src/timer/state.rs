use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::UsageError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Idle,
    Running,
    Stopped,
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::Idle
    }
}

/// Finalized measurement handed to the incident builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerOutput {
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub duration_secs: f64,
    /// `None` when no previous stop time was supplied.
    pub latency_secs: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<f64>,
    pub latency_secs: Option<f64>,
    /// Monotonic anchor for live elapsed samples; the recorded duration comes
    /// from the start/stop timestamps.
    #[serde(skip)]
    pub running_anchor: Option<Instant>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            status: TimerStatus::Idle,
            started_at: None,
            stopped_at: None,
            duration_secs: None,
            latency_secs: None,
            running_anchor: None,
        }
    }
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` (and changes nothing) unless the timer is idle.
    pub fn start(&mut self, started_at: DateTime<Utc>, anchor: Instant) -> bool {
        if self.status != TimerStatus::Idle {
            return false;
        }

        *self = Self {
            status: TimerStatus::Running,
            started_at: Some(started_at),
            running_anchor: Some(anchor),
            ..Self::default()
        };
        true
    }

    pub fn stop(
        &mut self,
        stopped_at: DateTime<Utc>,
        previous_stop: Option<DateTime<Utc>>,
    ) -> Result<TimerOutput, UsageError> {
        let started_at = match (self.status, self.started_at) {
            (TimerStatus::Running, Some(started_at)) => started_at,
            _ => return Err(UsageError::NotRunning),
        };

        let duration_secs = seconds_between(started_at, stopped_at);
        let latency_secs = previous_stop.map(|previous| seconds_between(previous, stopped_at));

        self.status = TimerStatus::Stopped;
        self.stopped_at = Some(stopped_at);
        self.duration_secs = Some(duration_secs);
        self.latency_secs = latency_secs;
        self.running_anchor = None;

        Ok(TimerOutput {
            started_at,
            stopped_at,
            duration_secs,
            latency_secs,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The finalized measurement, available only while stopped.
    pub fn output(&self) -> Option<TimerOutput> {
        match (self.status, self.started_at, self.stopped_at, self.duration_secs) {
            (TimerStatus::Stopped, Some(started_at), Some(stopped_at), Some(duration_secs)) => {
                Some(TimerOutput {
                    started_at,
                    stopped_at,
                    duration_secs,
                    latency_secs: self.latency_secs,
                })
            }
            _ => None,
        }
    }

    /// Elapsed seconds for display.
    pub fn elapsed_secs(&self) -> f64 {
        match (self.status, self.running_anchor) {
            (TimerStatus::Running, Some(anchor)) => anchor.elapsed().as_secs_f64(),
            (TimerStatus::Stopped, _) => self.duration_secs.unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

/// Fractional seconds from `from` to `to`, clamped at zero so a wall-clock step
/// backwards never yields a negative measurement.
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    let secs = match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    };
    secs.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_start_stop_yields_fractional_duration() {
        let mut state = TimerState::new();
        assert!(state.start(at(0), Instant::now()));
        assert_eq!(state.status, TimerStatus::Running);

        let output = state
            .stop(at(12) + Duration::milliseconds(250), None)
            .unwrap();
        assert_eq!(state.status, TimerStatus::Stopped);
        assert!((output.duration_secs - 12.25).abs() < 1e-9);
        assert_eq!(output.latency_secs, None);
        assert_eq!(state.output(), Some(output));
    }

    #[test]
    fn test_latency_uses_previous_stop() {
        let mut state = TimerState::new();
        state.start(at(100), Instant::now());
        let output = state.stop(at(130), Some(at(40))).unwrap();
        assert_eq!(output.latency_secs, Some(90.0));
        assert_eq!(output.duration_secs, 30.0);
    }

    #[test]
    fn test_clock_stepping_backwards_clamps_to_zero() {
        let mut state = TimerState::new();
        state.start(at(50), Instant::now());
        let output = state.stop(at(45), Some(at(60))).unwrap();
        assert_eq!(output.duration_secs, 0.0);
        assert_eq!(output.latency_secs, Some(0.0));
    }

    #[test]
    fn test_start_is_ignored_unless_idle() {
        let mut state = TimerState::new();
        assert!(state.start(at(0), Instant::now()));
        assert!(!state.start(at(5), Instant::now()));
        assert_eq!(state.started_at, Some(at(0)));

        state.stop(at(10), None).unwrap();
        assert!(!state.start(at(20), Instant::now()));
        assert_eq!(state.status, TimerStatus::Stopped);
        assert_eq!(state.duration_secs, Some(10.0));
    }

    #[test]
    fn test_stop_before_start_is_usage_error() {
        let mut state = TimerState::new();
        assert_eq!(state.stop(at(1), None), Err(UsageError::NotRunning));
        assert_eq!(state.status, TimerStatus::Idle);
        assert!(state.output().is_none());
    }

    #[test]
    fn test_reset_after_stop_clears_everything() {
        let mut state = TimerState::new();
        state.start(at(0), Instant::now());
        state.stop(at(8), Some(at(-2))).unwrap();
        state.reset();

        assert_eq!(state.status, TimerStatus::Idle);
        assert_eq!(state.started_at, None);
        assert_eq!(state.stopped_at, None);
        assert_eq!(state.duration_secs, None);
        assert_eq!(state.latency_secs, None);
        assert!(state.output().is_none());
        assert_eq!(state.elapsed_secs(), 0.0);
    }
}
