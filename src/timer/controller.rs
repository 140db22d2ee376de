use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::error::UsageError;

use super::{TimerOutput, TimerState, TimerStatus};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Live elapsed-time reading for display. Never feeds the recorded duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElapsedSample {
    pub status: TimerStatus,
    pub elapsed_secs: f64,
}

impl ElapsedSample {
    fn idle() -> Self {
        Self {
            status: TimerStatus::Idle,
            elapsed_secs: 0.0,
        }
    }

    fn from_state(state: &TimerState) -> Self {
        Self {
            status: state.status,
            elapsed_secs: state.elapsed_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub elapsed_secs: f64,
}

/// Interval timer for one capture session.
///
/// Not `Clone`: a session owns its controller outright. While running, a
/// background task publishes [`ElapsedSample`]s on a watch channel; `stop` and
/// `reset` cancel that task before returning.
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    ticker: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    sample_interval: Duration,
    samples_tx: Arc<watch::Sender<ElapsedSample>>,
}

impl TimerController {
    pub fn new() -> Self {
        Self::with_sample_interval(DEFAULT_SAMPLE_INTERVAL)
    }

    pub fn with_sample_interval(sample_interval: Duration) -> Self {
        let (samples_tx, _) = watch::channel(ElapsedSample::idle());
        Self {
            state: Arc::new(Mutex::new(TimerState::new())),
            ticker: None,
            cancel_token: None,
            sample_interval,
            samples_tx: Arc::new(samples_tx),
        }
    }

    /// Receiver for live samples. It stays valid across start/reset cycles.
    pub fn subscribe(&self) -> watch::Receiver<ElapsedSample> {
        self.samples_tx.subscribe()
    }

    pub async fn status(&self) -> TimerStatus {
        self.state.lock().await.status
    }

    pub async fn output(&self) -> Option<TimerOutput> {
        self.state.lock().await.output()
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        let guard = self.state.lock().await;
        TimerSnapshot {
            elapsed_secs: guard.elapsed_secs(),
            state: guard.clone(),
        }
    }

    /// Starts timing from idle. Returns `false` when the call was ignored
    /// because the timer is running or holds a stopped measurement.
    pub async fn start(&mut self) -> bool {
        let started = {
            let mut state = self.state.lock().await;
            let started = state.start(Utc::now(), Instant::now());
            if started {
                self.samples_tx.send_replace(ElapsedSample::from_state(&state));
            }
            started
        };

        if !started {
            log_debug!("timer start ignored; timer is not idle");
            return false;
        }

        self.spawn_ticker().await;
        true
    }

    pub async fn stop(
        &mut self,
        previous_stop: Option<DateTime<Utc>>,
    ) -> Result<TimerOutput, UsageError> {
        let output = {
            let mut state = self.state.lock().await;
            let output = match state.stop(Utc::now(), previous_stop) {
                Ok(output) => output,
                Err(err) => {
                    log_warn!("timer stop rejected: {err}");
                    return Err(err);
                }
            };
            // Cancel while the state lock is held so the ticker cannot publish
            // another running sample after this point.
            if let Some(token) = self.cancel_token.take() {
                token.cancel();
            }
            self.samples_tx.send_replace(ElapsedSample::from_state(&state));
            output
        };

        self.join_ticker().await;
        Ok(output)
    }

    pub async fn reset(&mut self) {
        {
            let mut state = self.state.lock().await;
            state.reset();
            if let Some(token) = self.cancel_token.take() {
                token.cancel();
            }
            self.samples_tx.send_replace(ElapsedSample::idle());
        }

        self.join_ticker().await;
    }

    async fn spawn_ticker(&mut self) {
        self.join_ticker().await;

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sampling_loop(
            self.state.clone(),
            self.samples_tx.clone(),
            self.sample_interval,
            cancel_token.clone(),
        ));

        self.ticker = Some(handle);
        self.cancel_token = Some(cancel_token);
    }

    async fn join_ticker(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Default for TimerController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimerController {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

async fn sampling_loop(
    state: Arc<Mutex<TimerState>>,
    samples_tx: Arc<watch::Sender<ElapsedSample>>,
    every: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                let guard = state.lock().await;
                if guard.status != TimerStatus::Running || cancel_token.is_cancelled() {
                    break;
                }
                samples_tx.send_replace(ElapsedSample::from_state(&guard));
            }
        }
    }

    log_debug!("timer sampling loop exited");
}
