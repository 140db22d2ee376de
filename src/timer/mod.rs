pub mod controller;
pub mod state;

pub use controller::{ElapsedSample, TimerController, TimerSnapshot, DEFAULT_SAMPLE_INTERVAL};
pub use state::{TimerOutput, TimerState, TimerStatus};
