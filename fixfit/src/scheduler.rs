//! Fixed-cadence capture ticks
//!
//! The scheduler fires a callback every interval. It never waits for work
//! started by a previous tick, so the callback must hand slow work off to a
//! task of its own.

use crate::{FixFitError, FixFitResult};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No ticks are fired
    Idle,
    /// Ticks are fired at a fixed period
    Running,
}

/// Fires capture ticks at a fixed period
#[derive(Debug, Default)]
pub struct CaptureScheduler {
    task: Option<JoinHandle<()>>,
    interval: Option<Duration>,
}

impl CaptureScheduler {
    /// Idle scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> SchedulerState {
        match &self.task {
            Some(task) if !task.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Idle,
        }
    }

    /// Whether ticks are being fired
    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Period of the current run
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Call `on_tick` every `interval`, starting one interval from now.
    ///
    /// The callback receives the tick number, starting at 1. A run already in
    /// progress is stopped first. Must be called within a Tokio runtime.
    pub fn start<F>(&mut self, interval: Duration, mut on_tick: F) -> FixFitResult<()>
    where
        F: FnMut(u64) + Send + 'static,
    {
        if interval.is_zero() {
            return Err(FixFitError::InvalidConfiguration {
                message: "Capture interval must be greater than zero".to_string(),
            });
        }

        self.stop();

        let mut ticker = interval_at(Instant::now() + interval, interval);
        // A stalled runtime must not cause a burst of catch-up captures
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.task = Some(tokio::spawn(async move {
            let mut tick = 0u64;
            loop {
                ticker.tick().await;
                tick += 1;
                on_tick(tick);
            }
        }));
        self.interval = Some(interval);

        debug!(interval_ms = interval.as_millis() as u64, "Capture scheduler started");
        Ok(())
    }

    /// Stop firing ticks. No effect when idle.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.interval = None;
            debug!("Capture scheduler stopped");
        }
    }
}

impl Drop for CaptureScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
