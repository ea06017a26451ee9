//! Analysis round-trip profiling
//!
//! Each analyzed frame contributes one sample: the client-observed round trip
//! and, when the service reported it, its own processing time. The difference
//! is time spent on the network and in encoding the request.

use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;

/// Accumulated round-trip statistics
#[derive(Debug, Default)]
pub struct LatencyProfiler {
    state: Mutex<ProfileState>,
}

#[derive(Debug, Default)]
struct ProfileState {
    samples: u64,
    total: Duration,
    max: Duration,
    last: Option<Duration>,
    server_samples: u64,
    server_total_ms: f64,
}

impl LatencyProfiler {
    /// Create new latency profiler
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed analysis request
    pub fn record(&self, round_trip: Duration, server_processing_ms: Option<f64>) {
        let mut state = self.state.lock();
        state.samples += 1;
        state.total += round_trip;
        state.max = state.max.max(round_trip);
        state.last = Some(round_trip);

        if let Some(ms) = server_processing_ms.filter(|ms| ms.is_finite() && *ms >= 0.0) {
            state.server_samples += 1;
            state.server_total_ms += ms;
        }
    }

    /// Current summary
    pub fn report(&self) -> LatencyReport {
        let state = self.state.lock();
        let mean_ms = match state.samples {
            0 => 0.0,
            n => duration_ms(state.total) / n as f64,
        };
        let mean_server_ms = match state.server_samples {
            0 => None,
            n => Some(state.server_total_ms / n as f64),
        };

        LatencyReport {
            samples: state.samples,
            mean_ms,
            max_ms: duration_ms(state.max),
            last_ms: state.last.map(duration_ms),
            mean_server_ms,
        }
    }

    /// Forget every sample
    pub fn reset(&self) {
        *self.state.lock() = ProfileState::default();
    }
}

fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Round-trip summary, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyReport {
    /// Number of recorded requests
    pub samples: u64,
    /// Mean client round trip
    pub mean_ms: f64,
    /// Slowest client round trip
    pub max_ms: f64,
    /// Most recent client round trip
    pub last_ms: Option<f64>,
    /// Mean processing time reported by the service
    pub mean_server_ms: Option<f64>,
}

impl LatencyReport {
    /// Mean time not accounted for by server processing
    pub fn mean_overhead_ms(&self) -> Option<f64> {
        self.mean_server_ms
            .map(|server| (self.mean_ms - server).max(0.0))
    }

    /// Report as a JSON object, for log lines and debug dumps
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
