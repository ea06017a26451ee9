//! Session state and its coordinator
//!
//! [`SessionState`] is what the render layer shows. It only changes through
//! its named transitions, and only the [`SessionCoordinator`] calls them.
//!
//! Ticks do not wait for earlier analysis calls, so responses can arrive in
//! any order. Every dispatched frame gets a sequence number, and a response
//! is applied only if nothing newer has been applied yet. Each `start()`
//! opens a new epoch; responses dispatched in an earlier epoch, or arriving
//! while stopped, are dropped.

use crate::event::{DiscardReason, EventStream, SessionEvent};
use fixfit_core::{AnalysisResult, AnalysisService, CoreResult};
use fixfit_diagnostics::LatencyProfiler;
use fixfit_media::EncodedFrame;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Displayed session state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    /// Whether frames are being analyzed
    pub is_active: bool,
    /// Most recent applied analysis result
    pub latest_result: Option<AnalysisResult>,
    /// Most recent error message, shown until cleared or superseded
    pub latest_error: Option<String>,
}

impl SessionState {
    /// Inactive, with no result and no error
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin analyzing; clears the error banner
    pub fn start(&mut self) {
        self.is_active = true;
        self.latest_error = None;
    }

    /// Stop analyzing; the last result stays visible
    pub fn stop(&mut self) {
        self.is_active = false;
    }

    /// Clear result and error without touching `is_active`
    pub fn reset(&mut self) {
        self.latest_result = None;
        self.latest_error = None;
    }

    /// A new result replaces the old one and clears the error
    pub fn receive_result(&mut self, result: AnalysisResult) {
        self.latest_result = Some(result);
        self.latest_error = None;
    }

    /// A new error replaces the old one; the last result stays visible
    pub fn receive_error(&mut self, message: impl Into<String>) {
        self.latest_error = Some(message.into());
    }
}

/// What happened to one captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The session was inactive; nothing was sent
    NotDispatched,
    /// The response was applied as the latest result
    ResultApplied {
        /// Dispatch sequence number
        seq: u64,
    },
    /// The failure was applied as the latest error
    ErrorRecorded {
        /// Dispatch sequence number
        seq: u64,
    },
    /// The response arrived but was dropped
    Discarded {
        /// Dispatch sequence number
        seq: u64,
        /// Why it was dropped
        reason: DiscardReason,
    },
}

#[derive(Debug, Default)]
struct SequencedState {
    state: SessionState,
    epoch: u64,
    last_applied_seq: u64,
}

impl SequencedState {
    fn discard_reason(&self, epoch: u64, seq: u64) -> Option<DiscardReason> {
        if !self.state.is_active {
            Some(DiscardReason::Inactive)
        } else if self.epoch != epoch {
            Some(DiscardReason::StaleEpoch)
        } else if seq <= self.last_applied_seq {
            Some(DiscardReason::Superseded)
        } else {
            None
        }
    }
}

struct CoordinatorInner {
    state: RwLock<SequencedState>,
    service: Arc<dyn AnalysisService>,
    next_seq: AtomicU64,
    profiler: Arc<LatencyProfiler>,
    event_tx: broadcast::Sender<SessionEvent>,
}

/// Single writer of [`SessionState`]
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("SessionCoordinator")
            .field("state", &state.state)
            .field("epoch", &state.epoch)
            .field("last_applied_seq", &state.last_applied_seq)
            .finish()
    }
}

impl SessionCoordinator {
    /// Coordinator sending frames to `service`
    pub fn new(service: Arc<dyn AnalysisService>) -> Self {
        Self::with_profiler(service, Arc::new(LatencyProfiler::new()))
    }

    /// Coordinator recording round trips into an existing profiler
    pub fn with_profiler(service: Arc<dyn AnalysisService>, profiler: Arc<LatencyProfiler>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(CoordinatorInner {
                state: RwLock::new(SequencedState::default()),
                service,
                next_seq: AtomicU64::new(0),
                profiler,
                event_tx,
            }),
        }
    }

    /// Begin analyzing frames and clear the error banner.
    ///
    /// Starting an inactive session opens a new epoch. Returns the current
    /// epoch.
    pub fn start(&self) -> u64 {
        let epoch = {
            let mut guard = self.inner.state.write();
            if !guard.state.is_active {
                guard.epoch += 1;
            }
            guard.state.start();
            guard.epoch
        };

        info!(epoch, "Session started");
        self.emit(SessionEvent::Started { epoch });
        epoch
    }

    /// Stop analyzing. Responses still in flight will be dropped.
    pub fn stop(&self) {
        let was_active = {
            let mut guard = self.inner.state.write();
            let was_active = guard.state.is_active;
            guard.state.stop();
            was_active
        };

        if was_active {
            info!("Session stopped");
            self.emit(SessionEvent::Stopped);
        }
    }

    /// Clear result and error. Does not change `is_active`.
    pub fn reset(&self) {
        self.inner.state.write().state.reset();
        debug!("Session state reset");
        self.emit(SessionEvent::Reset);
    }

    /// Show an error raised outside the frame pipeline, such as a camera failure
    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.inner.state.write().state.receive_error(message.clone());
        self.emit(SessionEvent::ErrorRecorded { seq: None, message });
    }

    /// Copy of the displayed state
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.read().state.clone()
    }

    /// Whether frames are currently analyzed
    pub fn is_active(&self) -> bool {
        self.inner.state.read().state.is_active
    }

    /// Current epoch; zero before the first start
    pub fn epoch(&self) -> u64 {
        self.inner.state.read().epoch
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.inner.event_tx.subscribe())
    }

    /// Service frames are sent to
    pub fn service(&self) -> Arc<dyn AnalysisService> {
        self.inner.service.clone()
    }

    /// Round-trip statistics of analyzed frames
    pub fn profiler(&self) -> Arc<LatencyProfiler> {
        self.inner.profiler.clone()
    }

    /// Send a captured frame for analysis and apply the outcome.
    ///
    /// Never fails: analysis errors become the displayed error, and late
    /// responses are dropped.
    pub async fn on_frame_captured(&self, frame: EncodedFrame) -> FrameOutcome {
        let (epoch, seq) = {
            let guard = self.inner.state.read();
            if !guard.state.is_active {
                return FrameOutcome::NotDispatched;
            }
            (guard.epoch, self.inner.next_seq.fetch_add(1, Ordering::SeqCst) + 1)
        };

        debug!(seq, epoch, timestamp = frame.timestamp_ms(), "Dispatching frame");
        let started = Instant::now();
        let outcome = self
            .inner
            .service
            .analyze(frame.data_uri(), frame.timestamp_ms())
            .await;

        if let Ok(result) = &outcome {
            self.inner
                .profiler
                .record(started.elapsed(), Some(result.processing.processing_time_ms));
        }

        self.complete(epoch, seq, outcome)
    }

    fn complete(&self, epoch: u64, seq: u64, outcome: CoreResult<AnalysisResult>) -> FrameOutcome {
        let (frame_outcome, event) = {
            let mut guard = self.inner.state.write();

            if let Some(reason) = guard.discard_reason(epoch, seq) {
                (
                    FrameOutcome::Discarded { seq, reason },
                    SessionEvent::ResponseDiscarded { seq, reason },
                )
            } else {
                guard.last_applied_seq = seq;
                match outcome {
                    Ok(result) => {
                        guard.state.receive_result(result.clone());
                        (
                            FrameOutcome::ResultApplied { seq },
                            SessionEvent::ResultApplied {
                                seq,
                                result: Box::new(result),
                            },
                        )
                    }
                    Err(e) => {
                        let message = e.to_string();
                        guard.state.receive_error(message.clone());
                        (
                            FrameOutcome::ErrorRecorded { seq },
                            SessionEvent::ErrorRecorded {
                                seq: Some(seq),
                                message,
                            },
                        )
                    }
                }
            }
        };

        match &event {
            SessionEvent::ResponseDiscarded { reason, .. } => {
                debug!(seq, ?reason, "Dropped late analysis response");
            }
            SessionEvent::ErrorRecorded { message, .. } => {
                warn!(seq, error = %message, "Frame analysis failed");
            }
            _ => {}
        }
        self.emit(event);
        frame_outcome
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.inner.event_tx.send(event);
    }
}
