//! Session events

use fixfit_core::AnalysisResult;
use tokio::sync::broadcast;

/// Why a completed analysis call was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The session was stopped while the call was in flight
    Inactive,
    /// The session was stopped and started again while the call was in flight
    StaleEpoch,
    /// A response to a later frame has already been applied
    Superseded,
}

/// Transitions of the session state, in the order they were applied
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Capture started
    Started {
        /// Epoch opened by this start
        epoch: u64,
    },
    /// Capture stopped
    Stopped,
    /// Result and error cleared
    Reset,
    /// A new analysis result is displayed
    ResultApplied {
        /// Dispatch sequence number of the frame
        seq: u64,
        /// The result now displayed
        result: Box<AnalysisResult>,
    },
    /// A new error message is displayed
    ErrorRecorded {
        /// Dispatch sequence number, absent for errors outside the frame pipeline
        seq: Option<u64>,
        /// Message shown to the user
        message: String,
    },
    /// A late response was dropped
    ResponseDiscarded {
        /// Dispatch sequence number of the frame
        seq: u64,
        /// Why it was dropped
        reason: DiscardReason,
    },
}

/// Stream of session events
#[derive(Debug)]
pub struct EventStream {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<SessionEvent>) -> Self {
        Self { receiver }
    }

    /// Next event, or `None` once the session is gone.
    ///
    /// Events missed because the reader fell behind are skipped.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "Session event reader lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next event if one is already queued
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
