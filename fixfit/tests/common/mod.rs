//! Shared fixtures: a scripted analysis service and frame helpers

#![allow(dead_code)]

use async_trait::async_trait;
use fixfit::*;
use fixfit_core::CoreResult;
use fixfit_media::VideoFrame;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

pub type Reply = CoreResult<AnalysisResult>;

/// The result from the knee-valgus scenario
pub fn valgus_result(timestamp: f64) -> AnalysisResult {
    AnalysisResult {
        current_state: SquatPhase::Bottom,
        is_form_valid: false,
        correction_cue: Some("WIDEN KNEES".to_string()),
        rep_count: 3,
        feedback: Feedback::KneeValgus,
        joint_angles: JointAngles {
            left_knee: 84.0,
            right_knee: 86.0,
            average: 85.0,
        },
        error_details: ErrorDetails {
            knee_valgus_ratio: 0.72,
            depth_threshold_reached: true,
        },
        processing: ProcessingInfo {
            timestamp,
            processing_time_ms: 12.5,
        },
    }
}

pub fn result_with_reps(rep_count: u32) -> AnalysisResult {
    AnalysisResult {
        rep_count,
        is_form_valid: true,
        correction_cue: None,
        feedback: Feedback::Perfect,
        current_state: SquatPhase::Standing,
        ..valgus_result(1.0)
    }
}

pub fn rejected(detail: &str) -> AnalysisError {
    AnalysisError::AnalysisRejected {
        status: 500,
        detail: detail.to_string(),
    }
}

/// Small encoded frame stamped with `timestamp`
pub fn encoded_frame(timestamp: i64) -> EncodedFrame {
    let frame = VideoFrame {
        width: 4,
        height: 4,
        data: vec![96u8; 4 * 4 * 3].into(),
        timestamp,
    };
    FrameEncoder::default().encode_frame(&frame, timestamp).unwrap()
}

/// Analysis service whose replies are scripted per frame timestamp
#[derive(Default)]
pub struct ScriptedService {
    held: Mutex<HashMap<i64, oneshot::Receiver<Reply>>>,
    fallback: Mutex<Option<Reply>>,
    frames: Mutex<Vec<(String, i64)>>,
    calls: AtomicUsize,
    resets: AtomicUsize,
    reset_fails: AtomicBool,
    unhealthy: AtomicBool,
}

impl ScriptedService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer every frame that has no held reply with `reply`
    pub fn reply_with(&self, reply: Reply) {
        *self.fallback.lock() = Some(reply);
    }

    /// Keep the call for `timestamp` pending until the sender is used
    pub fn hold(&self, timestamp: i64) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.held.lock().insert(timestamp, rx);
        tx
    }

    pub fn fail_resets(&self) {
        self.reset_fails.store(true, Ordering::SeqCst);
    }

    pub fn set_unhealthy(&self) {
        self.unhealthy.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    /// Frame payloads and timestamps received, in call order
    pub fn frames(&self) -> Vec<(String, i64)> {
        self.frames.lock().clone()
    }

    /// Yield until `count` analyze calls have been made
    pub async fn wait_for_calls(&self, count: usize) {
        while self.calls() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl AnalysisService for ScriptedService {
    async fn analyze(&self, frame_data: &str, timestamp: i64) -> CoreResult<AnalysisResult> {
        let held = self.held.lock().remove(&timestamp);
        self.frames.lock().push((frame_data.to_string(), timestamp));
        self.calls.fetch_add(1, Ordering::SeqCst);

        match held {
            Some(rx) => rx.await.unwrap_or_else(|_| {
                Err(AnalysisError::TransportFailure {
                    reason: "reply dropped".to_string(),
                })
            }),
            None => {
                let fallback = self.fallback.lock().clone();
                fallback.unwrap_or_else(|| {
                    Err(AnalysisError::TransportFailure {
                        reason: "no scripted reply".to_string(),
                    })
                })
            }
        }
    }

    async fn reset_session(&self) -> CoreResult<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        if self.reset_fails.load(Ordering::SeqCst) {
            return Err(AnalysisError::TransportFailure {
                reason: "Reset failed: 502".to_string(),
            });
        }
        Ok(())
    }

    async fn check_health(&self) -> bool {
        !self.unhealthy.load(Ordering::SeqCst)
    }
}

/// Poll `condition` until it holds, failing after five seconds
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let polled = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "condition not met within five seconds");
}

