//! Analysis service wire types
//!
//! These mirror the JSON contract of the remote biomechanical-analysis
//! service. The client only deserializes and validates shape; the values
//! themselves are computed remotely.

use crate::error::{AnalysisError, CoreResult};
use serde::{Deserialize, Serialize};

/// Largest joint angle the service reports, in degrees
pub const MAX_JOINT_ANGLE: f64 = 180.0;

/// Remote finite-state machine phase of the current squat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SquatPhase {
    /// Upright, between reps
    Standing,
    /// Moving down
    Descending,
    /// At the bottom of the movement
    Bottom,
    /// Moving up
    Ascending,
}

impl SquatPhase {
    /// Wire name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            SquatPhase::Standing => "STANDING",
            SquatPhase::Descending => "DESCENDING",
            SquatPhase::Bottom => "BOTTOM",
            SquatPhase::Ascending => "ASCENDING",
        }
    }
}

/// Form feedback category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feedback {
    /// Form is acceptable
    Perfect,
    /// Knees collapsing inward
    KneeValgus,
    /// Squat did not reach parallel depth
    DepthFail,
}

impl Feedback {
    /// Default correction label shown when the service sends no cue
    pub fn label(&self) -> &'static str {
        match self {
            Feedback::Perfect => "GOOD FORM",
            Feedback::KneeValgus => "WIDEN KNEES",
            Feedback::DepthFail => "GO DEEPER",
        }
    }

    /// Whether this feedback reports a form problem
    pub fn is_error(&self) -> bool {
        !matches!(self, Feedback::Perfect)
    }
}

/// Knee angle measurements in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    /// Left knee angle
    pub left_knee: f64,
    /// Right knee angle
    pub right_knee: f64,
    /// Average of both knees
    pub average: f64,
}

/// Error detection measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Knee distance over ankle distance; low values indicate valgus
    pub knee_valgus_ratio: f64,
    /// Whether the squat reached parallel depth
    pub depth_threshold_reached: bool,
}

/// Server-side processing metadata
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    /// Timestamp reported by the service for this frame
    pub timestamp: f64,
    /// Time the service spent on the frame
    pub processing_time_ms: f64,
}

/// Structured feedback for one analysed frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Current squat phase
    pub current_state: SquatPhase,
    /// Whether the current form is acceptable
    pub is_form_valid: bool,
    /// Human-readable correction, absent when form is valid
    #[serde(default)]
    pub correction_cue: Option<String>,
    /// Valid repetitions completed so far
    pub rep_count: u32,
    /// Feedback category
    pub feedback: Feedback,
    /// Measured joint angles
    pub joint_angles: JointAngles,
    /// Error detection details
    pub error_details: ErrorDetails,
    /// Processing metadata
    pub processing: ProcessingInfo,
}

impl AnalysisResult {
    /// Check the value constraints the service guarantees.
    ///
    /// Deserialization already enforces field presence, enum membership and
    /// non-negative rep counts.
    pub fn validate(&self) -> CoreResult<()> {
        let angles = [
            ("left_knee", self.joint_angles.left_knee),
            ("right_knee", self.joint_angles.right_knee),
            ("average", self.joint_angles.average),
        ];
        for (name, angle) in angles {
            if !angle.is_finite() || !(0.0..=MAX_JOINT_ANGLE).contains(&angle) {
                return Err(AnalysisError::MalformedResponse {
                    reason: format!("joint angle {} out of range: {}", name, angle),
                });
            }
        }

        let ratio = self.error_details.knee_valgus_ratio;
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(AnalysisError::MalformedResponse {
                reason: format!("knee_valgus_ratio must be >= 0, got {}", ratio),
            });
        }

        let elapsed = self.processing.processing_time_ms;
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(AnalysisError::MalformedResponse {
                reason: format!("processing_time_ms must be >= 0, got {}", elapsed),
            });
        }

        Ok(())
    }

    /// Text to show on the feedback badge
    pub fn badge_text(&self) -> &str {
        self.correction_cue
            .as_deref()
            .filter(|cue| !cue.is_empty())
            .unwrap_or_else(|| self.feedback.label())
    }
}

/// Request body for a single frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    /// Encoded image as a data URI
    pub frame_data: String,
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl AnalysisRequest {
    /// Build a request, rejecting payloads the service would refuse anyway
    pub fn new(frame_data: impl Into<String>, timestamp: i64) -> CoreResult<Self> {
        let frame_data = frame_data.into();
        if frame_data.is_empty() {
            return Err(AnalysisError::InvalidRequest {
                reason: "Missing frame_data".to_string(),
            });
        }
        if timestamp <= 0 {
            return Err(AnalysisError::InvalidRequest {
                reason: format!("timestamp must be positive, got {}", timestamp),
            });
        }

        Ok(Self {
            frame_data,
            timestamp,
        })
    }
}
