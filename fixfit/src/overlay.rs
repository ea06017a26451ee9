//! Feedback overlay model
//!
//! Everything the camera overlay shows, derived from a [`SessionState`]
//! snapshot. Renderers can draw the fields directly or print the `Display`
//! form.

use crate::coordinator::SessionState;
use fixfit_core::{Feedback, SquatPhase};
use std::fmt;

/// Label of the indicator shown while frames are analyzed
pub const ANALYZING_LABEL: &str = "ANALYZING";

/// Correction badge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackBadge {
    /// Correction cue, or the feedback's default label
    pub text: String,
    /// Feedback category the badge is styled after
    pub feedback: Feedback,
    /// Whether the badge uses error styling
    pub is_error: bool,
}

/// What the camera overlay shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedbackOverlay {
    /// Show the analyzing indicator
    pub analyzing: bool,
    /// Rep counter, once a result is available
    pub rep_count: Option<u32>,
    /// Current squat phase, once a result is available
    pub phase: Option<SquatPhase>,
    /// Correction badge, once a result is available
    pub badge: Option<FeedbackBadge>,
    /// Error banner
    pub error_banner: Option<String>,
}

impl FeedbackOverlay {
    /// Overlay for a state snapshot
    pub fn from_state(state: &SessionState) -> Self {
        let result = state.latest_result.as_ref();

        Self {
            analyzing: state.is_active,
            rep_count: result.map(|r| r.rep_count),
            phase: result.map(|r| r.current_state),
            badge: result.map(|r| FeedbackBadge {
                text: r.badge_text().to_string(),
                feedback: r.feedback,
                is_error: !r.is_form_valid,
            }),
            error_banner: state.latest_error.clone(),
        }
    }

    /// Whether nothing would be drawn
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<&SessionState> for FeedbackOverlay {
    fn from(state: &SessionState) -> Self {
        Self::from_state(state)
    }
}

impl fmt::Display for FeedbackOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();

        if self.analyzing {
            lines.push(format!("[{}]", ANALYZING_LABEL));
        }
        if let Some(reps) = self.rep_count {
            lines.push(format!("REPS: {}", reps));
        }
        if let Some(phase) = self.phase {
            lines.push(format!("PHASE: {}", phase.as_str()));
        }
        if let Some(badge) = &self.badge {
            let marker = if badge.is_error { "!" } else { "*" };
            lines.push(format!("{} {}", marker, badge.text));
        }
        if let Some(error) = &self.error_banner {
            lines.push(format!("ERROR: {}", error));
        }

        write!(f, "{}", lines.join("\n"))
    }
}
