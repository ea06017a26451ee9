//! # FixFit - Real-Time Squat Form Feedback
//!
//! FixFit samples a camera at a fixed cadence, sends each frame to a remote
//! pose-analysis service and keeps the latest structured feedback ready for
//! display.
//!
//! ## Key Features
//!
//! - **Guaranteed camera release**: the stream is torn down on every exit path
//! - **Fresh feedback**: ticks never wait for slow responses, and late
//!   responses never overwrite newer ones
//! - **Degraded mode**: a missing camera or an unreachable service shows an
//!   error instead of stopping the session
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fixfit::LiveSession;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fixfit::FixFitError> {
//!     let mut session = LiveSession::builder()
//!         .api_url("http://localhost:8000")
//!         .capture_interval(Duration::from_millis(100))
//!         .build()
//!         .await?;
//!
//!     session.start()?;
//!     tokio::time::sleep(Duration::from_secs(5)).await;
//!     println!("{}", session.overlay());
//!
//!     session.shutdown();
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use fixfit_core::{
    AnalysisError, AnalysisRequest, AnalysisResult, AnalysisService, ClientConfig, ErrorDetails,
    Feedback, HttpAnalysisClient, JointAngles, ProcessingInfo, SquatPhase,
};

pub use fixfit_media::{
    CameraSession, CaptureBackend, CaptureDeviceManager, EncodedFrame, FacingMode, FrameEncoder,
    HeadlessSurface, ImageFormat, MediaError, PreviewSurface, SessionStatus, SyntheticBackend,
    UnavailableBackend, VideoResolution,
};

pub use fixfit_diagnostics::{init_logging, LatencyProfiler, LatencyReport};

// Public API modules
pub mod config;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod overlay;
pub mod scheduler;
pub mod session;

// Re-export main API types
pub use config::{CaptureConfig, GlobalConfig, DEFAULT_CAPTURE_INTERVAL};
pub use coordinator::{FrameOutcome, SessionCoordinator, SessionState};
pub use error::{FixFitError, FixFitResult};
pub use event::{DiscardReason, EventStream, SessionEvent};
pub use overlay::{FeedbackBadge, FeedbackOverlay, ANALYZING_LABEL};
pub use scheduler::{CaptureScheduler, SchedulerState};
pub use session::{connect, CaptureStats, LiveSession, SessionBuilder};
