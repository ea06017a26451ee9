//! Live analysis session
//!
//! A [`LiveSession`] owns the camera for its whole lifetime. While started,
//! every tick encodes the current frame and sends it for analysis on its own
//! task; the coordinator decides whether the response is displayed. Dropping
//! the session stops the ticks and releases the camera.

use crate::config::{CaptureConfig, GlobalConfig};
use crate::coordinator::{FrameOutcome, SessionCoordinator, SessionState};
use crate::event::EventStream;
use crate::overlay::FeedbackOverlay;
use crate::scheduler::CaptureScheduler;
use crate::FixFitResult;
use fixfit_core::{AnalysisService, ClientConfig, HttpAnalysisClient};
use fixfit_diagnostics::{LatencyProfiler, LatencyReport};
use fixfit_media::{
    default_backend, CameraSession, CaptureBackend, CaptureDeviceManager, FacingMode,
    FrameEncoder, ImageFormat, MediaError, PreviewSurface, SessionStatus, VideoDevice,
    VideoFrame, VideoResolution,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Per-session capture counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureStats {
    /// Ticks fired by the scheduler
    pub ticks: u64,
    /// Ticks that found no frame to encode
    pub frames_skipped: u64,
    /// Frames encoded and handed to the coordinator
    pub frames_encoded: u64,
    /// Ticks whose frame could not be encoded
    pub encode_failures: u64,
}

#[derive(Debug, Default)]
struct CaptureCounters {
    ticks: AtomicU64,
    skipped: AtomicU64,
    encoded: AtomicU64,
    failures: AtomicU64,
}

impl CaptureCounters {
    fn snapshot(&self) -> CaptureStats {
        CaptureStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            frames_skipped: self.skipped.load(Ordering::Relaxed),
            frames_encoded: self.encoded.load(Ordering::Relaxed),
            encode_failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Everything a tick needs, shared with the tick tasks
#[derive(Clone)]
struct TickContext {
    camera: Arc<Mutex<CameraSession>>,
    encoder: Arc<FrameEncoder>,
    coordinator: SessionCoordinator,
    counters: Arc<CaptureCounters>,
}

impl TickContext {
    async fn run(self, tick: u64) -> FrameOutcome {
        if !self.coordinator.is_active() {
            return FrameOutcome::NotDispatched;
        }

        let camera = self.camera.clone();
        let encoder = self.encoder.clone();
        let encoded = tokio::task::spawn_blocking(move || {
            grab_frame(&camera)
                .map(|frame| encoder.encode_now(&frame))
                .transpose()
        })
        .await;

        match encoded {
            Ok(Ok(Some(frame))) => {
                self.counters.encoded.fetch_add(1, Ordering::Relaxed);
                trace!(tick, bytes = frame.len(), "Frame encoded");
                self.coordinator.on_frame_captured(frame).await
            }
            Ok(Ok(None)) => {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
                trace!(tick, "No frame ready");
                FrameOutcome::NotDispatched
            }
            Ok(Err(e)) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(tick, error = %e, "Frame encoding failed");
                FrameOutcome::NotDispatched
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(tick, error = %e, "Encoding task failed");
                FrameOutcome::NotDispatched
            }
        }
    }
}

/// Copy of the camera's current frame. The camera lock is released on return,
/// so encoding never blocks release or status queries.
fn grab_frame(camera: &Mutex<CameraSession>) -> Option<VideoFrame> {
    camera.lock().current_frame()
}

/// Fluent builder for a live session
pub struct SessionBuilder {
    config: GlobalConfig,
    backend: Option<Arc<dyn CaptureBackend>>,
    surface: Option<Arc<dyn PreviewSurface>>,
    service: Option<Arc<dyn AnalysisService>>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Builder with default settings
    pub fn new() -> Self {
        Self::with_config(GlobalConfig::default())
    }

    /// Builder starting from an existing configuration
    pub fn with_config(config: GlobalConfig) -> Self {
        Self {
            config,
            backend: None,
            surface: None,
            service: None,
        }
    }

    /// Analysis service base address
    pub fn api_url(mut self, url: &str) -> Self {
        self.config.client.base_url = ClientConfig::with_base_url(url).base_url;
        self
    }

    /// Time between capture ticks
    pub fn capture_interval(mut self, interval: Duration) -> Self {
        self.config.capture.interval = interval;
        self
    }

    /// Ideal camera resolution
    pub fn resolution(mut self, resolution: VideoResolution) -> Self {
        self.config.capture.resolution = resolution;
        self
    }

    /// Preferred camera orientation
    pub fn facing(mut self, facing: FacingMode) -> Self {
        self.config.capture.facing = facing;
        self
    }

    /// Still image format sent for analysis
    pub fn image_format(mut self, format: ImageFormat) -> Self {
        self.config.capture.image_format = format;
        self
    }

    /// Lossy image quality in `(0.0, 1.0]`
    pub fn quality(mut self, quality: f32) -> Self {
        self.config.capture.quality = quality;
        self
    }

    /// Install a tracing subscriber when the session is built
    pub fn debug_logging(mut self, enabled: bool) -> Self {
        self.config.debug_logging = enabled;
        self
    }

    /// Camera backend; defaults to the platform backend
    pub fn backend(mut self, backend: Arc<dyn CaptureBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Surface the camera stream is shown on
    pub fn surface(mut self, surface: Arc<dyn PreviewSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Analysis service; defaults to the HTTP client for the configured address
    pub fn service(mut self, service: Arc<dyn AnalysisService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Validate the configuration, open the camera and build the session.
    ///
    /// An unavailable camera does not fail the build: the session comes up
    /// without capture and shows the camera error.
    pub async fn build(self) -> FixFitResult<LiveSession> {
        let config = self.config;
        config.capture.validate()?;

        if config.debug_logging {
            fixfit_diagnostics::init_logging()?;
        }

        let service: Arc<dyn AnalysisService> = match self.service {
            Some(service) => service,
            None => Arc::new(HttpAnalysisClient::new(config.client.clone())?),
        };

        let mut devices = CaptureDeviceManager::new(self.backend.unwrap_or_else(default_backend))
            .with_constraints(config.capture.constraints());
        if let Some(surface) = self.surface {
            devices = devices.with_surface(surface);
        }

        let encoder = FrameEncoder::new(config.capture.encoder_config())?;
        let coordinator =
            SessionCoordinator::with_profiler(service, Arc::new(LatencyProfiler::new()));

        let mut session = LiveSession {
            config,
            devices,
            camera: Arc::new(Mutex::new(CameraSession::new())),
            camera_error: None,
            encoder: Arc::new(encoder),
            coordinator,
            scheduler: CaptureScheduler::new(),
            counters: Arc::new(CaptureCounters::default()),
        };

        if let Err(e) = session.open_camera().await {
            warn!(error = %e, "Continuing without camera");
        }

        info!(
            backend = session.devices.backend_name(),
            camera = ?session.camera_status(),
            "Live session ready"
        );
        Ok(session)
    }
}

/// A camera feeding frames to the analysis service
pub struct LiveSession {
    config: GlobalConfig,
    devices: CaptureDeviceManager,
    camera: Arc<Mutex<CameraSession>>,
    camera_error: Option<MediaError>,
    encoder: Arc<FrameEncoder>,
    coordinator: SessionCoordinator,
    scheduler: CaptureScheduler,
    counters: Arc<CaptureCounters>,
}

impl std::fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSession")
            .field("camera", &self.camera_status())
            .field("scheduler", &self.scheduler.state())
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

impl LiveSession {
    /// Create a session builder
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Configuration the session was built with
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Capture settings in use
    pub fn capture_config(&self) -> &CaptureConfig {
        &self.config.capture
    }

    /// Acquire the camera if the session does not hold one.
    ///
    /// On failure the error is shown in the session state and kept as
    /// [`camera_error`](Self::camera_error).
    pub async fn open_camera(&mut self) -> FixFitResult<()> {
        if self.camera.lock().is_active() {
            return Ok(());
        }

        match self.devices.acquire().await {
            Ok(camera) => {
                *self.camera.lock() = camera;
                self.camera_error = None;
                Ok(())
            }
            Err(e) => {
                self.coordinator.record_error(e.to_string());
                self.camera_error = Some(e.clone());
                Err(e.into())
            }
        }
    }

    /// Status of the camera session
    pub fn camera_status(&self) -> SessionStatus {
        self.camera.lock().status()
    }

    /// Why the camera could not be acquired, if it could not
    pub fn camera_error(&self) -> Option<&MediaError> {
        self.camera_error.as_ref()
    }

    /// Native resolution of the open camera
    pub fn camera_resolution(&self) -> Option<VideoResolution> {
        self.camera.lock().resolution()
    }

    /// Devices the capture backend can open
    pub fn list_devices(&self) -> FixFitResult<Vec<VideoDevice>> {
        Ok(self.devices.list_devices()?)
    }

    /// Start analyzing frames.
    ///
    /// Without a camera the session becomes active but no ticks are fired,
    /// and the camera error stays on screen.
    pub fn start(&mut self) -> FixFitResult<()> {
        self.coordinator.start();

        if let Some(e) = &self.camera_error {
            self.coordinator.record_error(e.to_string());
            warn!("Session started without a camera");
            return Ok(());
        }

        let context = TickContext {
            camera: self.camera.clone(),
            encoder: self.encoder.clone(),
            coordinator: self.coordinator.clone(),
            counters: self.counters.clone(),
        };
        let counters = self.counters.clone();

        let started = self
            .scheduler
            .start(self.config.capture.interval, move |tick| {
                counters.ticks.fetch_add(1, Ordering::Relaxed);
                tokio::spawn(context.clone().run(tick));
            });
        if let Err(e) = started {
            self.coordinator.stop();
            return Err(e);
        }
        Ok(())
    }

    /// Stop analyzing. The last result stays visible.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.coordinator.stop();
    }

    /// Clear result and error locally
    pub fn reset(&self) {
        self.coordinator.reset();
    }

    /// Clear the service's rep and phase state, then the local state
    pub async fn reset_remote(&self) -> FixFitResult<()> {
        self.coordinator.service().reset_session().await?;
        self.coordinator.reset();
        debug!("Remote session reset");
        Ok(())
    }

    /// Probe the analysis service; never fails
    pub async fn check_health(&self) -> bool {
        self.coordinator.service().check_health().await
    }

    /// Whether frames are being analyzed
    pub fn is_active(&self) -> bool {
        self.coordinator.is_active()
    }

    /// Copy of the displayed state
    pub fn snapshot(&self) -> SessionState {
        self.coordinator.snapshot()
    }

    /// Overlay for the current state
    pub fn overlay(&self) -> FeedbackOverlay {
        FeedbackOverlay::from_state(&self.snapshot())
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> EventStream {
        self.coordinator.subscribe()
    }

    /// State coordinator, for render layers that hold on to it
    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.coordinator
    }

    /// Capture counters
    pub fn stats(&self) -> CaptureStats {
        self.counters.snapshot()
    }

    /// Analysis round-trip statistics
    pub fn latency(&self) -> LatencyReport {
        self.coordinator.profiler().report()
    }

    /// Stop analyzing and release the camera. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.stop();
        if self.camera.lock().release() {
            info!("Live session shut down");
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl From<&LiveSession> for FeedbackOverlay {
    fn from(session: &LiveSession) -> Self {
        session.overlay()
    }
}

/// Build a session from the environment with default capture settings
pub async fn connect() -> FixFitResult<LiveSession> {
    SessionBuilder::with_config(GlobalConfig::from_env()).build().await
}
