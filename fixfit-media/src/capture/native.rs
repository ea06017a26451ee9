//! Native camera capture through nokhwa
//!
//! nokhwa cameras are not `Send`, so each stream owns a dedicated capture
//! thread that opens the device, decodes frames into a shared [`FrameBuffer`]
//! and stops the device when asked. The async side only ever touches the
//! buffer.

use super::{CaptureBackend, CaptureConstraints, CaptureStream, FacingMode, VideoDevice, VideoResolution};
use crate::error::{MediaError, MediaResult};
use crate::tracks::{TrackInfo, VideoFrame};
use bytes::Bytes;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

const OPEN_TIMEOUT: Duration = Duration::from_secs(10);
const CAPTURE_FRAMERATE: u32 = 30;

/// Latest decoded frame, shared between the capture thread and readers
#[derive(Debug, Default)]
pub struct FrameBuffer {
    current_frame: Mutex<Option<VideoFrame>>,
    frame_ready: AtomicBool,
}

impl FrameBuffer {
    pub fn update_frame(&self, frame: VideoFrame) {
        *self.current_frame.lock() = Some(frame);
        self.frame_ready.store(true, Ordering::Release);
    }

    /// Clone of the latest frame; the buffer keeps it for the next reader
    pub fn latest_frame(&self) -> Option<VideoFrame> {
        if !self.has_frame() {
            return None;
        }
        self.current_frame.lock().clone()
    }

    pub fn has_frame(&self) -> bool {
        self.frame_ready.load(Ordering::Acquire)
    }
}

/// Camera backend over the platform's native capture API
#[derive(Debug, Default)]
pub struct NokhwaBackend;

impl NokhwaBackend {
    pub fn new() -> Self {
        Self
    }

    /// Devices paired with the index nokhwa reported for them. Indices are
    /// not contiguous on every platform, so the pair is what gets opened.
    fn query_cameras() -> MediaResult<Vec<(CameraIndex, VideoDevice)>> {
        let cameras = nokhwa::query(ApiBackend::Auto).map_err(|e| {
            MediaError::DeviceEnumerationFailed {
                reason: e.to_string(),
            }
        })?;

        Ok(cameras
            .into_iter()
            .map(|info| {
                let device = VideoDevice {
                    id: info.index().to_string(),
                    name: info.human_name(),
                    description: info.description().to_string(),
                    facing: None,
                };
                (info.index().clone(), device)
            })
            .collect())
    }

    /// Pick a camera for the requested facing mode.
    ///
    /// Platforms do not report orientation through nokhwa; built-in front
    /// cameras enumerate first, so front prefers the first device and back the
    /// last one.
    fn select_camera(
        cameras: &[(CameraIndex, VideoDevice)],
        facing: FacingMode,
    ) -> Option<&(CameraIndex, VideoDevice)> {
        match facing {
            FacingMode::Front => cameras.first(),
            FacingMode::Back => cameras.last(),
        }
    }
}

impl CaptureBackend for NokhwaBackend {
    fn name(&self) -> &str {
        "nokhwa"
    }

    fn list_devices(&self) -> MediaResult<Vec<VideoDevice>> {
        Ok(Self::query_cameras()?
            .into_iter()
            .map(|(_, device)| device)
            .collect())
    }

    fn open(&self, constraints: &CaptureConstraints) -> MediaResult<Box<dyn CaptureStream>> {
        let cameras = Self::query_cameras()?;
        let (index, device) = Self::select_camera(&cameras, constraints.facing)
            .cloned()
            .ok_or_else(|| MediaError::DeviceNotFound {
                device_id: "default".to_string(),
            })?;
        let ideal = constraints.ideal_resolution;

        let buffer = Arc::new(FrameBuffer::default());
        let running = Arc::new(AtomicBool::new(true));
        let (open_tx, open_rx) = mpsc::sync_channel::<MediaResult<VideoResolution>>(1);

        let thread_buffer = buffer.clone();
        let thread_running = running.clone();
        let thread_name = format!("fixfit-camera-{}", index);
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || capture_thread(index, ideal, open_tx, thread_buffer, thread_running))
            .map_err(|e| MediaError::DeviceUnavailable {
                reason: format!("Failed to spawn capture thread: {}", e),
            })?;

        let resolution = match open_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                running.store(false, Ordering::SeqCst);
                return Err(MediaError::DeviceUnavailable {
                    reason: format!("{} did not open within {:?}", device.name, OPEN_TIMEOUT),
                });
            }
        };

        info!(device = %device.name, resolution = %resolution, "Native camera stream opened");

        Ok(Box::new(NokhwaStream {
            tracks: vec![TrackInfo::video(device.name.clone())],
            device,
            resolution,
            buffer,
            running,
            handle: Some(handle),
        }))
    }
}

fn capture_thread(
    index: CameraIndex,
    ideal: VideoResolution,
    open_tx: mpsc::SyncSender<MediaResult<VideoResolution>>,
    buffer: Arc<FrameBuffer>,
    running: Arc<AtomicBool>,
) {
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
        CameraFormat::new(
            Resolution::new(ideal.width, ideal.height),
            FrameFormat::MJPEG,
            CAPTURE_FRAMERATE,
        ),
    ));

    let mut camera = match Camera::new(index.clone(), requested) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = open_tx.send(Err(MediaError::DeviceUnavailable {
                reason: format!("camera {}: {}", index, e),
            }));
            return;
        }
    };
    if let Err(e) = camera.open_stream() {
        let _ = open_tx.send(Err(MediaError::PermissionDenied {
            operation: format!("stream from camera {}: {}", index, e),
        }));
        return;
    }

    let native = camera.resolution();
    let _ = open_tx.send(Ok(VideoResolution::new(native.width(), native.height())));

    while running.load(Ordering::SeqCst) {
        let decoded = camera
            .frame()
            .and_then(|raw| raw.decode_image::<RgbFormat>());

        match decoded {
            Ok(image) => {
                let (width, height) = (image.width(), image.height());
                buffer.update_frame(VideoFrame {
                    width,
                    height,
                    data: Bytes::from(image.into_raw()),
                    timestamp: chrono::Utc::now().timestamp_millis(),
                });
            }
            Err(e) => {
                warn!(error = %e, "Dropping undecodable camera frame");
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    }

    if let Err(e) = camera.stop_stream() {
        warn!(error = %e, "Camera did not stop cleanly");
    }
    debug!(index = %index, "Capture thread exited");
}

struct NokhwaStream {
    device: VideoDevice,
    resolution: VideoResolution,
    buffer: Arc<FrameBuffer>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    tracks: Vec<TrackInfo>,
}

impl CaptureStream for NokhwaStream {
    fn device(&self) -> &VideoDevice {
        &self.device
    }

    fn resolution(&self) -> VideoResolution {
        self.resolution
    }

    fn latest_frame(&self) -> Option<VideoFrame> {
        if !self.running.load(Ordering::SeqCst) {
            return None;
        }
        self.buffer.latest_frame()
    }

    fn tracks(&self) -> Vec<TrackInfo> {
        self.tracks.clone()
    }

    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.running.store(false, Ordering::SeqCst);
        if handle.join().is_err() {
            warn!(device = %self.device.name, "Capture thread panicked");
        }
        for track in &mut self.tracks {
            track.end();
        }
        info!(device = %self.device.name, "Native camera stream stopped");
    }
}

impl Drop for NokhwaStream {
    fn drop(&mut self) {
        self.stop();
    }
}
