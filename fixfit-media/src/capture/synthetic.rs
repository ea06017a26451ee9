//! Synthetic capture backend
//!
//! Produces a moving test pattern instead of camera frames. It stands in for a
//! camera when no native backend is compiled in, and lets tests script device
//! behaviour: slow first frames, denied permissions, missing devices.

use super::{CaptureBackend, CaptureConstraints, CaptureStream, FacingMode, VideoDevice, VideoResolution};
use crate::error::{MediaError, MediaResult};
use crate::tracks::{TrackInfo, VideoFrame, RGB24_BYTES_PER_PIXEL};
use bytes::Bytes;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Open/stop counters shared between a backend and the streams it opened
#[derive(Debug, Default)]
pub struct SyntheticStats {
    opened: AtomicUsize,
    stopped: AtomicUsize,
    frames: AtomicU64,
}

impl SyntheticStats {
    pub fn streams_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn streams_stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Streams opened and not yet stopped
    pub fn live_streams(&self) -> usize {
        self.streams_opened().saturating_sub(self.streams_stopped())
    }

    pub fn frames_produced(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Availability {
    Ready,
    Denied,
    NoDevice,
}

/// Test-pattern camera backend
#[derive(Debug)]
pub struct SyntheticBackend {
    device: VideoDevice,
    native_resolution: Option<VideoResolution>,
    warmup_polls: u32,
    availability: Availability,
    stats: Arc<SyntheticStats>,
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self {
            device: VideoDevice {
                id: "synthetic_camera_0".to_string(),
                name: "Synthetic Camera".to_string(),
                description: "Moving test pattern".to_string(),
                facing: Some(FacingMode::Front),
            },
            native_resolution: None,
            warmup_polls: 0,
            availability: Availability::Ready,
            stats: Arc::new(SyntheticStats::default()),
        }
    }

    /// Backend whose camera access is always refused
    pub fn denied() -> Self {
        Self {
            availability: Availability::Denied,
            ..Self::new()
        }
    }

    /// Backend with no camera attached
    pub fn without_devices() -> Self {
        Self {
            availability: Availability::NoDevice,
            ..Self::new()
        }
    }

    /// Report this resolution regardless of the requested ideal
    pub fn with_native_resolution(mut self, resolution: VideoResolution) -> Self {
        self.native_resolution = Some(resolution);
        self
    }

    /// Answer "no frame yet" for the first `polls` frame requests
    pub fn with_warmup(mut self, polls: u32) -> Self {
        self.warmup_polls = polls;
        self
    }

    pub fn stats(&self) -> Arc<SyntheticStats> {
        self.stats.clone()
    }
}

impl CaptureBackend for SyntheticBackend {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn list_devices(&self) -> MediaResult<Vec<VideoDevice>> {
        match self.availability {
            Availability::NoDevice => Ok(Vec::new()),
            _ => Ok(vec![self.device.clone()]),
        }
    }

    fn open(&self, constraints: &CaptureConstraints) -> MediaResult<Box<dyn CaptureStream>> {
        match self.availability {
            Availability::Denied => {
                return Err(MediaError::PermissionDenied {
                    operation: "camera access".to_string(),
                })
            }
            Availability::NoDevice => {
                return Err(MediaError::DeviceNotFound {
                    device_id: "default".to_string(),
                })
            }
            Availability::Ready => {}
        }

        let resolution = self
            .native_resolution
            .unwrap_or(constraints.ideal_resolution);
        if resolution.is_empty() {
            return Err(MediaError::InvalidConfiguration {
                message: format!("Cannot open a {} stream", resolution),
            });
        }

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        info!(device = %self.device.name, resolution = %resolution, "Synthetic stream opened");

        Ok(Box::new(SyntheticStream {
            device: self.device.clone(),
            resolution,
            warmup_polls: self.warmup_polls,
            polls: AtomicU32::new(0),
            tracks: vec![TrackInfo::video(self.device.name.clone())],
            stats: self.stats.clone(),
            stopped: false,
        }))
    }
}

struct SyntheticStream {
    device: VideoDevice,
    resolution: VideoResolution,
    warmup_polls: u32,
    polls: AtomicU32,
    tracks: Vec<TrackInfo>,
    stats: Arc<SyntheticStats>,
    stopped: bool,
}

impl SyntheticStream {
    fn render_pattern(&self, index: u32) -> Bytes {
        let VideoResolution { width, height } = self.resolution;
        let mut data =
            Vec::with_capacity(width as usize * height as usize * RGB24_BYTES_PER_PIXEL);
        let shift = index.wrapping_mul(4);

        for y in 0..height {
            for x in 0..width {
                data.push(x.wrapping_add(shift) as u8);
                data.push(y.wrapping_add(shift) as u8);
                data.push(shift as u8);
            }
        }

        Bytes::from(data)
    }
}

impl CaptureStream for SyntheticStream {
    fn device(&self) -> &VideoDevice {
        &self.device
    }

    fn resolution(&self) -> VideoResolution {
        self.resolution
    }

    fn latest_frame(&self) -> Option<VideoFrame> {
        if self.stopped {
            return None;
        }

        let poll = self.polls.fetch_add(1, Ordering::SeqCst);
        if poll < self.warmup_polls {
            return None;
        }

        self.stats.frames.fetch_add(1, Ordering::SeqCst);
        Some(VideoFrame {
            width: self.resolution.width,
            height: self.resolution.height,
            data: self.render_pattern(poll - self.warmup_polls),
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
    }

    fn tracks(&self) -> Vec<TrackInfo> {
        self.tracks.clone()
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }

        for track in &mut self.tracks {
            track.end();
        }
        self.stopped = true;
        self.stats.stopped.fetch_add(1, Ordering::SeqCst);
        debug!(device = %self.device.name, "Synthetic stream stopped");
    }
}
