// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! Produces deterministic frames without hardware: a solid colour, a gradient
//! test pattern, or a still image loaded from disk. The permission outcome,
//! a busy device and a warm-up delay are configurable so every device path of
//! the session can be exercised headlessly.
//!
//! ```text
//! FrameSource ──► VirtualCamera ──► CaptureDevice ──► Session
//!                      │
//!                      └──► VirtualCameraStats (stream counters)
//! ```

mod file_source;

pub use file_source::{is_image_extension, load_image};

use crate::backends::camera::CameraBackend;
use crate::backends::camera::types::*;
use image::RgbaImage;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Result of the simulated permission prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionOutcome {
    #[default]
    Granted,
    Denied,
}

/// What the virtual camera shows
#[derive(Debug, Clone)]
pub enum FrameSource {
    /// Every pixel the same RGBA colour
    Solid([u8; 4]),
    /// Red grows left to right, green top to bottom
    Gradient,
    /// A still image at its native size
    Image(Arc<RgbaImage>),
}

/// Virtual camera behaviour
#[derive(Debug, Clone)]
pub struct VirtualCameraConfig {
    pub devices: Vec<CameraDevice>,
    pub permission: PermissionOutcome,
    /// Refuse to start streams as if another process held the device
    pub busy: bool,
    /// Frame requests answered with "not ready" after each stream start
    pub warmup_polls: u32,
    pub source: FrameSource,
}

impl Default for VirtualCameraConfig {
    fn default() -> Self {
        Self {
            devices: default_devices(),
            permission: PermissionOutcome::Granted,
            busy: false,
            warmup_polls: 0,
            source: FrameSource::Gradient,
        }
    }
}

fn default_devices() -> Vec<CameraDevice> {
    vec![
        CameraDevice {
            name: "Virtual Camera (front)".to_string(),
            path: "virtual:0".to_string(),
            facing: Some(FacingMode::User),
            device_info: None,
        },
        CameraDevice {
            name: "Virtual Camera (rear)".to_string(),
            path: "virtual:1".to_string(),
            facing: Some(FacingMode::Environment),
            device_info: None,
        },
    ]
}

#[derive(Debug, Default)]
struct StreamCounters {
    streams_started: usize,
    active_streams: usize,
    max_active_streams: usize,
    frames_served: usize,
    last_device: Option<String>,
}

/// Shared view on what a [`VirtualCamera`] has done
///
/// Kept by callers after the camera itself has been boxed into an adapter.
#[derive(Debug, Clone, Default)]
pub struct VirtualCameraStats {
    counters: Arc<Mutex<StreamCounters>>,
}

impl VirtualCameraStats {
    fn with<T>(&self, f: impl FnOnce(&mut StreamCounters) -> T) -> T {
        let mut guard = match self.counters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    pub fn streams_started(&self) -> usize {
        self.with(|c| c.streams_started)
    }

    pub fn active_streams(&self) -> usize {
        self.with(|c| c.active_streams)
    }

    /// Highest number of simultaneously open streams ever observed
    pub fn max_active_streams(&self) -> usize {
        self.with(|c| c.max_active_streams)
    }

    pub fn frames_served(&self) -> usize {
        self.with(|c| c.frames_served)
    }

    /// Path of the device most recently opened
    pub fn last_device(&self) -> Option<String> {
        self.with(|c| c.last_device.clone())
    }
}

struct OpenStream {
    id: StreamId,
    width: u32,
    height: u32,
    warmup_remaining: u32,
    /// Rendered once per stream so every poll returns the same pixels
    frame: CameraFrame,
}

/// Hardware-free camera backend
pub struct VirtualCamera {
    config: VirtualCameraConfig,
    stats: VirtualCameraStats,
    next_id: u64,
    open: Option<OpenStream>,
}

impl VirtualCamera {
    pub fn new(config: VirtualCameraConfig) -> Self {
        Self {
            config,
            stats: VirtualCameraStats::default(),
            next_id: 1,
            open: None,
        }
    }

    /// Virtual camera showing a still image from disk
    pub fn from_image_file(path: &Path) -> BackendResult<Self> {
        let image = load_image(path)?;
        Ok(Self::new(VirtualCameraConfig {
            source: FrameSource::Image(Arc::new(image)),
            ..Default::default()
        }))
    }

    pub fn stats(&self) -> VirtualCameraStats {
        self.stats.clone()
    }

    fn render(&self, width: u32, height: u32) -> CameraFrame {
        match &self.config.source {
            FrameSource::Solid(color) => {
                let image = RgbaImage::from_pixel(width, height, image::Rgba(*color));
                CameraFrame::from_image(&image)
            }
            FrameSource::Gradient => {
                let image = RgbaImage::from_fn(width, height, |x, y| {
                    let r = (x * 255 / width.max(1)) as u8;
                    let g = (y * 255 / height.max(1)) as u8;
                    image::Rgba([r, g, 128, 255])
                });
                CameraFrame::from_image(&image)
            }
            FrameSource::Image(image) => CameraFrame::from_image(image),
        }
    }
}

impl Default for VirtualCamera {
    fn default() -> Self {
        Self::new(VirtualCameraConfig::default())
    }
}

impl CameraBackend for VirtualCamera {
    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }

    fn is_available(&self) -> bool {
        true
    }

    fn request_access(&mut self) -> BackendResult<()> {
        match self.config.permission {
            PermissionOutcome::Granted => Ok(()),
            PermissionOutcome::Denied => Err(BackendError::AccessDenied(
                "virtual permission prompt declined".to_string(),
            )),
        }
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.config.devices.clone()
    }

    fn start_stream(
        &mut self,
        device: &CameraDevice,
        constraints: &StreamConstraints,
    ) -> BackendResult<StreamHandle> {
        if self.config.permission == PermissionOutcome::Denied {
            return Err(BackendError::AccessDenied(device.path.clone()));
        }
        if self.config.busy {
            return Err(BackendError::NotReadable(format!("{} is busy", device.path)));
        }
        if !self.config.devices.iter().any(|d| d.path == device.path) {
            return Err(BackendError::DeviceNotFound(device.path.clone()));
        }
        if self.open.is_some() {
            return Err(BackendError::NotReadable(
                "virtual camera already streaming".to_string(),
            ));
        }

        let (width, height) = match &self.config.source {
            FrameSource::Image(image) => image.dimensions(),
            _ => (constraints.width, constraints.height),
        };

        let id = StreamId(self.next_id);
        self.next_id += 1;
        let frame = self.render(width, height);
        self.open = Some(OpenStream {
            id,
            width,
            height,
            warmup_remaining: self.config.warmup_polls,
            frame,
        });

        self.stats.with(|c| {
            c.streams_started += 1;
            c.active_streams += 1;
            c.max_active_streams = c.max_active_streams.max(c.active_streams);
            c.last_device = Some(device.path.clone());
        });
        info!(stream = id.0, device = %device.name, width, height, "Virtual stream started");

        Ok(StreamHandle {
            id,
            device: device.clone(),
            width,
            height,
        })
    }

    fn stop_stream(&mut self, id: StreamId) {
        if self.open.as_ref().is_some_and(|s| s.id == id) {
            self.open = None;
            self.stats.with(|c| c.active_streams = c.active_streams.saturating_sub(1));
            debug!(stream = id.0, "Virtual stream stopped");
        }
    }

    fn latest_frame(&mut self, id: StreamId) -> Option<CameraFrame> {
        let stream = self.open.as_mut().filter(|s| s.id == id)?;
        if stream.warmup_remaining > 0 {
            stream.warmup_remaining -= 1;
            debug!(remaining = stream.warmup_remaining, "Virtual stream warming up");
            return None;
        }
        debug_assert_eq!(stream.frame.width, stream.width);
        debug_assert_eq!(stream.frame.height, stream.height);
        self.stats.with(|c| c.frames_served += 1);
        Some(stream.frame.clone())
    }
}
