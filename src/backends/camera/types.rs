// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::constants::{DEFAULT_TIMER_SECONDS, ResolutionTier};
use crate::errors::{CameraError, PhotoError};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// A decoded camera frame in RGBA (4 bytes per pixel)
///
/// The pixel data is reference counted so the session, the compositor and the
/// capture thread can share a frame without copying it.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    /// Bytes per row (at least `width * 4`)
    pub stride: u32,
    /// When the frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap tightly packed RGBA bytes
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    pub fn from_image(image: &RgbaImage) -> Self {
        Self::from_rgba(image.width(), image.height(), image.as_raw().clone())
    }

    /// Copy the frame into an owned image, dropping any row padding
    pub fn to_rgba_image(&self) -> Result<RgbaImage, PhotoError> {
        let row_bytes = self.width as usize * 4;
        let stride = self.stride as usize;
        if self.width == 0 || self.height == 0 {
            return Err(PhotoError::InvalidFrame("frame has no pixels".into()));
        }
        if stride < row_bytes {
            return Err(PhotoError::InvalidFrame(format!(
                "stride {} shorter than row {}",
                stride, row_bytes
            )));
        }
        let needed = stride * (self.height as usize - 1) + row_bytes;
        if self.data.len() < needed {
            return Err(PhotoError::InvalidFrame(format!(
                "expected at least {} bytes, got {}",
                needed,
                self.data.len()
            )));
        }

        let pixels: Vec<u8> = if stride == row_bytes {
            self.data[..row_bytes * self.height as usize].to_vec()
        } else {
            self.data
                .chunks(stride)
                .take(self.height as usize)
                .flat_map(|row| row[..row_bytes].iter().copied())
                .collect()
        };

        RgbaImage::from_raw(self.width, self.height, pixels)
            .ok_or_else(|| PhotoError::InvalidFrame("buffer size mismatch".into()))
    }
}

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraBackendType {
    /// Video4Linux2 capture devices
    #[default]
    V4l2,
    /// Synthetic or file-backed frames
    Virtual,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::Virtual => write!(f, "virtual"),
        }
    }
}

/// Which way the camera points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FacingMode {
    /// Towards the subject (selfie camera)
    #[default]
    User,
    /// Away from the subject
    Environment,
}

/// Device information from V4L2 capability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Name of the device (V4L2 card)
    pub card: String,
    /// Driver name (V4L2 driver)
    pub driver: String,
    /// Bus the device sits on
    pub bus_info: String,
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    /// Backend-specific path (e.g. /dev/video0)
    pub path: String,
    /// Facing reported by the platform, if any
    pub facing: Option<FacingMode>,
    pub device_info: Option<DeviceInfo>,
}

/// What the adapter asks a backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Ideal width; backends may pick the nearest supported size
    pub width: u32,
    pub height: u32,
    pub facing: FacingMode,
}

impl StreamConstraints {
    pub fn for_tier(tier: ResolutionTier, facing: FacingMode) -> Self {
        let (width, height) = tier.ideal_resolution();
        Self {
            width,
            height,
            facing,
        }
    }
}

/// Identifier of an open backend stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub u64);

/// An open stream as reported back to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHandle {
    pub id: StreamId,
    pub device: CameraDevice,
    /// Negotiated resolution
    pub width: u32,
    pub height: u32,
}

/// User-facing capture settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Countdown length in seconds (always > 0)
    pub timer_seconds: u32,
    /// Mirror the live preview horizontally
    pub mirrored: bool,
    pub resolution_tier: ResolutionTier,
    /// Index into the enumerated device list
    pub camera_index: usize,
    pub facing: FacingMode,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            timer_seconds: DEFAULT_TIMER_SECONDS,
            mirrored: true,
            resolution_tier: ResolutionTier::default(),
            camera_index: 0,
            facing: FacingMode::default(),
        }
    }
}

/// Adapter status shown next to the viewfinder
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceStatus {
    /// No stream held
    #[default]
    Closed,
    /// Waiting on the permission prompt
    PermissionPending,
    /// Stream open and usable
    Ready,
    /// Last acquisition failed
    Error(CameraError),
}

impl DeviceStatus {
    pub fn status_text(&self) -> String {
        match self {
            DeviceStatus::Closed => "Camera off".to_string(),
            DeviceStatus::PermissionPending => "Camera permission required".to_string(),
            DeviceStatus::Ready => "Camera ready".to_string(),
            DeviceStatus::Error(err) => err.to_string(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, DeviceStatus::Ready)
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Host-level failures reported by a backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Access refused by the user or the OS
    #[error("Access denied: {0}")]
    AccessDenied(String),
    /// Camera device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// Device cannot be read (usually held by another process)
    #[error("Device not readable: {0}")]
    NotReadable(String),
    /// Format not supported
    #[error("Format not supported: {0}")]
    FormatNotSupported(String),
    /// General I/O error
    #[error("I/O error: {0}")]
    IoError(String),
    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => BackendError::AccessDenied(err.to_string()),
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(err.to_string()),
            _ if err.raw_os_error() == Some(libc::EBUSY) => {
                BackendError::NotReadable(err.to_string())
            }
            _ => BackendError::IoError(err.to_string()),
        }
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::AccessDenied(_) => CameraError::PermissionDenied,
            BackendError::DeviceNotFound(_) => CameraError::NoDeviceFound,
            BackendError::NotReadable(_) => CameraError::DeviceBusy,
            BackendError::FormatNotSupported(msg)
            | BackendError::IoError(msg)
            | BackendError::Other(msg) => CameraError::Generic(msg),
        }
    }
}
