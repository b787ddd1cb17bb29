// SPDX-License-Identifier: MPL-2.0

//! Error types for the photo booth
//!
//! Every error here is recoverable: device errors send the session to its
//! error phase with a retry action, capture errors are retried locally and
//! export errors only skip the affected file.

use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Camera-related errors
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    /// Photo capture and compositing errors
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),
    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    /// Session control errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    /// Pose selection errors
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Storage/filesystem errors
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Capture device errors, as seen by the session
///
/// Host failures are classified into one of these kinds at the adapter
/// boundary so the session never has to know which backend produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The user or the platform refused camera access
    #[error("Camera permission denied")]
    PermissionDenied,
    /// No capture device is available
    #[error("No camera found on this device")]
    NoDeviceFound,
    /// The device is held by another application
    #[error("Camera is already in use by another application")]
    DeviceBusy,
    /// Anything else the host reported
    #[error("Unable to access camera: {0}")]
    Generic(String),
}

impl CameraError {
    /// Short status line for the camera page
    pub fn status_text(&self) -> &'static str {
        match self {
            CameraError::PermissionDenied => "Camera permission required",
            CameraError::NoDeviceFound | CameraError::DeviceBusy | CameraError::Generic(_) => {
                "Camera error"
            }
        }
    }
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhotoError {
    /// The stream is open but has not produced a frame yet
    #[error("No frame available for capture")]
    FrameNotReady,
    /// Frame buffer does not match its declared dimensions
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
    /// Encoding failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Export errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// The host refused to deliver one file
    #[error("Download of {file_name} blocked: {reason}")]
    Blocked { file_name: String, reason: String },
}

/// Session control errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A session needs at least one pose
    #[error("No poses selected")]
    NoPosesSelected,
    /// Finish was requested before every slot was filled
    #[error("Please wait for all photos to be captured ({filled}/{total})")]
    Incomplete { filled: usize, total: usize },
    /// Slot index past the end of the session
    #[error("Slot {0} does not exist")]
    NoSuchSlot(usize),
    /// The requested action is not valid in the current phase
    #[error("Cannot {action} while {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: &'static str,
    },
}

/// Pose selection errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The id is not in the catalog
    #[error("Unknown pose id {0}")]
    UnknownPose(u32),
    /// Countdown length must be positive
    #[error("Timer must be at least one second")]
    InvalidTimer,
}

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Reading or writing the config file failed
    #[error("Config I/O failed: {0}")]
    Io(String),
    /// The config file is not valid JSON for this version
    #[error("Config parse failed: {0}")]
    Parse(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(err: image::ImageError) -> Self {
        PhotoError::EncodingFailed(err.to_string())
    }
}
