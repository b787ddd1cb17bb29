// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │   Session (app)     │
//! └──────────┬──────────┘
//!            │ open / close / current_frame
//!            ▼
//! ┌─────────────────────┐
//! │    CaptureDevice    │  ← one stream at a time, error classification
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← host capability
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!    ┌──────┐  ┌───────┐
//!    │ V4L2 │  │Virtual│
//!    └──────┘  └───────┘
//! ```

pub mod manager;
pub mod types;
pub mod v4l2;

pub use manager::CaptureDevice;
pub use types::*;

/// Host media-capture capability
///
/// Backends only report host-level [`BackendError`]s; classification into the
/// session's error kinds happens in [`CaptureDevice`].
pub trait CameraBackend: Send {
    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;

    /// Check if this backend is usable on the current system
    fn is_available(&self) -> bool;

    /// Ask the host for camera access
    ///
    /// For browser-like hosts this is the permission prompt; for V4L2 it is a
    /// check of device node permissions.
    fn request_access(&mut self) -> BackendResult<()>;

    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Start streaming from `device`
    ///
    /// Callers stop any previous stream first; backends are free to refuse a
    /// second concurrent stream.
    fn start_stream(
        &mut self,
        device: &CameraDevice,
        constraints: &StreamConstraints,
    ) -> BackendResult<StreamHandle>;

    /// Stop a stream; unknown ids are ignored
    fn stop_stream(&mut self, id: StreamId);

    /// Latest decoded frame, or `None` while the stream is warming up
    fn latest_frame(&mut self, id: StreamId) -> Option<CameraFrame>;
}

/// Get a concrete backend instance for a backend type
pub fn get_backend_for_type(backend_type: CameraBackendType) -> Box<dyn CameraBackend> {
    match backend_type {
        CameraBackendType::V4l2 => Box::new(v4l2::V4l2Backend::new()),
        CameraBackendType::Virtual => Box::new(crate::backends::virtual_camera::VirtualCamera::default()),
    }
}
