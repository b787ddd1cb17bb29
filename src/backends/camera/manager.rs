// SPDX-License-Identifier: GPL-3.0-only

//! Capture device adapter
//!
//! The adapter provides:
//! - Permission request and device enumeration
//! - At most one open stream, closed before any reopen
//! - Classification of host failures into [`CameraError`]
//! - Frame access for the compositor

use super::types::*;
use super::{CameraBackend, get_backend_for_type};
use crate::errors::{CameraError, PhotoError};
use tracing::{debug, info, warn};

/// Owns the single capture stream of a session
pub struct CaptureDevice {
    backend: Box<dyn CameraBackend>,
    status: DeviceStatus,
    permission_granted: bool,
    stream: Option<StreamHandle>,
}

impl CaptureDevice {
    /// Create an adapter over an existing backend
    pub fn new(backend: Box<dyn CameraBackend>) -> Self {
        info!(backend = %backend.backend_type(), "Creating capture device adapter");
        Self {
            backend,
            status: DeviceStatus::Closed,
            permission_granted: false,
            stream: None,
        }
    }

    /// Create an adapter for a backend type
    pub fn for_type(backend_type: CameraBackendType) -> Self {
        Self::new(get_backend_for_type(backend_type))
    }

    pub fn backend_type(&self) -> CameraBackendType {
        self.backend.backend_type()
    }

    pub fn status(&self) -> &DeviceStatus {
        &self.status
    }

    /// Human-readable status line
    pub fn status_text(&self) -> String {
        self.status.status_text()
    }

    /// Currently open stream, if any
    pub fn stream(&self) -> Option<&StreamHandle> {
        self.stream.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.status.is_ready() && self.stream.is_some()
    }

    /// Trigger the permission prompt and check a device exists
    pub fn request_permission(&mut self) -> Result<(), CameraError> {
        self.status = DeviceStatus::PermissionPending;

        if let Err(e) = self.backend.request_access() {
            return Err(self.fail(e.into()));
        }
        self.permission_granted = true;
        info!("Camera permission granted");

        if self.backend.enumerate_cameras().is_empty() {
            return Err(self.fail(CameraError::NoDeviceFound));
        }

        self.status = DeviceStatus::Closed;
        Ok(())
    }

    /// (Re)acquire a stream matching `settings`
    ///
    /// Any held stream is closed first, so at most one stream is open.
    pub fn open(&mut self, settings: &CaptureSettings) -> Result<StreamHandle, CameraError> {
        self.close();

        if !self.permission_granted {
            self.request_permission()?;
        }

        let devices = self.backend.enumerate_cameras();
        let Some(device) = select_device(&devices, settings) else {
            return Err(self.fail(CameraError::NoDeviceFound));
        };

        let constraints = StreamConstraints::for_tier(settings.resolution_tier, settings.facing);
        info!(
            device = %device.name,
            width = constraints.width,
            height = constraints.height,
            "Opening camera stream"
        );

        match self.backend.start_stream(device, &constraints) {
            Ok(handle) => {
                debug!(
                    stream = handle.id.0,
                    width = handle.width,
                    height = handle.height,
                    "Camera stream open"
                );
                self.stream = Some(handle.clone());
                self.status = DeviceStatus::Ready;
                Ok(handle)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Latest live frame
    ///
    /// Returns [`PhotoError::FrameNotReady`] when no stream is open or the
    /// stream has not produced a frame yet.
    pub fn current_frame(&mut self) -> Result<CameraFrame, PhotoError> {
        let Some(stream) = &self.stream else {
            return Err(PhotoError::FrameNotReady);
        };
        self.backend
            .latest_frame(stream.id)
            .ok_or(PhotoError::FrameNotReady)
    }

    /// List capture devices for the device-switch control
    pub fn enumerate_devices(&self) -> Vec<CameraDevice> {
        self.backend.enumerate_cameras()
    }

    /// Release the held stream (idempotent)
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            info!(stream = stream.id.0, device = %stream.device.name, "Closing camera stream");
            self.backend.stop_stream(stream.id);
        }
        if self.status.is_ready() {
            self.status = DeviceStatus::Closed;
        }
    }

    fn fail(&mut self, err: CameraError) -> CameraError {
        warn!(error = %err, "Camera acquisition failed");
        self.status = DeviceStatus::Error(err.clone());
        err
    }
}

impl Drop for CaptureDevice {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CaptureDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureDevice")
            .field("backend_type", &self.backend.backend_type())
            .field("status", &self.status)
            .field("stream", &self.stream)
            .finish()
    }
}

/// Pick the device for `settings`
///
/// The explicit index wins; otherwise the first device facing the requested
/// way, otherwise the first device.
fn select_device<'a>(devices: &'a [CameraDevice], settings: &CaptureSettings) -> Option<&'a CameraDevice> {
    devices
        .get(settings.camera_index)
        .or_else(|| devices.iter().find(|d| d.facing == Some(settings.facing)))
        .or_else(|| devices.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_camera::{PermissionOutcome, VirtualCamera, VirtualCameraConfig};

    fn adapter(config: VirtualCameraConfig) -> (CaptureDevice, crate::backends::virtual_camera::VirtualCameraStats) {
        let camera = VirtualCamera::new(config);
        let stats = camera.stats();
        (CaptureDevice::new(Box::new(camera)), stats)
    }

    #[test]
    fn test_denied_permission_opens_nothing() {
        let (mut device, stats) = adapter(VirtualCameraConfig {
            permission: PermissionOutcome::Denied,
            ..Default::default()
        });
        assert_eq!(device.request_permission(), Err(CameraError::PermissionDenied));
        assert_eq!(device.status(), &DeviceStatus::Error(CameraError::PermissionDenied));
        assert_eq!(
            device.open(&CaptureSettings::default()),
            Err(CameraError::PermissionDenied)
        );
        assert_eq!(stats.streams_started(), 0);
    }

    #[test]
    fn test_reopen_closes_previous_stream() {
        let (mut device, stats) = adapter(VirtualCameraConfig::default());
        device.request_permission().unwrap();
        device.open(&CaptureSettings::default()).unwrap();
        device.open(&CaptureSettings::default()).unwrap();
        assert_eq!(stats.streams_started(), 2);
        assert_eq!(stats.active_streams(), 1);
        assert_eq!(stats.max_active_streams(), 1);

        device.close();
        device.close();
        assert_eq!(stats.active_streams(), 0);
        assert_eq!(device.status(), &DeviceStatus::Closed);
    }

    #[test]
    fn test_frame_not_ready_during_warmup() {
        let (mut device, _stats) = adapter(VirtualCameraConfig {
            warmup_polls: 2,
            ..Default::default()
        });
        assert_eq!(device.current_frame().unwrap_err(), PhotoError::FrameNotReady);
        device.open(&CaptureSettings::default()).unwrap();
        assert_eq!(device.current_frame().unwrap_err(), PhotoError::FrameNotReady);
        assert_eq!(device.current_frame().unwrap_err(), PhotoError::FrameNotReady);
        assert!(device.current_frame().is_ok());
    }

    #[test]
    fn test_busy_device_is_classified() {
        let (mut device, stats) = adapter(VirtualCameraConfig {
            busy: true,
            ..Default::default()
        });
        assert_eq!(
            device.open(&CaptureSettings::default()),
            Err(CameraError::DeviceBusy)
        );
        assert!(!device.is_ready());
        assert_eq!(stats.active_streams(), 0);
    }

    #[test]
    fn test_no_devices() {
        let (mut device, _stats) = adapter(VirtualCameraConfig {
            devices: Vec::new(),
            ..Default::default()
        });
        assert_eq!(device.request_permission(), Err(CameraError::NoDeviceFound));
    }

    #[test]
    fn test_select_device_prefers_index_then_facing() {
        let front = CameraDevice {
            name: "front".into(),
            path: "virtual:0".into(),
            facing: Some(FacingMode::User),
            device_info: None,
        };
        let back = CameraDevice {
            name: "back".into(),
            path: "virtual:1".into(),
            facing: Some(FacingMode::Environment),
            device_info: None,
        };
        let devices = vec![front, back];
        let mut settings = CaptureSettings {
            camera_index: 1,
            ..Default::default()
        };
        assert_eq!(select_device(&devices, &settings).unwrap().name, "back");
        settings.camera_index = 9;
        settings.facing = FacingMode::Environment;
        assert_eq!(select_device(&devices, &settings).unwrap().name, "back");
        settings.facing = FacingMode::User;
        assert_eq!(select_device(&devices, &settings).unwrap().name, "front");
    }
}
