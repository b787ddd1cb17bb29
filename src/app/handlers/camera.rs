// SPDX-License-Identifier: GPL-3.0-only

//! Camera control handlers
//!
//! Handles session start, the permission request, device errors and retry,
//! camera and resolution switching, mirror/grid toggles and cancel.

use crate::app::state::{Session, SessionEvent, SessionPhase, TimerEvent};
use crate::constants::{ResolutionTier, timing};
use crate::errors::{CameraError, SessionError};
use tracing::{error, info, warn};

impl Session {
    // =========================================================================
    // Lifecycle Handlers
    // =========================================================================

    pub(crate) fn handle_start(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Idle {
            return Err(self.invalid("start a session"));
        }
        info!(session = %self.id, slots = self.poses.len(), "Session starting");
        self.current_index = 0;
        self.await_permission();
        Ok(())
    }

    pub(crate) fn handle_retry_permission(&mut self) -> Result<(), SessionError> {
        if !matches!(self.phase, SessionPhase::DeviceError(_)) {
            return Err(self.invalid("retry camera access"));
        }
        info!(session = %self.id, "Retrying camera access");
        self.await_permission();
        Ok(())
    }

    fn await_permission(&mut self) {
        self.set_phase(SessionPhase::AwaitingPermission);
        self.set_status("Requesting camera access...");
        self.arm(timing::PERMISSION_REQUEST_DELAY, TimerEvent::RequestPermission);
    }

    pub(crate) fn handle_request_permission(&mut self) {
        if self.phase != SessionPhase::AwaitingPermission {
            return;
        }

        if let Err(e) = self.device.request_permission() {
            self.enter_device_error(e);
            return;
        }

        match self.device.open(&self.settings) {
            Ok(handle) => {
                info!(
                    session = %self.id,
                    device = %handle.device.name,
                    width = handle.width,
                    height = handle.height,
                    "Camera ready"
                );
                self.set_status(if self.auto_capture() {
                    "Camera ready - Auto capture starting..."
                } else {
                    "Camera ready"
                });
                self.resume_after_open();
            }
            Err(e) => self.enter_device_error(e),
        }
    }

    /// Pick the phase that matches the gallery once a stream is open
    fn resume_after_open(&mut self) {
        if self.gallery.is_complete() {
            self.set_phase(SessionPhase::AllCaptured);
        } else if self.gallery.is_filled(self.current_index) {
            self.set_phase(SessionPhase::ReviewingPhoto);
        } else {
            self.enter_ready(std::time::Duration::ZERO);
        }
    }

    pub(crate) fn enter_device_error(&mut self, err: CameraError) {
        error!(session = %self.id, error = %err, "Camera unavailable");
        self.disarm();
        self.device.close();
        self.emit(SessionEvent::OverlayHidden);
        self.set_status(err.to_string());
        self.set_phase(SessionPhase::DeviceError(err));
    }

    pub(crate) fn handle_cancel(&mut self) {
        if self.phase == SessionPhase::Idle {
            return;
        }
        info!(session = %self.id, filled = self.gallery.filled_count(), "Session cancelled");
        self.reset();
        self.set_status("Session cancelled");
    }

    /// Drop photos, timers and the stream; back to idle
    pub(crate) fn reset(&mut self) {
        self.disarm();
        self.device.close();
        self.gallery.clear();
        self.current_index = 0;
        self.capture_attempts = 0;
        self.paused = false;
        self.emit(SessionEvent::OverlayHidden);
        self.set_phase(SessionPhase::Idle);
    }

    // =========================================================================
    // Camera Control Handlers
    // =========================================================================

    pub(crate) fn handle_switch_camera(&mut self, index: usize) {
        let count = self.device.enumerate_devices().len();
        if count > 0 && index >= count {
            warn!(index, count, "Camera index out of range, using last camera");
        }
        let index = if count > 0 { index.min(count - 1) } else { index };
        if index == self.settings.camera_index && self.device.stream().is_some() {
            return;
        }
        info!(session = %self.id, index, "Switching camera");
        self.settings.camera_index = index;
        self.emit(SessionEvent::CameraSwitched(index));
        self.reopen_stream();
    }

    pub(crate) fn handle_select_resolution(&mut self, tier: ResolutionTier) {
        if tier == self.settings.resolution_tier {
            return;
        }
        info!(session = %self.id, tier = tier.display_name(), "Changing resolution");
        self.settings.resolution_tier = tier;
        self.emit(SessionEvent::ResolutionChanged(tier));
        self.reopen_stream();
    }

    /// Re-acquire the stream with the current settings
    ///
    /// Pending countdowns and retries are cancelled first; a countdown in
    /// progress starts over on the new stream.
    fn reopen_stream(&mut self) {
        if !self.phase.has_stream() {
            return;
        }
        self.disarm();
        match self.device.open(&self.settings) {
            Ok(handle) => {
                info!(session = %self.id, device = %handle.device.name, "Stream reopened");
                self.resume_after_open();
            }
            Err(e) => self.enter_device_error(e),
        }
    }

    pub(crate) fn handle_toggle_mirror(&mut self) {
        self.settings.mirrored = !self.settings.mirrored;
        info!(mirrored = self.settings.mirrored, "Mirror preview toggled");
        self.emit(SessionEvent::MirrorToggled(self.settings.mirrored));
    }

    pub(crate) fn handle_toggle_grid(&mut self) {
        self.grid_visible = !self.grid_visible;
        self.emit(SessionEvent::GridToggled(self.grid_visible));
    }

    pub(crate) fn handle_viewport_resized(&mut self, width: u32, height: u32) {
        self.options.viewport_width = width.max(1);
        self.options.viewport_height = height.max(1);
    }
}
