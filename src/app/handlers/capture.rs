// SPDX-License-Identifier: GPL-3.0-only

//! Capture operations handlers
//!
//! Handles the countdown, the capture itself with its bounded retry, and
//! pause/resume of automatic capture.

use crate::app::gallery::CapturedPhoto;
use crate::app::state::{CountdownDisplay, Session, SessionEvent, SessionPhase, TimerEvent};
use crate::constants::timing;
use crate::errors::{PhotoError, SessionError};
use crate::pipelines::photo::EncodedImage;
use crate::poses::Pose;
use std::time::Duration;
use tracing::{debug, info, warn};

impl Session {
    // =========================================================================
    // Capture Operations Handlers
    // =========================================================================

    pub(crate) fn handle_capture(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Ready if !self.gallery.is_filled(self.current_index) => {
                self.start_countdown();
                Ok(())
            }
            SessionPhase::CountdownRunning { .. } => {
                info!(session = %self.id, "Countdown restarted");
                self.start_countdown();
                Ok(())
            }
            _ => Err(self.invalid("capture")),
        }
    }

    /// Show the current pose and, in auto mode, start its countdown after `delay`
    pub(crate) fn enter_ready(&mut self, delay: Duration) {
        self.set_phase(SessionPhase::Ready);
        let pose = self.current_pose();
        self.emit(SessionEvent::OverlayShown {
            slot: self.current_index,
            pose_id: pose.id,
            ready: self.pose_images.is_ready(pose.id),
        });

        if !self.auto_capture() {
            return;
        }
        if delay.is_zero() {
            self.start_countdown();
        } else {
            self.arm(delay, TimerEvent::StartCountdown);
        }
    }

    pub(crate) fn handle_start_countdown(&mut self) {
        if self.phase == SessionPhase::Ready
            && !self.gallery.is_filled(self.current_index)
            && self.auto_capture()
        {
            self.start_countdown();
        }
    }

    /// Begin counting down from the configured seconds, cancelling any pending timer
    pub(crate) fn start_countdown(&mut self) {
        let seconds = self.settings.timer_seconds.max(1);
        self.disarm();
        self.set_phase(SessionPhase::CountdownRunning { remaining: seconds });
        self.emit(SessionEvent::Countdown(CountdownDisplay::Remaining(seconds)));
        self.set_status(format!("Capturing in {} seconds...", seconds));
        info!(session = %self.id, slot = self.current_index, seconds, "Countdown started");
        self.arm(timing::COUNTDOWN_TICK, TimerEvent::CountdownTick);
    }

    pub(crate) fn handle_countdown_tick(&mut self) {
        let SessionPhase::CountdownRunning { remaining } = self.phase else {
            return;
        };
        let remaining = remaining.saturating_sub(1);

        if remaining > 0 {
            debug!(remaining, "Countdown tick");
            self.set_phase(SessionPhase::CountdownRunning { remaining });
            self.emit(SessionEvent::Countdown(CountdownDisplay::Remaining(remaining)));
            self.set_status(format!("Capturing in {} seconds...", remaining));
            self.arm(timing::COUNTDOWN_TICK, TimerEvent::CountdownTick);
            return;
        }

        info!(session = %self.id, slot = self.current_index, "Countdown complete - capturing");
        self.emit(SessionEvent::Countdown(CountdownDisplay::CaptureNow));
        self.capture_attempts = 0;
        self.set_phase(SessionPhase::Capturing);
        self.attempt_capture();
    }

    pub(crate) fn handle_retry_capture(&mut self) {
        if self.phase == SessionPhase::Capturing {
            self.attempt_capture();
        }
    }

    fn attempt_capture(&mut self) {
        let frame = match self.device.current_frame() {
            Ok(frame) => frame,
            Err(PhotoError::FrameNotReady) => return self.defer_capture(),
            Err(e) => return self.abort_capture(e),
        };

        let pose = self.current_pose();
        let caption = self.caption_for(&pose);
        let layout = self.layout();
        let pose_image = self.pose_images.get(pose.id);
        if pose_image.is_none() {
            warn!(pose_id = pose.id, "Pose image not loaded; capturing without it");
        }

        match self.pipeline.process(&frame, pose_image, &layout, &caption) {
            Ok(image) => self.store_photo(pose, image),
            Err(e) => self.abort_capture(e),
        }
    }

    /// Frame not ready yet: poll again shortly, up to the retry limit
    fn defer_capture(&mut self) {
        self.capture_attempts += 1;
        if self.capture_attempts > timing::MAX_CAPTURE_RETRIES {
            self.abort_capture(PhotoError::FrameNotReady);
            return;
        }
        warn!(
            session = %self.id,
            attempt = self.capture_attempts,
            "Camera not producing frames yet, capture deferred"
        );
        self.emit(SessionEvent::CaptureDeferred {
            attempt: self.capture_attempts,
        });
        self.arm(timing::CAPTURE_RETRY_DELAY, TimerEvent::RetryCapture);
    }

    /// Give up on this capture; the slot stays empty and waits for the user
    fn abort_capture(&mut self, err: PhotoError) {
        warn!(session = %self.id, error = %err, "Capture failed");
        self.disarm();
        self.set_status(format!("Capture failed: {}", err));
        self.set_phase(SessionPhase::Ready);
    }

    fn store_photo(&mut self, pose: Pose, image: EncodedImage) {
        let slot = self.current_index;
        self.gallery.store(
            slot,
            CapturedPhoto {
                image,
                label: pose.label.to_string(),
                pose_id: pose.id,
                slot_index: slot,
            },
        );
        info!(
            session = %self.id,
            slot,
            pose_id = pose.id,
            "Captured photo {} of {}",
            slot + 1,
            self.poses.len()
        );

        self.emit(SessionEvent::Flash);
        self.emit(SessionEvent::PhotoStored {
            slot,
            label: pose.label.to_string(),
        });
        self.set_phase(SessionPhase::ReviewingPhoto);

        if self.gallery.is_complete() {
            self.set_status("All photos captured! Ready to finish.");
        } else {
            self.set_status(format!("Captured {}", pose.label));
        }

        if self.auto_capture() {
            self.arm(timing::REVIEW_PAUSE, TimerEvent::ReviewElapsed);
        }
    }

    pub(crate) fn handle_review_elapsed(&mut self) {
        if self.phase == SessionPhase::ReviewingPhoto {
            self.advance_to_next();
        }
    }

    // =========================================================================
    // Pause / Resume
    // =========================================================================

    pub(crate) fn handle_pause(&mut self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Idle {
            return Err(self.invalid("pause"));
        }
        if self.paused {
            return Ok(());
        }
        self.paused = true;
        self.emit(SessionEvent::Paused(true));

        match self.phase {
            SessionPhase::CountdownRunning { .. } => {
                self.disarm();
                self.set_phase(SessionPhase::Ready);
            }
            // A pending auto-start or auto-advance is dropped; an in-flight
            // capture retry keeps going.
            SessionPhase::Ready | SessionPhase::ReviewingPhoto => self.disarm(),
            _ => {}
        }
        info!(session = %self.id, "Auto capture paused");
        self.set_status("Auto capture paused");
        Ok(())
    }

    pub(crate) fn handle_resume(&mut self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Idle {
            return Err(self.invalid("resume"));
        }
        if !self.paused {
            return Ok(());
        }
        self.paused = false;
        self.emit(SessionEvent::Paused(false));
        info!(session = %self.id, "Auto capture resumed");

        if !self.auto_capture() {
            self.set_status("Resumed");
            return Ok(());
        }
        match self.phase {
            SessionPhase::Ready if !self.gallery.is_filled(self.current_index) => {
                self.start_countdown()
            }
            SessionPhase::ReviewingPhoto if self.pending.is_none() => {
                self.set_status("Resumed");
                self.arm(timing::REVIEW_PAUSE, TimerEvent::ReviewElapsed);
            }
            _ => self.set_status("Resumed"),
        }
        Ok(())
    }
}
