// SPDX-License-Identifier: GPL-3.0-only

//! Session state
//!
//! One [`Session`] owns everything a photo-booth run needs: the selected
//! poses, the capture device, the gallery and the timer queue. Nothing is
//! global, so independent sessions can coexist.

use crate::app::gallery::Gallery;
use crate::app::scheduler::{Scheduler, TimerId};
use crate::app::selection::Selection;
use crate::backends::camera::CaptureDevice;
use crate::backends::camera::types::CaptureSettings;
use crate::constants::ResolutionTier;
use crate::errors::{CameraError, SessionError};
use crate::pipelines::photo::{
    Caption, LayoutParams, MirrorPolicy, OverlayMode, PhotoEncoder, PhotoPipeline,
};
use crate::poses::{Pose, PoseImages};
use crate::storage::ExportReport;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// How countdowns are started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaptureMode {
    /// Countdown starts by itself for every empty slot and the session
    /// advances after a short review pause
    #[default]
    Auto,
    /// Countdown starts on the capture control; advancing is explicit
    Manual,
}

/// Session state machine phases
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    AwaitingPermission,
    DeviceError(CameraError),
    /// Live preview with the current pose overlay; the current slot is empty
    Ready,
    CountdownRunning {
        remaining: u32,
    },
    Capturing,
    /// Current slot holds a photo being shown
    ReviewingPhoto,
    AllCaptured,
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::AwaitingPermission => "awaiting permission",
            SessionPhase::DeviceError(_) => "in device error",
            SessionPhase::Ready => "ready",
            SessionPhase::CountdownRunning { .. } => "counting down",
            SessionPhase::Capturing => "capturing",
            SessionPhase::ReviewingPhoto => "reviewing a photo",
            SessionPhase::AllCaptured => "all captured",
        }
    }

    /// Phases in which a stream is held
    pub fn has_stream(&self) -> bool {
        matches!(
            self,
            SessionPhase::Ready
                | SessionPhase::CountdownRunning { .. }
                | SessionPhase::Capturing
                | SessionPhase::ReviewingPhoto
                | SessionPhase::AllCaptured
        )
    }
}

/// Countdown number shown over the viewfinder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownDisplay {
    Remaining(u32),
    /// Shown at zero, right before the capture
    CaptureNow,
}

/// Camera-page controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Leave idle and ask for the camera
    Start,
    /// Ask for the camera again after a device error
    RetryPermission,
    /// Start (or restart) the countdown for the current slot
    Capture,
    /// Move on from the photo under review
    Advance,
    /// Clear a slot and shoot it again
    Retake(usize),
    /// Show an already captured slot
    NavigateTo(usize),
    Pause,
    Resume,
    /// Use the device at this index of the enumerated list
    SwitchCamera(usize),
    ToggleMirror,
    ToggleGrid,
    SelectResolution(ResolutionTier),
    ViewportResized {
        width: u32,
        height: u32,
    },
    /// Discard everything and return to idle
    Cancel,
}

/// Messages the session schedules for itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    RequestPermission,
    CountdownTick,
    RetryCapture,
    ReviewElapsed,
    StartCountdown,
}

/// What a presentation layer observes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PhaseChanged(SessionPhase),
    Countdown(CountdownDisplay),
    /// Pose guide for `slot` is visible; `ready` is false until its image is decoded
    OverlayShown {
        slot: usize,
        pose_id: u32,
        ready: bool,
    },
    OverlayHidden,
    Flash,
    PhotoStored {
        slot: usize,
        label: String,
    },
    SlotCleared {
        slot: usize,
    },
    /// No frame yet; capture retried shortly
    CaptureDeferred {
        attempt: u32,
    },
    Status(String),
    Paused(bool),
    MirrorToggled(bool),
    GridToggled(bool),
    CameraSwitched(usize),
    ResolutionChanged(ResolutionTier),
    Finished(ExportReport),
}

/// Everything about a session that is not the pose list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub settings: CaptureSettings,
    pub capture_mode: CaptureMode,
    pub overlay_mode: OverlayMode,
    pub mirror_policy: MirrorPolicy,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub caption_timestamp: bool,
    pub jpeg_quality: u8,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            settings: CaptureSettings::default(),
            capture_mode: CaptureMode::default(),
            overlay_mode: OverlayMode::default(),
            mirror_policy: MirrorPolicy::default(),
            viewport_width: 1280,
            viewport_height: 720,
            caption_timestamp: false,
            jpeg_quality: crate::constants::compositing::JPEG_QUALITY,
        }
    }
}

/// One photo-booth run
pub struct Session {
    pub(crate) id: Uuid,
    pub(crate) poses: Vec<Pose>,
    pub(crate) settings: CaptureSettings,
    pub(crate) options: SessionOptions,
    pub(crate) device: CaptureDevice,
    pub(crate) pipeline: PhotoPipeline,
    pub(crate) pose_images: PoseImages,
    pub(crate) gallery: Gallery,
    pub(crate) phase: SessionPhase,
    pub(crate) current_index: usize,
    pub(crate) scheduler: Scheduler<TimerEvent>,
    /// The one timer of the countdown/capture/advance chain
    pub(crate) pending: Option<TimerId>,
    pub(crate) capture_attempts: u32,
    pub(crate) paused: bool,
    pub(crate) grid_visible: bool,
    pub(crate) status: String,
    pub(crate) events: Vec<SessionEvent>,
}

impl Session {
    /// Take over the selected poses; the countdown length comes from the selection
    pub fn new(
        selection: &Selection,
        device: CaptureDevice,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        if !selection.can_start() {
            return Err(SessionError::NoPosesSelected);
        }

        let mut settings = options.settings;
        settings.timer_seconds = selection.timer_seconds().max(1);

        let id = Uuid::new_v4();
        info!(
            session = %id,
            poses = ?selection.ids(),
            timer = settings.timer_seconds,
            mode = ?options.capture_mode,
            "Session created"
        );

        Ok(Self {
            id,
            poses: selection.poses().to_vec(),
            settings,
            options,
            device,
            pipeline: PhotoPipeline::new(PhotoEncoder::with_quality(options.jpeg_quality)),
            pose_images: PoseImages::new(),
            gallery: Gallery::new(selection.len()),
            phase: SessionPhase::Idle,
            current_index: 0,
            scheduler: Scheduler::new(),
            pending: None,
            capture_attempts: 0,
            paused: false,
            grid_visible: false,
            status: String::new(),
            events: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn slot_count(&self) -> usize {
        self.poses.len()
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    pub fn current_pose(&self) -> Pose {
        self.poses[self.current_index]
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn device(&self) -> &CaptureDevice {
        &self.device
    }

    pub fn pose_images_mut(&mut self) -> &mut PoseImages {
        &mut self.pose_images
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    /// Drain the events emitted since the last call
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Current virtual time of the session clock
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// When the next scheduled transition is due
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Compositor geometry for the current viewport and mirror setting
    pub fn layout(&self) -> LayoutParams {
        LayoutParams {
            display_width: self.options.viewport_width,
            display_height: self.options.viewport_height,
            overlay_mode: self.options.overlay_mode,
            mirrored: self.options.mirror_policy.applies(self.settings.mirrored),
        }
    }

    pub(crate) fn caption_for(&self, pose: &Pose) -> Caption {
        Caption {
            label: pose.label.to_string(),
            slot_index: self.current_index,
            slot_count: self.poses.len(),
            timestamp: self
                .options
                .caption_timestamp
                .then(|| chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    pub(crate) fn emit(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    pub(crate) fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase != phase {
            debug!(session = %self.id, from = self.phase.name(), to = phase.name(), "Phase change");
            self.phase = phase.clone();
            self.emit(SessionEvent::PhaseChanged(phase));
        }
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        let status = status.into();
        if self.status != status {
            self.status = status.clone();
            self.emit(SessionEvent::Status(status));
        }
    }

    /// Schedule the next step of the chain, replacing any pending one
    pub(crate) fn arm(&mut self, delay: Duration, event: TimerEvent) {
        self.disarm();
        self.pending = Some(self.scheduler.schedule(delay, event));
    }

    /// Cancel every pending timer
    pub(crate) fn disarm(&mut self) {
        let cancelled = self.scheduler.cancel_all();
        if cancelled > 0 {
            debug!(session = %self.id, cancelled, "Timers cancelled");
        }
        self.pending = None;
    }

    pub(crate) fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidPhase {
            action,
            phase: self.phase.name(),
        }
    }

    pub(crate) fn auto_capture(&self) -> bool {
        self.options.capture_mode == CaptureMode::Auto && !self.paused
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("current_index", &self.current_index)
            .field("filled", &self.gallery.filled_count())
            .field("slots", &self.gallery.len())
            .finish()
    }
}
