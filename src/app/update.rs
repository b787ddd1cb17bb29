// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` routes camera-page controls to the handlers in
//! [`crate::app::handlers`]; timers the session scheduled for itself come
//! back through [`Session::advance_to`].

use crate::app::scheduler::TimerId;
use crate::app::state::{Message, Session, TimerEvent};
use crate::errors::SessionError;
use std::time::Duration;
use tracing::{debug, warn};

impl Session {
    /// Main message handler
    ///
    /// Invalid controls leave the session untouched and return an error;
    /// device failures are not errors here, they move the session to its
    /// device-error phase.
    pub fn update(&mut self, message: Message) -> Result<(), SessionError> {
        debug!(session = %self.id, ?message, phase = self.phase.name(), "Session message");

        let result = match message {
            // ===== Lifecycle =====
            Message::Start => self.handle_start(),
            Message::RetryPermission => self.handle_retry_permission(),
            Message::Cancel => {
                self.handle_cancel();
                Ok(())
            }

            // ===== Capture =====
            Message::Capture => self.handle_capture(),
            Message::Pause => self.handle_pause(),
            Message::Resume => self.handle_resume(),

            // ===== Navigation =====
            Message::Advance => self.handle_advance(),
            Message::Retake(slot) => self.handle_retake(slot),
            Message::NavigateTo(slot) => self.handle_navigate(slot),

            // ===== Camera Control =====
            Message::SwitchCamera(index) => {
                self.handle_switch_camera(index);
                Ok(())
            }
            Message::SelectResolution(tier) => {
                self.handle_select_resolution(tier);
                Ok(())
            }
            Message::ToggleMirror => {
                self.handle_toggle_mirror();
                Ok(())
            }
            Message::ToggleGrid => {
                self.handle_toggle_grid();
                Ok(())
            }
            Message::ViewportResized { width, height } => {
                self.handle_viewport_resized(width, height);
                Ok(())
            }
        };

        if let Err(e) = &result {
            warn!(session = %self.id, error = %e, "Control rejected");
        }
        result
    }

    /// Move the session clock to `instant`, firing every timer due on the way
    ///
    /// Timers fire in deadline order at their own deadline, so a timer armed
    /// by a firing one is measured from that deadline. Returns the number of
    /// timers fired.
    pub fn advance_to(&mut self, instant: Duration) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.scheduler.next_deadline() {
            if deadline > instant {
                break;
            }
            self.scheduler.advance_to(deadline);
            while let Some((id, event)) = self.scheduler.pop_due() {
                self.handle_timer(id, event);
                fired += 1;
            }
        }
        self.scheduler.advance_to(instant);
        fired
    }

    /// Advance the session clock by `delta`
    pub fn advance_by(&mut self, delta: Duration) -> usize {
        let target = self.scheduler.now() + delta;
        self.advance_to(target)
    }

    /// Fire whatever is due right now (zero-delay timers)
    pub fn run_due(&mut self) -> usize {
        self.advance_to(self.scheduler.now())
    }

    fn handle_timer(&mut self, id: TimerId, event: TimerEvent) {
        if self.pending != Some(id) {
            debug!(session = %self.id, ?event, "Stale timer ignored");
            return;
        }
        self.pending = None;

        match event {
            TimerEvent::RequestPermission => self.handle_request_permission(),
            TimerEvent::CountdownTick => self.handle_countdown_tick(),
            TimerEvent::RetryCapture => self.handle_retry_capture(),
            TimerEvent::ReviewElapsed => self.handle_review_elapsed(),
            TimerEvent::StartCountdown => self.handle_start_countdown(),
        }
    }
}
