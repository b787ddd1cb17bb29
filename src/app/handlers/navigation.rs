// SPDX-License-Identifier: GPL-3.0-only

//! Slot navigation handlers
//!
//! Advance, retake, click-to-view and finishing the session.

use crate::app::state::{Session, SessionEvent, SessionPhase};
use crate::constants::timing;
use crate::errors::SessionError;
use crate::storage::{self, ExportReport, ExportSink};
use tracing::info;

impl Session {
    pub(crate) fn handle_advance(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::ReviewingPhoto {
            return Err(self.invalid("advance"));
        }
        self.advance_to_next();
        Ok(())
    }

    /// Move to the next empty slot, or finish capturing when there is none
    pub(crate) fn advance_to_next(&mut self) {
        self.disarm();
        self.emit(SessionEvent::OverlayHidden);

        match self.gallery.next_empty_after(self.current_index) {
            Some(next) => {
                info!(session = %self.id, from = self.current_index, to = next, "Next pose");
                self.current_index = next;
                self.enter_ready(timing::NEXT_POSE_DELAY);
            }
            None => {
                info!(session = %self.id, "All photos captured");
                self.set_phase(SessionPhase::AllCaptured);
                self.set_status("All photos captured! Ready to finish.");
            }
        }
    }

    pub(crate) fn handle_retake(&mut self, slot: usize) -> Result<(), SessionError> {
        if !self.phase.has_stream() {
            return Err(self.invalid("retake"));
        }
        if slot >= self.gallery.len() {
            return Err(SessionError::NoSuchSlot(slot));
        }

        self.disarm();
        self.emit(SessionEvent::OverlayHidden);
        self.current_index = slot;
        if self.gallery.retake(slot).is_some() {
            self.emit(SessionEvent::SlotCleared { slot });
        }
        let label = self.current_pose().label;
        info!(session = %self.id, slot, label, "Retaking photo");
        self.set_status(format!("Retake: {}", label));
        self.enter_ready(timing::NEXT_POSE_DELAY);
        Ok(())
    }

    pub(crate) fn handle_navigate(&mut self, slot: usize) -> Result<(), SessionError> {
        if !matches!(
            self.phase,
            SessionPhase::Ready | SessionPhase::ReviewingPhoto | SessionPhase::AllCaptured
        ) {
            return Err(self.invalid("navigate"));
        }
        if slot >= self.gallery.len() {
            return Err(SessionError::NoSuchSlot(slot));
        }

        self.disarm();
        self.emit(SessionEvent::OverlayHidden);
        self.current_index = slot;

        // A filled slot is shown; an empty one is set up for its capture
        match self.gallery.get(slot).map(|photo| photo.label.clone()) {
            Some(label) => {
                self.set_phase(SessionPhase::ReviewingPhoto);
                self.set_status(format!("Viewing photo {}: {}", slot + 1, label));
            }
            None => {
                let label = self.current_pose().label;
                self.set_status(format!("Pose {}: {}", slot + 1, label));
                self.enter_ready(timing::NEXT_POSE_DELAY);
            }
        }
        Ok(())
    }

    /// Export every photo and return to idle
    ///
    /// Requires every slot to be filled. Blocked files are reported, not
    /// treated as failure.
    pub fn finish(&mut self, sink: &mut dyn ExportSink) -> Result<ExportReport, SessionError> {
        if matches!(
            self.phase,
            SessionPhase::Idle | SessionPhase::CountdownRunning { .. } | SessionPhase::Capturing
        ) {
            return Err(self.invalid("finish"));
        }
        if !self.gallery.is_complete() {
            return Err(SessionError::Incomplete {
                filled: self.gallery.filled_count(),
                total: self.gallery.len(),
            });
        }

        let report = storage::export_all(self.gallery.all(), sink);
        info!(
            session = %self.id,
            exported = report.exported.len(),
            blocked = report.blocked.len(),
            "Session finished"
        );
        self.emit(SessionEvent::Finished(report.clone()));
        self.reset();
        self.set_status(if report.blocked.is_empty() {
            format!("Downloaded {} photos", report.exported.len())
        } else {
            format!(
                "Downloaded {} photos, {} blocked",
                report.exported.len(),
                report.blocked.len()
            )
        });
        Ok(report)
    }
}
