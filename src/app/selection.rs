// SPDX-License-Identifier: GPL-3.0-only

//! Pose selection
//!
//! Up to [`MAX_SELECTED_POSES`] poses in pick order, plus the countdown length.
//! The pick order is the capture order of the session.

use crate::constants::{DEFAULT_TIMER_SECONDS, MAX_SELECTED_POSES};
use crate::errors::SelectionError;
use crate::poses::{self, Pose};
use tracing::{debug, info};

/// Outcome of toggling one pose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    /// Appended at this position
    Added { position: usize },
    Removed,
    /// Already full; nothing changed
    LimitReached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    poses: Vec<Pose>,
    timer_seconds: u32,
}

impl Selection {
    pub fn new() -> Self {
        Self {
            poses: Vec::with_capacity(MAX_SELECTED_POSES),
            timer_seconds: DEFAULT_TIMER_SECONDS,
        }
    }

    /// Select every id in order; ids past the limit are dropped
    pub fn from_ids(ids: &[u32]) -> Result<Self, SelectionError> {
        let mut selection = Self::new();
        selection.select_all(ids)?;
        Ok(selection)
    }

    /// Add every id not yet selected, returning the ids refused by the limit
    pub fn select_all(&mut self, ids: &[u32]) -> Result<Vec<u32>, SelectionError> {
        let mut refused = Vec::new();
        for &id in ids {
            if self.contains(id) {
                continue;
            }
            if self.toggle(id)? == SelectionChange::LimitReached {
                refused.push(id);
            }
        }
        Ok(refused)
    }

    /// Add the pose if absent, remove it if present
    pub fn toggle(&mut self, pose_id: u32) -> Result<SelectionChange, SelectionError> {
        let pose = poses::find(pose_id).ok_or(SelectionError::UnknownPose(pose_id))?;

        if let Some(index) = self.poses.iter().position(|p| p.id == pose_id) {
            self.poses.remove(index);
            debug!(pose_id, "Pose deselected");
            return Ok(SelectionChange::Removed);
        }

        if self.poses.len() >= MAX_SELECTED_POSES {
            info!(pose_id, max = MAX_SELECTED_POSES, "Pose limit reached");
            return Ok(SelectionChange::LimitReached);
        }

        self.poses.push(*pose);
        debug!(pose_id, position = self.poses.len() - 1, "Pose selected");
        Ok(SelectionChange::Added {
            position: self.poses.len() - 1,
        })
    }

    /// Empty the selection and restore the default timer
    pub fn clear(&mut self) {
        self.poses.clear();
        self.timer_seconds = DEFAULT_TIMER_SECONDS;
    }

    pub fn select_timer(&mut self, seconds: u32) -> Result<(), SelectionError> {
        if seconds == 0 {
            return Err(SelectionError::InvalidTimer);
        }
        self.timer_seconds = seconds;
        Ok(())
    }

    pub fn can_start(&self) -> bool {
        !self.poses.is_empty()
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    pub fn ids(&self) -> Vec<u32> {
        self.poses.iter().map(|p| p.id).collect()
    }

    pub fn contains(&self, pose_id: u32) -> bool {
        self.poses.iter().any(|p| p.id == pose_id)
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn timer_seconds(&self) -> u32 {
        self.timer_seconds
    }

    /// Counter text for the selection page, e.g. "2/4 selected"
    pub fn counter_text(&self) -> String {
        format!("{}/{} selected", self.poses.len(), MAX_SELECTED_POSES)
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}
