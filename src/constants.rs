// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};

/// Maximum number of poses a session can hold
pub const MAX_SELECTED_POSES: usize = 4;

/// Countdown lengths offered by the timer selector (seconds)
pub const TIMER_OPTIONS: [u32; 3] = [3, 5, 10];

/// Countdown length used when nothing else was chosen
pub const DEFAULT_TIMER_SECONDS: u32 = 5;

/// Camera resolution tiers
///
/// The tier is a request, not a guarantee: backends pick the closest
/// format the device actually offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResolutionTier {
    /// 640x480
    Low,
    /// 1280x720 (default)
    #[default]
    Medium,
    /// 1920x1080
    High,
}

impl ResolutionTier {
    /// Get all tiers for UI iteration
    pub const ALL: [ResolutionTier; 3] = [
        ResolutionTier::Low,
        ResolutionTier::Medium,
        ResolutionTier::High,
    ];

    /// Get display name for the tier
    pub fn display_name(&self) -> &'static str {
        match self {
            ResolutionTier::Low => "SD",
            ResolutionTier::Medium => "HD",
            ResolutionTier::High => "Full HD",
        }
    }

    /// Ideal capture resolution for this tier (width, height)
    pub fn ideal_resolution(&self) -> (u32, u32) {
        match self {
            ResolutionTier::Low => (640, 480),
            ResolutionTier::Medium => (1280, 720),
            ResolutionTier::High => (1920, 1080),
        }
    }

    /// Parse a tier from its lowercase name (`low`, `medium`, `high`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "low" | "sd" => Some(ResolutionTier::Low),
            "medium" | "hd" => Some(ResolutionTier::Medium),
            "high" | "fullhd" | "full-hd" => Some(ResolutionTier::High),
            _ => None,
        }
    }
}

/// Session timing constants
pub mod timing {
    use std::time::Duration;

    /// Interval between countdown ticks
    pub const COUNTDOWN_TICK: Duration = Duration::from_millis(1000);

    /// Delay between capture attempts while the stream is warming up
    pub const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(100);

    /// Capture attempts before giving up on a countdown
    pub const MAX_CAPTURE_RETRIES: u32 = 20;

    /// How long a fresh photo stays on screen before auto-advance
    pub const REVIEW_PAUSE: Duration = Duration::from_millis(1000);

    /// Pause between showing the next pose and starting its countdown
    pub const NEXT_POSE_DELAY: Duration = Duration::from_millis(500);

    /// Delay before the permission request fires after a session starts
    pub const PERMISSION_REQUEST_DELAY: Duration = Duration::ZERO;

    /// Polling interval while the V4L2 capture thread waits for its first buffer
    pub const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(5);
}

/// Compositing constants
pub mod compositing {
    /// Opacity of the pose guide in reference overlay mode
    pub const OVERLAY_ALPHA: f32 = 0.7;

    /// Pose guide edge as a fraction of the smaller output dimension
    pub const OVERLAY_SIZE_RATIO: f32 = 0.8;

    /// Height of the caption band in pixels
    pub const CAPTION_BAND_HEIGHT: u32 = 60;

    /// Extra band height when a timestamp line is drawn
    pub const TIMESTAMP_LINE_HEIGHT: u32 = 14;

    /// Opacity of the black caption band
    pub const CAPTION_BAND_ALPHA: f32 = 0.7;

    /// Glyph scale for the pose label (8px glyphs, 24px tall)
    pub const LABEL_SCALE: u32 = 3;

    /// Glyph scale for the "Photo N of M" line
    pub const COUNTER_SCALE: u32 = 2;

    /// Glyph scale for the timestamp line
    pub const TIMESTAMP_SCALE: u32 = 1;

    /// Distance from the bottom edge to the label baseline
    pub const LABEL_BASELINE_OFFSET: u32 = 25;

    /// Distance from the bottom edge to the counter baseline
    pub const COUNTER_BASELINE_OFFSET: u32 = 5;

    /// Pose label colour (white)
    pub const LABEL_COLOR: [u8; 4] = [255, 255, 255, 255];

    /// Counter line colour (#ffcc00)
    pub const COUNTER_COLOR: [u8; 4] = [255, 204, 0, 255];

    /// Timestamp line colour
    pub const TIMESTAMP_COLOR: [u8; 4] = [200, 200, 200, 255];

    /// JPEG quality for finished photos
    pub const JPEG_QUALITY: u8 = 90;

    /// File name prefix for exported photos
    pub const EXPORT_PREFIX: &str = "photo-booth";
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_tier_names() {
        assert_eq!(ResolutionTier::from_name("LOW"), Some(ResolutionTier::Low));
        assert_eq!(ResolutionTier::from_name("hd"), Some(ResolutionTier::Medium));
        assert_eq!(ResolutionTier::from_name("high"), Some(ResolutionTier::High));
        assert_eq!(ResolutionTier::from_name("8k"), None);
    }

    #[test]
    fn test_default_timer_is_an_option() {
        assert!(TIMER_OPTIONS.contains(&DEFAULT_TIMER_SECONDS));
    }
}
